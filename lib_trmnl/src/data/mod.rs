//! # Data Module
//!
//! Everything between "some JSON somewhere" and a display-ready record.
//!
//! ## Contained Modules:
//!
//! - **`model`**: `DisplayRecord`, `Card`, `CardValue`, `Task` and `Trend`.
//! - **`normalizer`**: the shallow last-write-wins merge and the
//!   normalization rules (card extraction, synthesis, padding, truncation).
//! - **`sources`**: readers for local JSON files and HTTP endpoints.

/// Display-ready data types.
pub mod model;
/// Merge and normalization of raw JSON records.
pub mod normalizer;
/// Local-file and HTTP data-source readers.
pub mod sources;

pub use model::{Card, CardValue, DisplayRecord, RawRecord, Task, Trend};
pub use normalizer::{merge_sources, normalize, normalize_record};
pub use sources::DataSource;
