//! # lib_trmnl
//!
//! The view rendering pipeline behind a local TRMNL e-ink server. A polling
//! display client fetches one fixed-size monochrome image from a stable URL;
//! this crate produces that image.
//!
//! ## Pipeline
//!
//! 1.  **`data`**: JSON sources are loaded, merged (last source wins per key)
//!     and normalized into a bounded `DisplayRecord`.
//! 2.  **`templates`**: the record is bound to a view's template and the
//!     resulting HTML is validated against the canvas constraints.
//! 3.  **`convert`**: an external rasterizer turns the HTML into an image,
//!     which is resized to the canvas, binarized and atomically published.
//! 4.  **`core`**: the `ViewScheduler` decides which view is device-facing and
//!     the `RenderPipeline` ties the stages together and keeps statistics.
//!
//! Ambient modules: `configs` (JSON configuration), `loggers` (fern setup)
//! and `retrieve` (retrying HTTP client for remote data sources).

#![forbid(unsafe_code)]

pub mod configs;
pub mod convert;
pub mod core;
pub mod data;
pub mod errors;
pub mod loggers;
pub mod retrieve;
pub mod templates;

// Re-export the types most callers need.
pub use configs::config_app::{AppConfig, ViewDescriptor};
pub use core::pipeline::RenderPipeline;
pub use core::scheduler::ViewScheduler;
pub use core::stats::RenderStatistics;
pub use data::model::{Card, CardValue, DisplayRecord, RawRecord, Task, Trend};
pub use errors::{RenderError, RenderResult};
