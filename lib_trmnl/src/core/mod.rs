//! # Core Module
//!
//! Scheduling and orchestration.
//!
//! ## Contained Modules:
//!
//! - **`scheduler`**: `ViewScheduler`, the view catalogue and rotation state.
//! - **`stats`**: `RenderStatistics` of the last batch.
//! - **`pipeline`**: `RenderPipeline`, the shared context running renders.

pub mod pipeline;
pub mod scheduler;
pub mod stats;
