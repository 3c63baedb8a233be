use std::sync::Arc;

use chrono::{DateTime, Local};
use lib_trmnl::RenderPipeline;

/// Shared by every handler and periodic task.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RenderPipeline>,
    pub started_at: DateTime<Local>,
}

impl AppState {
    pub fn new(pipeline: Arc<RenderPipeline>) -> Self {
        Self {
            pipeline,
            started_at: Local::now(),
        }
    }
}
