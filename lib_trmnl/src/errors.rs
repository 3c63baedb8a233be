//! # Render Errors
//!
//! One error type for the whole rendering path. Each variant maps to a failure
//! class with its own propagation rule:
//!
//! - `DataSource`: the source is skipped, normalization continues.
//! - `TemplateLoad` / `TemplateExec` / `TemplateValidation`: the view aborts,
//!   other views in the batch are unaffected.
//! - `RendererUnavailable` / `RendererExecution` / `Conversion`: the conversion
//!   aborts, scratch files are cleaned up.
//! - `Publish`: the previously published raster stays in place.
//! - `NoViews`: the only condition that stops a batch before it starts.
//! - `UnknownView`: a single-view request named a view that is not configured.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Data source '{source_name}' unavailable: {reason}")]
    DataSource { source_name: String, reason: String },

    #[error("Failed to load template '{}': {reason}", path.display())]
    TemplateLoad { path: PathBuf, reason: String },

    #[error("Failed to execute template for view '{view}': {reason}")]
    TemplateExec { view: String, reason: String },

    #[error("Template validation failed for '{view}': {}", problems.join("; "))]
    TemplateValidation { view: String, problems: Vec<String> },

    #[error("Renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Renderer failed (exit status {status:?}): {stderr}")]
    RendererExecution { status: Option<i32>, stderr: String },

    #[error("Image conversion failed: {0}")]
    Conversion(String),

    #[error("Failed to publish {}: {source}", path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("No views configured")]
    NoViews,

    #[error("Unknown view '{0}'")]
    UnknownView(String),
}

impl RenderError {
    /// Shorthand for a data-source failure.
    pub fn data_source(source_name: impl Into<String>, reason: impl ToString) -> Self {
        RenderError::DataSource {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Conversion(err.to_string())
    }
}
