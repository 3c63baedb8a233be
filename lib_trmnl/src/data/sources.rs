//! # Data Sources
//!
//! A source yields one JSON object. Local files are read from disk, HTTP
//! sources are fetched through the shared [`ApiClient`]. Failures of a single
//! source are logged and skipped by [`collect`]; they never abort a render.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use super::model::RawRecord;
use crate::errors::{RenderError, RenderResult};
use crate::retrieve::ApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A local JSON file holding an object.
    File(PathBuf),
    /// An absolute URL answering with a JSON object.
    Http(String),
}

impl DataSource {
    /// Human-readable identity used in logs and errors.
    pub fn label(&self) -> String {
        match self {
            DataSource::File(path) => path.display().to_string(),
            DataSource::Http(url) => url.clone(),
        }
    }

    /// Loads the source. Anything but a JSON object is an error.
    pub async fn load(&self, client: &ApiClient) -> RenderResult<RawRecord> {
        let value: Value = match self {
            DataSource::File(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| RenderError::data_source(self.label(), e.to_string()))?;
                serde_json::from_str(&raw)
                    .map_err(|e| RenderError::data_source(self.label(), e.to_string()))?
            }
            DataSource::Http(url) => client
                .get_json::<Value>(url)
                .await
                .map_err(|e| RenderError::data_source(self.label(), format!("{e:#}")))?,
        };

        match value {
            Value::Object(map) => Ok(map),
            other => Err(RenderError::data_source(
                self.label(),
                format!("expected a JSON object, got {}", json_kind(&other)),
            )),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loads every source in order, keeping only the ones that succeeded.
pub async fn collect(sources: &[DataSource], client: &ApiClient) -> Vec<RawRecord> {
    let mut records = Vec::with_capacity(sources.len());
    for source in sources {
        match source.load(client).await {
            Ok(record) => {
                log::debug!("Loaded data source {}", source);
                records.push(record);
            }
            Err(e) => log::warn!("Skipping data source: {}", e),
        }
    }
    records
}
