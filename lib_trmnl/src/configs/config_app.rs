//! # Application Configuration
//!
//! Loads `config.json` into an [`AppConfig`]. Every section and field has a
//! default, so a partial (or missing) file still yields a runnable
//! configuration. The layout:
//!
//! ```json
//! {
//!   "server":      { "host": "0.0.0.0", "port": 8080 },
//!   "render":      { "width": 800, "height": 480, "refreshIntervalMinutes": 15,
//!                    "outputPath": "output/screen.png", "scratchDir": null },
//!   "renderer":    { "command": "scripts/render-chromium.sh", "args": [],
//!                    "bitmapConverter": "convert" },
//!   "dataSources": { "jsonFiles": [], "apiEndpoints": [] },
//!   "trmnl":       { "apiKey": "", "friendlyId": "", "refreshRateSeconds": 900 },
//!   "paths":       { "outputDir": "output", "templatesDir": "templates", "dataDir": "data" },
//!   "views":       [ { "name": "todo", "templatePath": "...", "dataPath": "..." } ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error occurred reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # View Descriptor
///
/// A named (template, data) pair producing one display image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDescriptor {
    /// Unique identifier, also the stem of the per-view output image.
    pub name: String,
    /// Path of the view's template file.
    pub template_path: PathBuf,
    /// Path of the view's own JSON data file.
    pub data_path: PathBuf,
}

impl ViewDescriptor {
    pub fn new(
        name: impl Into<String>,
        template_path: impl Into<PathBuf>,
        data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            template_path: template_path.into(),
            data_path: data_path.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// # Render Section
///
/// Canvas geometry, refresh cadence and the device-facing output path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSection {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Minutes between scheduled full-catalogue renders.
    pub refresh_interval_minutes: u64,
    /// Where the device-facing raster is published.
    pub output_path: PathBuf,
    /// Directory for scratch HTML and intermediate rasters. System temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            refresh_interval_minutes: 15,
            output_path: PathBuf::from("output/screen.png"),
            scratch_dir: None,
        }
    }
}

impl RenderSection {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes * 60)
    }
}

/// # Renderer Section
///
/// How the external rasterizer is invoked. The four contract arguments
/// (html path, output path, width, height) are appended after `args`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererSection {
    pub command: String,
    pub args: Vec<String>,
    /// External converter producing the 1-bit BMP sibling (ImageMagick `convert`).
    pub bitmap_converter: Option<String>,
}

impl Default for RendererSection {
    fn default() -> Self {
        Self {
            command: "scripts/render-chromium.sh".to_string(),
            args: Vec::new(),
            bitmap_converter: Some("convert".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSourcesSection {
    /// Local JSON files merged into every view, in order.
    pub json_files: Vec<PathBuf>,
    /// HTTP endpoints returning JSON objects, merged after the files.
    pub api_endpoints: Vec<String>,
}

/// Device identity handed out on `/api/setup` and checked on `/api/display`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceSection {
    pub api_key: String,
    pub friendly_id: String,
    pub refresh_rate_seconds: u64,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            friendly_id: "TRMNL-LOCAL".to_string(),
            refresh_rate_seconds: 900,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathsSection {
    pub output_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            templates_dir: PathBuf::from("templates"),
            data_dir: PathBuf::from("data"),
        }
    }
}

/// # Application Configuration
///
/// The whole `config.json`. Built with [`load_config`] or `Default`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub render: RenderSection,
    pub renderer: RendererSection,
    pub data_sources: DataSourcesSection,
    pub trmnl: DeviceSection,
    pub paths: PathsSection,
    pub views: Vec<ViewDescriptor>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            render: RenderSection::default(),
            renderer: RendererSection::default(),
            data_sources: DataSourcesSection::default(),
            trmnl: DeviceSection::default(),
            paths: PathsSection::default(),
            views: default_views(),
        }
    }
}

/// The built-in catalogue used when the configuration names no views.
pub fn default_views() -> Vec<ViewDescriptor> {
    vec![
        ViewDescriptor::new("todo", "templates/todo.html", "data/todo.json"),
        ViewDescriptor::new("dashboard", "templates/dashboard.html", "data/example.json"),
        ViewDescriptor::new("chores", "templates/chores.html", "data/chores.json"),
    ]
}

impl AppConfig {
    /// Checks the invariants the rest of the system relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "render canvas must be non-empty, got {}x{}",
                self.render.width, self.render.height
            )));
        }
        if self.render.refresh_interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "refreshIntervalMinutes must be at least 1".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for view in &self.views {
            if view.name.trim().is_empty() {
                return Err(ConfigError::Invalid("view name must not be empty".to_string()));
            }
            if !seen.insert(view.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate view name '{}'",
                    view.name
                )));
            }
        }
        Ok(())
    }

    /// Scratch directory for conversions.
    pub fn scratch_dir(&self) -> PathBuf {
        self.render
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Where a single view's raster is written.
    pub fn view_output_path(&self, view: &ViewDescriptor) -> PathBuf {
        self.paths.output_dir.join(format!("{}.png", view.name))
    }
}

/// Parses a configuration from a JSON string and validates it.
pub fn parse_config(raw: &str, origin: &Path) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration file at `path`.
///
/// A missing file is not an error: the defaults are returned. A file that
/// exists but cannot be read or parsed is.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        log::info!(
            "Config file not found at {}. Using defaults.",
            path.display()
        );
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, path)
}
