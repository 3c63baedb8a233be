//! Command line, environment and file configuration for `server_trmnl`.
//!
//! Precedence, lowest first: built-in defaults, `config.json`, environment
//! variables, command-line flags. Environment and flags are parsed together
//! by clap and merged over the file.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use lib_trmnl::configs::config_app::{load_config, AppConfig, CONFIG_FILE_NAME};

#[derive(Parser, Debug, Clone, Default)]
#[clap(about = "Local TRMNL e-ink display server", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[clap(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server with scheduled rendering and rotation (default).
    Serve,
    /// Render every view once and publish the current one.
    RenderOnce,
    /// Render a single view by name.
    RenderView { name: String },
    /// Scaffold a new template and sample data file.
    GenerateTemplate { name: String },
    /// Lint every configured view's template and data file.
    ValidateTemplates,
}

#[derive(Args, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overrides {
    #[clap(long, global = true, env = "TRMNL_CONFIG", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, global = true, env = "TRMNL_HOST", help = "Address to bind the HTTP server to.")]
    pub host: Option<String>,

    #[clap(long, global = true, env = "TRMNL_PORT", help = "Port to listen on for device requests.")]
    pub port: Option<u16>,

    #[clap(long, global = true, env = "TRMNL_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, global = true, env = "TRMNL_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, global = true, env = "TRMNL_OUTPUT_PATH", help = "Where the device-facing raster is published.")]
    pub output_path: Option<PathBuf>,

    #[clap(long, global = true, env = "TRMNL_REFRESH_MINUTES", help = "Minutes between scheduled renders of all views.")]
    pub refresh_minutes: Option<u64>,
}

impl Overrides {
    // Merge two Overrides, where 'other' overrides 'self' for Some values
    pub fn merge(self, other: Overrides) -> Overrides {
        Overrides {
            config_path: other.config_path.or(self.config_path),
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            output_path: other.output_path.or(self.output_path),
            refresh_minutes: other.refresh_minutes.or(self.refresh_minutes),
        }
    }

    fn defaults() -> Overrides {
        Overrides {
            config_path: Some(PathBuf::from(CONFIG_FILE_NAME)),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    /// Applies the values that live in `AppConfig`.
    fn apply_to(&self, app: &mut AppConfig) {
        if let Some(host) = &self.host {
            app.server.host = host.clone();
        }
        if let Some(port) = self.port {
            app.server.port = port;
        }
        if let Some(path) = &self.output_path {
            app.render.output_path = path.clone();
        }
        if let Some(minutes) = self.refresh_minutes {
            app.render.refresh_interval_minutes = minutes;
        }
    }
}

/// Everything the binary needs after resolution.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app: AppConfig,
    pub config_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

/// Resolves the final settings from the parsed command line.
pub fn resolve(cli: &Cli) -> anyhow::Result<Settings> {
    let merged = Overrides::defaults().merge(cli.overrides.clone());
    let config_path = merged
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    let mut app = load_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    merged.apply_to(&mut app);
    app.validate().context("Invalid configuration after overrides")?;

    Ok(Settings {
        app,
        config_path,
        log_dir: merged.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
        log_level: merged.log_level.unwrap_or_else(|| "info".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn later_values_win_in_merge() {
        let base = Overrides {
            port: Some(1),
            host: Some("a".into()),
            ..Default::default()
        };
        let top = Overrides {
            port: Some(2),
            ..Default::default()
        };
        let merged = base.merge(top);
        assert_eq!(merged.port, Some(2));
        assert_eq!(merged.host.as_deref(), Some("a"));
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["server_trmnl", "render-view", "todo", "--port", "9000"]).unwrap();
        assert_eq!(cli.command, Some(Command::RenderView { name: "todo".into() }));
        assert_eq!(cli.overrides.port, Some(9000));

        let cli = Cli::try_parse_from(["server_trmnl"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "server": { "port": 7000 }, "render": { "refreshIntervalMinutes": 5 } }"#).unwrap();

        let cli = Cli {
            command: None,
            overrides: Overrides {
                config_path: Some(path),
                port: Some(7100),
                ..Default::default()
            },
        };
        let settings = resolve(&cli).unwrap();
        assert_eq!(settings.app.server.port, 7100);
        assert_eq!(settings.app.render.refresh_interval_minutes, 5);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn zero_refresh_override_is_rejected() {
        let dir = tempdir().unwrap();
        let cli = Cli {
            command: None,
            overrides: Overrides {
                config_path: Some(dir.path().join("absent.json")),
                refresh_minutes: Some(0),
                ..Default::default()
            },
        };
        assert!(resolve(&cli).is_err());
    }
}
