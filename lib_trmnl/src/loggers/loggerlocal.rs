//! # Local Logger
//!
//! Console and file logging through `fern`.
//!
//! - Console lines carry a colored level.
//! - Each run writes `<app>-<YYYYmmdd_HHMMSS>.log` in the log directory.
//!   After the new file is opened, older files of the same app are deleted,
//!   so only the newest one survives.

use std::path::{Path, PathBuf};

use chrono::Local;
use colored::*;
use glob::glob;
use log::{Level, LevelFilter};

/// Maps a level name to a filter. Unknown names fall back to `Info`.
pub fn parse_level(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" | "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

fn colored_level(level: Level) -> ColoredString {
    let text = level.to_string();
    match level {
        Level::Error => text.bright_red(),
        Level::Warn => text.bright_yellow(),
        Level::Info => text.bright_green(),
        Level::Debug => text.bright_white(),
        Level::Trace => text.bright_cyan(),
    }
}

/// `<app>-<YYYYmmdd_HHMMSS>.log`
pub fn log_file_name(app_name: &str) -> String {
    format!("{}-{}.log", app_name, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Deletes every `<app>-*.log` in `log_dir` except the newest (by name,
/// which sorts by timestamp). Returns the number of files removed.
pub fn rotate_logs(app_name: &str, log_dir: &Path) -> usize {
    let pattern = format!("{}/{}-*.log", log_dir.display(), glob::Pattern::escape(app_name));
    let mut log_files: Vec<PathBuf> = match glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            eprintln!("{}", format!("Invalid log rotation pattern {}: {}", pattern, e).red());
            return 0;
        }
    };

    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = 0;
    for old_file in log_files.iter().skip(1) {
        match std::fs::remove_file(old_file) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Error deleting old log file {}: {}", old_file.display(), e),
        }
    }
    removed
}

/// Installs the global logger.
///
/// With `log_dir` set, a log file is created there and older ones are
/// rotated away. Returns the path of the new log file.
pub fn setup_logging(
    app_name: &str,
    log_dir: Option<&Path>,
    level: &str,
) -> anyhow::Result<Option<PathBuf>> {
    let level = parse_level(level);

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target().truecolor(128, 128, 128),
                colored_level(record.level()),
                message
            ))
        })
        .chain(std::io::stdout());

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(console);

    let mut log_path = None;
    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(log_file_name(app_name));
        let file = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}[{}][{}] {}",
                    Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                    record.target(),
                    record.level(),
                    message
                ))
            })
            .chain(fern::log_file(&path)?);
        dispatch = dispatch.chain(file);
        rotate_logs(app_name, dir);
        log_path = Some(path);
    }

    dispatch.apply()?;
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warn"), LevelFilter::Warn);
        assert_eq!(parse_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_level("bogus"), LevelFilter::Info);
    }

    #[test]
    fn file_name_carries_app_and_timestamp() {
        let name = log_file_name("server_trmnl");
        assert!(name.starts_with("server_trmnl-"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "server_trmnl-".len() + 15 + ".log".len());
    }

    #[test]
    fn rotation_keeps_only_newest_file_of_the_app() {
        let dir = tempdir().unwrap();
        for stamp in ["20240101_000000", "20240301_120000", "20240201_000000"] {
            std::fs::write(dir.path().join(format!("app-{stamp}.log")), "x").unwrap();
        }
        std::fs::write(dir.path().join("other-20230101_000000.log"), "x").unwrap();

        assert_eq!(rotate_logs("app", dir.path()), 2);
        assert!(dir.path().join("app-20240301_120000.log").exists());
        assert!(!dir.path().join("app-20240101_000000.log").exists());
        assert!(dir.path().join("other-20230101_000000.log").exists());
    }
}
