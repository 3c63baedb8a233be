//! # Rasterizer
//!
//! The capability that turns an HTML file into a raster image. The pipeline
//! only depends on the [`Rasterizer`] trait; [`ExternalRasterizer`] is the
//! production implementation, driving a headless browser through a script.
//!
//! Contract of the external program: four trailing positional arguments
//! (input HTML path, output raster path, width, height), exit status 0 and a
//! non-empty output file. Anything on stderr is captured for diagnostics.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use crate::errors::{RenderError, RenderResult};

/// Produces `output` (any format the `image` crate can decode) from `html`.
///
/// Implementations block; callers run them off the async runtime.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, html: &Path, output: &Path, width: u32, height: u32) -> RenderResult<()>;
}

/// Runs `program [args..] <html> <output> <width> <height>`.
#[derive(Debug, Clone)]
pub struct ExternalRasterizer {
    program: String,
    args: Vec<String>,
}

impl ExternalRasterizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Rasterizer for ExternalRasterizer {
    fn rasterize(&self, html: &Path, output: &Path, width: u32, height: u32) -> RenderResult<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(html)
            .arg(output)
            .arg(width.to_string())
            .arg(height.to_string());
        log::trace!("Executing rasterizer: {:?}", command);

        let result = command.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::PermissionDenied {
                RenderError::RendererUnavailable(format!("{}: {}", self.program, e))
            } else {
                RenderError::RendererExecution {
                    status: None,
                    stderr: e.to_string(),
                }
            }
        })?;

        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        if !result.status.success() {
            return Err(RenderError::RendererExecution {
                status: result.status.code(),
                stderr,
            });
        }

        let produced = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if produced == 0 {
            return Err(RenderError::RendererExecution {
                status: result.status.code(),
                stderr: if stderr.is_empty() {
                    format!("renderer produced no output at {}", output.display())
                } else {
                    stderr
                },
            });
        }
        Ok(())
    }
}
