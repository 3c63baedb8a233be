//! # Scenario Fixtures
//!
//! Builds throwaway workspaces (templates, data files, configuration) in a
//! temporary directory and supplies a deterministic [`Rasterizer`] so the
//! scenarios under `tests/` never need a browser.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{GrayImage, Luma};
use lib_trmnl::convert::Rasterizer;
use lib_trmnl::{AppConfig, RenderPipeline, RenderResult, ViewDescriptor};
use tempfile::TempDir;

/// A dashboard template binding title, cards and fields.
pub const DASHBOARD_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta name="viewport" content="width=800, height=480">
<style>{{ styles }}</style>
</head>
<body>
<div class="header"><h1>{{ title }}</h1><span>{{ timestamp }}</span></div>
<div class="content">
{% for card in cards %}<div class="card"><b>{{ card.label }}</b> {{ card.value }}{{ card.unit }}</div>{% endfor %}
{% for task in tasks %}<li>{{ task.text }}</li>{% endfor %}
</div>
</body>
</html>"#;

/// # Gradient Rasterizer
///
/// Paints a horizontal gray ramp at half the requested size, so the
/// converter has to resize and threshold. Pages mentioning "invert" get the
/// ramp mirrored. Counts its invocations.
#[derive(Default)]
pub struct GradientRasterizer {
    pub calls: AtomicUsize,
}

impl GradientRasterizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rasterizer for GradientRasterizer {
    fn rasterize(&self, html: &Path, output: &Path, width: u32, height: u32) -> RenderResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let invert = fs::read_to_string(html)?.contains("invert");
        let (w, h) = ((width / 2).max(1), (height / 2).max(1));
        let span = w.max(2) - 1;
        GrayImage::from_fn(w, h, |x, _| {
            let level = (x.min(span) * 255 / span) as u8;
            Luma([if invert { 255 - level } else { level }])
        })
        .save(output)?;
        Ok(())
    }
}

/// A temporary directory laid out like a deployment.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("templates"))?;
        fs::create_dir_all(dir.path().join("data"))?;
        Ok(Self { dir })
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Writes a template and its data file, returning the view descriptor.
    pub fn add_view(&self, name: &str, template: &str, data: &serde_json::Value) -> std::io::Result<ViewDescriptor> {
        let template_path = self.path(&format!("templates/{name}.html"));
        let data_path = self.path(&format!("data/{name}.json"));
        fs::write(&template_path, template)?;
        fs::write(&data_path, serde_json::to_string_pretty(data)?)?;
        Ok(ViewDescriptor::new(name, template_path, data_path))
    }

    /// Configuration pointing every path into the workspace.
    pub fn config(&self, views: Vec<ViewDescriptor>) -> AppConfig {
        let mut config = AppConfig::default();
        config.render.output_path = self.path("output/screen.png");
        config.render.scratch_dir = Some(self.path("scratch"));
        config.renderer.bitmap_converter = None;
        config.paths.output_dir = self.path("output");
        config.paths.templates_dir = self.path("templates");
        config.paths.data_dir = self.path("data");
        config.views = views;
        config
    }

    pub fn pipeline(&self, config: AppConfig, rasterizer: Arc<GradientRasterizer>) -> anyhow::Result<RenderPipeline> {
        Ok(RenderPipeline::new(config, rasterizer)?)
    }
}

/// True when every pixel is pure black or pure white.
pub fn is_bilevel(image: &GrayImage) -> bool {
    image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)
}
