//! # Render Pipeline
//!
//! The explicit context object every periodic task and HTTP handler shares.
//! It owns the scheduler, the last statistics and the collaborators of one
//! render:
//!
//! ```text
//! sources --collect--> RawRecords --normalize--> DisplayRecord
//!         --TemplateRenderer--> HTML --ImageConverter--> <outputDir>/<view>.png
//! ```
//!
//! After a batch, and after every rotation, the current view's raster is
//! republished to `render.outputPath`, the file the device downloads.
//!
//! Renders are single-flight: batches, single-view renders and republishes
//! take `render_lock`, so they never race on scratch files or statistics.
//! Lock order is always `render_lock` before `scheduler`.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::sync::Mutex;

use super::scheduler::ViewScheduler;
use super::stats::RenderStatistics;
use crate::configs::config_app::{AppConfig, ViewDescriptor};
use crate::convert::{ExternalRasterizer, ImageConverter, Rasterizer};
use crate::data::model::DisplayRecord;
use crate::data::normalizer::normalize;
use crate::data::sources::{collect, DataSource};
use crate::errors::{RenderError, RenderResult};
use crate::retrieve::ApiClient;
use crate::templates::TemplateRenderer;

/// Result of rendering one view.
#[derive(Debug, Clone)]
pub struct ViewOutcome {
    pub view: String,
    pub output: PathBuf,
    pub output_size: u64,
    pub record: DisplayRecord,
    pub data_fetch: Duration,
    pub template_render: Duration,
    pub image_conversion: Duration,
}

pub struct RenderPipeline {
    config: AppConfig,
    templates: TemplateRenderer,
    converter: ImageConverter,
    client: ApiClient,
    scheduler: Mutex<ViewScheduler>,
    stats: RwLock<RenderStatistics>,
    render_lock: Mutex<()>,
}

impl RenderPipeline {
    pub fn new(config: AppConfig, rasterizer: Arc<dyn Rasterizer>) -> anyhow::Result<Self> {
        let converter = ImageConverter::new(
            rasterizer,
            config.scratch_dir(),
            config.renderer.bitmap_converter.clone(),
        );
        Ok(Self {
            templates: TemplateRenderer::new(config.render.width, config.render.height),
            converter,
            client: ApiClient::new()?,
            scheduler: Mutex::new(ViewScheduler::new(config.views.clone())),
            stats: RwLock::new(RenderStatistics::default()),
            render_lock: Mutex::new(()),
            config,
        })
    }

    /// Pipeline driving the configured external rasterizer command.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let rasterizer = ExternalRasterizer::new(
            config.renderer.command.clone(),
            config.renderer.args.clone(),
        );
        Self::new(config, Arc::new(rasterizer))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Global files, then global endpoints, then the view's own file.
    pub fn sources_for(&self, view: &ViewDescriptor) -> Vec<DataSource> {
        let globals = &self.config.data_sources;
        globals
            .json_files
            .iter()
            .cloned()
            .map(DataSource::File)
            .chain(globals.api_endpoints.iter().cloned().map(DataSource::Http))
            .chain(std::iter::once(DataSource::File(view.data_path.clone())))
            .collect()
    }

    /// Loads and normalizes a view's data without rendering it.
    pub async fn load_record(&self, view: &ViewDescriptor) -> DisplayRecord {
        normalize(collect(&self.sources_for(view), &self.client).await)
    }

    async fn render_view_unlocked(&self, view: &ViewDescriptor) -> RenderResult<ViewOutcome> {
        let started = Instant::now();
        let record = self.load_record(view).await;
        let data_fetch = started.elapsed();

        let started = Instant::now();
        let html = self.templates.render(view, &record)?;
        let template_render = started.elapsed();

        let started = Instant::now();
        let output = self.config.view_output_path(view);
        let converter = self.converter.clone();
        let (width, height) = (self.config.render.width, self.config.render.height);
        let target = output.clone();
        let output_size = tokio::task::spawn_blocking(move || {
            converter.convert(&html, width, height, &target)
        })
        .await
        .map_err(|e| RenderError::Conversion(format!("conversion task failed: {}", e)))??;
        let image_conversion = started.elapsed();

        log::info!(
            "Rendered view {}: template={:?}, image={:?}, size={:.2} KB",
            view.name,
            template_render,
            image_conversion,
            output_size as f64 / 1024.0
        );

        Ok(ViewOutcome {
            view: view.name.clone(),
            output,
            output_size,
            record,
            data_fetch,
            template_render,
            image_conversion,
        })
    }

    async fn publish_current_unlocked(&self) -> RenderResult<u64> {
        let view = self
            .scheduler
            .lock()
            .await
            .current_view()
            .ok_or(RenderError::NoViews)?;
        let source = self.config.view_output_path(&view);
        if !source.exists() {
            return Err(RenderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("view '{}' has not been rendered yet", view.name),
            )));
        }

        let converter = self.converter.clone();
        let target = self.config.render.output_path.clone();
        let size = tokio::task::spawn_blocking(move || converter.republish(&source, &target))
            .await
            .map_err(|e| RenderError::Conversion(format!("publish task failed: {}", e)))??;
        log::info!(
            "Published current view '{}' to {}",
            view.name,
            self.config.render.output_path.display()
        );
        Ok(size)
    }

    /// Renders every view, then republishes the current one.
    ///
    /// A failing view is logged and skipped; a failing republish is logged
    /// and the previous device raster stays. Only an empty catalogue fails.
    pub async fn render_all(&self) -> RenderResult<RenderStatistics> {
        let _flight = self.render_lock.lock().await;
        let views = {
            let mut scheduler = self.scheduler.lock().await;
            // restores an emptied list from the catalogue
            let _ = scheduler.current_view();
            scheduler.views().to_vec()
        };
        if views.is_empty() {
            return Err(RenderError::NoViews);
        }

        let started = Instant::now();
        let mut stats = RenderStatistics::default();
        for view in &views {
            match self.render_view_unlocked(view).await {
                Ok(outcome) => {
                    stats.data_fetch += outcome.data_fetch;
                    stats.template_render += outcome.template_render;
                    stats.image_conversion += outcome.image_conversion;
                    stats.output_size = outcome.output_size;
                    stats.views_rendered += 1;
                }
                Err(e) => {
                    log::warn!("Failed to render view {}: {}", view.name, e);
                    stats.views_failed += 1;
                }
            }
        }

        match self.publish_current_unlocked().await {
            Ok(size) => stats.output_size = size,
            Err(e) => log::warn!("Failed to publish current view: {}", e),
        }

        stats.total = started.elapsed();
        stats.completed_at = Some(Local::now());
        log::info!(
            "All views rendered: total={:?}, views={}, failed={}",
            stats.total,
            stats.views_rendered,
            stats.views_failed
        );

        match self.stats.write() {
            Ok(mut slot) => *slot = stats.clone(),
            Err(poisoned) => *poisoned.into_inner() = stats.clone(),
        }
        Ok(stats)
    }

    /// Renders one view by name; republishes it when it is the current view.
    pub async fn render_named(&self, name: &str) -> RenderResult<ViewOutcome> {
        let _flight = self.render_lock.lock().await;
        let (view, is_current) = {
            let mut scheduler = self.scheduler.lock().await;
            let current = scheduler.current_view().map(|v| v.name);
            let view = scheduler
                .find(name)
                .cloned()
                .ok_or_else(|| RenderError::UnknownView(name.to_string()))?;
            (view, current.as_deref() == Some(name))
        };

        let outcome = self.render_view_unlocked(&view).await?;
        if is_current {
            if let Err(e) = self.publish_current_unlocked().await {
                log::warn!("Failed to publish current view: {}", e);
            }
        }
        Ok(outcome)
    }

    /// Republishes the current view's last raster to the device path.
    pub async fn publish_current(&self) -> RenderResult<u64> {
        let _flight = self.render_lock.lock().await;
        self.publish_current_unlocked().await
    }

    pub async fn rotate_if_due(&self) -> Option<String> {
        self.rotate_if_due_at(Instant::now()).await
    }

    /// Rotates when the interval has elapsed and republishes the new current
    /// view. Returns the new view's name when a rotation happened.
    pub async fn rotate_if_due_at(&self, now: Instant) -> Option<String> {
        let _flight = self.render_lock.lock().await;
        let current = {
            let mut scheduler = self.scheduler.lock().await;
            if !scheduler.should_rotate_at(now) || !scheduler.rotate_at(now) {
                return None;
            }
            scheduler.current_view().map(|v| v.name)
        };

        if let Err(e) = self.publish_current_unlocked().await {
            log::warn!("Failed to publish rotated view: {}", e);
        }
        current
    }

    /// Snapshot of the last batch's statistics.
    pub fn stats(&self) -> RenderStatistics {
        match self.stats.read() {
            Ok(stats) => stats.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub async fn current_view_name(&self) -> Option<String> {
        self.scheduler.lock().await.current_view().map(|v| v.name)
    }

    pub async fn views(&self) -> Vec<ViewDescriptor> {
        self.scheduler.lock().await.views().to_vec()
    }

    /// Replaces the view catalogue; rotation restarts at the first view.
    pub async fn reload_views(&self, views: Vec<ViewDescriptor>) {
        let _flight = self.render_lock.lock().await;
        self.scheduler.lock().await.reload(views);
    }
}
