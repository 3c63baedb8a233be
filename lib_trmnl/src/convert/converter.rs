//! # Image Converter
//!
//! HTML in, published monochrome raster out:
//!
//! 1. the HTML is written to a private scratch directory,
//! 2. the [`Rasterizer`] renders it to an intermediate image,
//! 3. the image is resized to the canvas and binarized,
//! 4. the result is published atomically.
//!
//! The scratch directory is a `TempDir`, so it is removed on every exit path.
//! All methods block and belong on a blocking thread.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use super::monochrome::binarize;
use super::publish::{publish_atomic, temp_sibling, RasterFormat};
use super::rasterizer::Rasterizer;
use crate::errors::RenderResult;

const SCRATCH_HTML: &str = "page.html";
const SCRATCH_RASTER: &str = "raster.png";

#[derive(Clone)]
pub struct ImageConverter {
    rasterizer: Arc<dyn Rasterizer>,
    scratch_dir: PathBuf,
    bitmap_converter: Option<String>,
}

impl ImageConverter {
    /// `bitmap_converter` names an ImageMagick-compatible `convert` used for
    /// the 1-bit BMP sibling of device-facing rasters. `None` disables it.
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        scratch_dir: impl Into<PathBuf>,
        bitmap_converter: Option<String>,
    ) -> Self {
        Self {
            rasterizer,
            scratch_dir: scratch_dir.into(),
            bitmap_converter,
        }
    }

    /// Renders `html` and publishes a `width` x `height` black/white raster
    /// at `output`. Returns the published size in bytes.
    pub fn convert(&self, html: &str, width: u32, height: u32, output: &Path) -> RenderResult<u64> {
        fs::create_dir_all(&self.scratch_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix("trmnl-render-")
            .tempdir_in(&self.scratch_dir)?;

        let html_path = scratch.path().join(SCRATCH_HTML);
        fs::write(&html_path, html)?;

        let raster_path = scratch.path().join(SCRATCH_RASTER);
        self.rasterizer
            .rasterize(&html_path, &raster_path, width, height)?;

        let intermediate = image::open(&raster_path)?;
        let mono = binarize(&intermediate, width, height)?;
        let size = publish_atomic(&mono, output)?;
        log::debug!(
            "Converted {}x{} raster to {} ({} bytes)",
            intermediate.width(),
            intermediate.height(),
            output.display(),
            size
        );
        Ok(size)
    }

    /// Copies an already converted raster to the device-facing `output`,
    /// re-encoding for `output`'s extension, then refreshes the BMP sibling.
    pub fn republish(&self, source: &Path, output: &Path) -> RenderResult<u64> {
        let image = image::open(source)?.to_luma8();
        let size = publish_atomic(&image, output)?;
        self.write_bitmap_sibling(output);
        Ok(size)
    }

    /// Best-effort 1-bit BMP3 next to a PNG `primary`. Without a converter, or
    /// on failure, any stale sibling is removed so it cannot shadow the fresh PNG.
    fn write_bitmap_sibling(&self, primary: &Path) {
        if RasterFormat::for_path(primary) == RasterFormat::Bmp {
            return;
        }
        let sibling = primary.with_extension("bmp");
        let Some(program) = &self.bitmap_converter else {
            if fs::remove_file(&sibling).is_ok() {
                log::debug!("Removed stale bitmap {}", sibling.display());
            }
            return;
        };

        let tmp = temp_sibling(&sibling);
        let mut target = std::ffi::OsString::from("BMP3:");
        target.push(tmp.as_os_str());

        let outcome = Command::new(program)
            .arg(primary)
            .args(["-threshold", "50%", "-type", "Bilevel", "-depth", "1", "-compress", "none"])
            .arg(&target)
            .output();

        let failure = match outcome {
            Ok(out) if out.status.success() => match fs::rename(&tmp, &sibling) {
                Ok(()) => {
                    log::debug!("Wrote 1-bit bitmap {}", sibling.display());
                    return;
                }
                Err(e) => e.to_string(),
            },
            Ok(out) => String::from_utf8_lossy(&out.stderr).trim().to_string(),
            Err(e) => e.to_string(),
        };
        log::debug!("Bitmap conversion with '{}' skipped: {}", program, failure);
        let _ = fs::remove_file(&tmp);
        let _ = fs::remove_file(&sibling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RenderError;
    use image::{Rgb, RgbImage};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Writes a gradient PNG and remembers the scratch HTML path it was given.
    struct GradientRasterizer {
        seen_html: Mutex<Option<PathBuf>>,
    }

    impl Rasterizer for GradientRasterizer {
        fn rasterize(&self, html: &Path, output: &Path, width: u32, height: u32) -> RenderResult<()> {
            assert!(html.exists());
            *self.seen_html.lock().unwrap() = Some(html.to_path_buf());
            // twice the canvas, like a HiDPI screenshot
            let img = RgbImage::from_fn(width * 2, height * 2, |x, _| {
                let v = (x * 255 / (width * 2)) as u8;
                Rgb([v, v, v])
            });
            img.save(output)?;
            Ok(())
        }
    }

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(&self, _: &Path, _: &Path, _: u32, _: u32) -> RenderResult<()> {
            Err(RenderError::RendererExecution {
                status: Some(1),
                stderr: "crashed".into(),
            })
        }
    }

    #[test]
    fn converts_to_canvas_sized_black_and_white() {
        let dir = tempdir().unwrap();
        let raster = Arc::new(GradientRasterizer {
            seen_html: Mutex::new(None),
        });
        let converter = ImageConverter::new(raster.clone(), dir.path().join("scratch"), None);
        let out = dir.path().join("out/view.png");

        let size = converter.convert("<html></html>", 64, 32, &out).unwrap();
        assert!(size > 0);

        let img = image::open(&out).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (64, 32));
        assert!(img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(63, 0).0[0], 255);

        let html = raster.seen_html.lock().unwrap().clone().unwrap();
        assert!(!html.exists());
    }

    #[test]
    fn renderer_failure_leaves_output_and_scratch_clean() {
        let dir = tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let converter = ImageConverter::new(Arc::new(FailingRasterizer), &scratch, None);
        let out = dir.path().join("view.png");
        fs::write(&out, b"old").unwrap();

        let err = converter.convert("<html></html>", 8, 8, &out).unwrap_err();
        assert!(matches!(err, RenderError::RendererExecution { .. }));
        assert_eq!(fs::read(&out).unwrap(), b"old");
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn republish_reencodes_for_target_extension() {
        let dir = tempdir().unwrap();
        let converter = ImageConverter::new(
            Arc::new(GradientRasterizer {
                seen_html: Mutex::new(None),
            }),
            dir.path(),
            None,
        );
        let view = dir.path().join("view.png");
        converter.convert("<html></html>", 16, 8, &view).unwrap();

        let device = dir.path().join("screen.bmp");
        converter.republish(&view, &device).unwrap();
        assert_eq!(&fs::read(&device).unwrap()[..2], b"BM");
    }

    #[test]
    fn failed_bitmap_conversion_removes_stale_sibling() {
        let dir = tempdir().unwrap();
        let converter = ImageConverter::new(
            Arc::new(GradientRasterizer {
                seen_html: Mutex::new(None),
            }),
            dir.path(),
            Some("/nonexistent/convert".into()),
        );
        let view = dir.path().join("view.png");
        converter.convert("<html></html>", 16, 8, &view).unwrap();

        let device = dir.path().join("screen.png");
        let stale = dir.path().join("screen.bmp");
        fs::write(&stale, b"stale").unwrap();

        converter.republish(&view, &device).unwrap();
        assert!(device.exists());
        assert!(!stale.exists());
    }

    #[test]
    fn disabled_bitmap_converter_removes_stale_sibling() {
        let dir = tempdir().unwrap();
        let converter = ImageConverter::new(
            Arc::new(GradientRasterizer {
                seen_html: Mutex::new(None),
            }),
            dir.path(),
            None,
        );
        let view = dir.path().join("view.png");
        converter.convert("<html></html>", 16, 8, &view).unwrap();

        let device = dir.path().join("screen.png");
        let stale = dir.path().join("screen.bmp");
        fs::write(&stale, b"stale-from-last-week").unwrap();

        converter.republish(&view, &device).unwrap();
        assert!(device.exists());
        assert!(!stale.exists());
    }
}
