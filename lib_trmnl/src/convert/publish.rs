//! # Atomic Publication
//!
//! A published raster is written to `<target>.tmp`, flushed to disk and then
//! renamed over `<target>`. Readers polling the target see either the old
//! file or the new one, never a partial write. On failure the temp file is
//! removed and the previous raster stays in place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, GrayImage, ImageEncoder};

use crate::errors::{RenderError, RenderResult};

/// Encodings a raster can be published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Bmp,
}

impl RasterFormat {
    /// `.bmp` (any case) selects BMP, anything else PNG.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bmp") => RasterFormat::Bmp,
            _ => RasterFormat::Png,
        }
    }
}

/// `<path>.tmp`, next to `path`.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Encodes a grayscale raster in memory.
pub fn encode(image: &GrayImage, format: RasterFormat) -> RenderResult<Vec<u8>> {
    let mut buf = Vec::new();
    let (w, h) = image.dimensions();
    match format {
        RasterFormat::Png => PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive)
            .write_image(image.as_raw(), w, h, ExtendedColorType::L8)?,
        RasterFormat::Bmp => BmpEncoder::new(&mut buf).write_image(image.as_raw(), w, h, ExtendedColorType::L8)?,
    }
    Ok(buf)
}

/// Encodes `image` for `target`'s extension and publishes it atomically.
/// Returns the published size in bytes.
pub fn publish_atomic(image: &GrayImage, target: &Path) -> RenderResult<u64> {
    let bytes = encode(image, RasterFormat::for_path(target))?;
    publish_bytes(&bytes, target)?;
    Ok(bytes.len() as u64)
}

/// Publishes already-encoded bytes through the temp-file-and-rename path.
pub fn publish_bytes(bytes: &[u8], target: &Path) -> RenderResult<()> {
    let publish_err = |source: io::Error| RenderError::Publish {
        path: target.to_path_buf(),
        source,
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(publish_err)?;
    }

    let tmp = temp_sibling(target);
    let written = write_synced(&tmp, bytes).and_then(|_| fs::rename(&tmp, target));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(publish_err(e));
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn checker(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 255 }]))
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(RasterFormat::for_path(Path::new("a/screen.BMP")), RasterFormat::Bmp);
        assert_eq!(RasterFormat::for_path(Path::new("a/screen.png")), RasterFormat::Png);
        assert_eq!(RasterFormat::for_path(Path::new("a/screen")), RasterFormat::Png);
    }

    #[test]
    fn temp_file_sits_next_to_target() {
        assert_eq!(temp_sibling(Path::new("out/screen.png")), PathBuf::from("out/screen.png.tmp"));
    }

    #[test]
    fn published_png_decodes_to_same_pixels() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/screen.png");
        let img = checker(16, 8);

        let size = publish_atomic(&img, &target).unwrap();
        assert_eq!(size, fs::metadata(&target).unwrap().len());
        assert!(!temp_sibling(&target).exists());

        let back = image::open(&target).unwrap().to_luma8();
        assert_eq!(back, img);
    }

    #[test]
    fn published_bmp_is_a_bmp() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("screen.bmp");
        publish_atomic(&checker(8, 8), &target).unwrap();
        let bytes = fs::read(&target).unwrap();
        assert_eq!(&bytes[..2], b"BM");
        let back = image::open(&target).unwrap().to_luma8();
        assert_eq!(back.dimensions(), (8, 8));
    }

    #[test]
    fn failed_publish_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("screen.png");
        fs::write(&target, b"previous").unwrap();
        // a directory squatting on the temp name makes the write fail
        fs::create_dir(temp_sibling(&target)).unwrap();

        let err = publish_atomic(&checker(4, 4), &target).unwrap_err();
        assert!(matches!(err, RenderError::Publish { .. }));
        assert_eq!(fs::read(&target).unwrap(), b"previous");
    }

    #[cfg(unix)]
    #[test]
    fn concurrent_readers_never_see_partial_files() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("screen.png");
        publish_atomic(&checker(200, 120), &target).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let target = target.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0;
                loop {
                    let bytes = fs::read(&target).unwrap();
                    assert!(!bytes.is_empty());
                    let img = image::load_from_memory(&bytes).unwrap();
                    assert_eq!((img.width(), img.height()), (200, 120));
                    reads += 1;
                    if done.load(Ordering::SeqCst) {
                        break reads;
                    }
                }
            })
        };

        for i in 0..40u32 {
            let img = GrayImage::from_fn(200, 120, |x, _| Luma([if (x + i) % 3 == 0 { 0 } else { 255 }]));
            publish_atomic(&img, &target).unwrap();
        }
        done.store(true, Ordering::SeqCst);
        assert!(reader.join().unwrap() > 0);
    }
}
