//! Nearest-neighbour resize and fixed-threshold binarization.

use image::{DynamicImage, GrayImage, Luma};

use crate::errors::{RenderError, RenderResult};

pub const BLACK: u8 = 0;
pub const WHITE: u8 = 255;
/// Averages below this are black.
pub const THRESHOLD: u32 = 128;

/// Resamples `source` to exactly `width` x `height` and reduces every pixel
/// to pure black or white.
///
/// Sampling uses integer mapping (`src_x = x * src_w / width`); the pixel is
/// black when the mean of its R, G and B channels is below [`THRESHOLD`].
/// Alpha is ignored. No dithering.
pub fn binarize(source: &DynamicImage, width: u32, height: u32) -> RenderResult<GrayImage> {
    let (src_w, src_h) = (source.width(), source.height());
    if src_w == 0 || src_h == 0 {
        return Err(RenderError::Conversion("intermediate raster is empty".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(RenderError::Conversion(format!(
            "invalid target size {}x{}",
            width, height
        )));
    }

    let rgba = source.to_rgba8();
    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let sx = (u64::from(x) * u64::from(src_w) / u64::from(width)) as u32;
        let sy = (u64::from(y) * u64::from(src_h) / u64::from(height)) as u32;
        let [r, g, b, _] = rgba.get_pixel(sx, sy).0;
        let gray = (u32::from(r) + u32::from(g) + u32::from(b)) / 3;
        *pixel = Luma([if gray < THRESHOLD { BLACK } else { WHITE }]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn output_has_target_size_and_two_levels() {
        let mut src = RgbaImage::new(37, 11);
        for (x, y, p) in src.enumerate_pixels_mut() {
            let v = ((x * 7 + y * 13) % 256) as u8;
            *p = Rgba([v, v / 2, 255 - v, 255]);
        }
        let out = binarize(&DynamicImage::ImageRgba8(src), 80, 48).unwrap();
        assert_eq!(out.dimensions(), (80, 48));
        assert!(out.pixels().all(|p| p.0[0] == BLACK || p.0[0] == WHITE));
    }

    #[test]
    fn threshold_sits_at_midpoint() {
        let mut src = RgbaImage::new(3, 1);
        src.put_pixel(0, 0, Rgba([127, 127, 127, 255]));
        src.put_pixel(1, 0, Rgba([128, 128, 128, 255]));
        // transparent white still counts as white
        src.put_pixel(2, 0, Rgba([255, 255, 255, 0]));
        let out = binarize(&DynamicImage::ImageRgba8(src), 3, 1).unwrap();
        assert_eq!(out.get_pixel(0, 0).0[0], BLACK);
        assert_eq!(out.get_pixel(1, 0).0[0], WHITE);
        assert_eq!(out.get_pixel(2, 0).0[0], WHITE);
    }

    #[test]
    fn downsampling_picks_nearest_source_pixel() {
        // left half black, right half white
        let mut src = RgbaImage::new(4, 2);
        for (x, _, p) in src.enumerate_pixels_mut() {
            *p = if x < 2 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) };
        }
        let out = binarize(&DynamicImage::ImageRgba8(src), 2, 1).unwrap();
        assert_eq!(out.get_pixel(0, 0).0[0], BLACK);
        assert_eq!(out.get_pixel(1, 0).0[0], WHITE);
    }

    #[test]
    fn upsampling_repeats_pixels() {
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let out = binarize(&DynamicImage::ImageRgba8(src), 4, 2).unwrap();
        let row: Vec<u8> = (0..4).map(|x| out.get_pixel(x, 1).0[0]).collect();
        assert_eq!(row, vec![BLACK, BLACK, WHITE, WHITE]);
    }

    #[test]
    fn empty_source_is_rejected() {
        let src = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(binarize(&src, 10, 10).is_err());
    }
}
