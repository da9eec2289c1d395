//! Transform stage: decode, flatten, bound dimensions, encode as WebP, persist.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use artfetch_core::PipelineError;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

/// Parameters for one conversion.
#[derive(Debug, Clone, Copy)]
pub struct TransformOptions {
    /// Maximum output width in pixels. Wider images are downscaled preserving
    /// aspect ratio; narrower ones keep their native resolution.
    pub max_width: u32,
    /// WebP quality, 0-100.
    pub quality: f32,
}

/// Artwork transformer. All methods are synchronous and CPU-bound; callers on
/// the async runtime run them under `spawn_blocking`.
pub struct ArtworkTransformer;

impl ArtworkTransformer {
    /// Full transform: decode the payload, flatten any transparency onto white,
    /// downscale to the width bound, and encode as lossy WebP.
    pub fn transform(data: &[u8], options: TransformOptions) -> Result<Vec<u8>, PipelineError> {
        let img = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| PipelineError::Decode(e.to_string()))?;

        let rgb = Self::flatten_to_rgb(&img);
        let rgb = Self::bound_width(rgb, options.max_width);

        let (width, height) = rgb.dimensions();
        let encoder = webp::Encoder::from_rgb(rgb.as_raw(), width, height);
        let encoded = encoder
            .encode_simple(false, options.quality)
            .map_err(|e| PipelineError::Encode(format!("{e:?}")))?;
        Ok(encoded.to_vec())
    }

    /// Normalize color mode to 3-channel RGB. Images carrying an alpha channel
    /// are composited over an opaque white canvas; transparency is deliberately
    /// not preserved. Everything else converts directly.
    pub fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
        if !img.color().has_alpha() {
            return img.to_rgb8();
        }
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut out = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let alpha = pixel[3] as u32;
            let dst = out.get_pixel_mut(x, y);
            for channel in 0..3 {
                let src = pixel[channel] as u32;
                dst[channel] = ((src * alpha + 255 * (255 - alpha)) / 255) as u8;
            }
        }
        out
    }

    /// Downscale to `max_width` preserving aspect ratio, with the new height
    /// rounded from `height * max_width / width`. Never upscales.
    pub fn bound_width(img: RgbImage, max_width: u32) -> RgbImage {
        let (width, height) = img.dimensions();
        if width <= max_width {
            return img;
        }
        let new_height = (height as f64 * max_width as f64 / width as f64).round() as u32;
        image::imageops::resize(&img, max_width, new_height.max(1), FilterType::Lanczos3)
    }

    /// Write encoded bytes to the destination, creating parent directories as
    /// needed. Concurrent tasks may race on directory creation; `create_dir_all`
    /// tolerates "already exists". A failed write leaves no partial file behind.
    pub fn persist(data: &[u8], dest: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::filesystem(parent, e))?;
        }
        if let Err(e) = fs::write(dest, data) {
            let _ = fs::remove_file(dest);
            return Err(PipelineError::filesystem(dest, e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn decoded(webp_data: &[u8]) -> DynamicImage {
        image::ImageReader::new(Cursor::new(webp_data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn transform_produces_webp() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([120, 10, 200])));
        let out = ArtworkTransformer::transform(
            &png_bytes(&img),
            TransformOptions {
                max_width: 1920,
                quality: 75.0,
            },
        )
        .unwrap();
        // RIFF container with WEBP fourcc
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[8..12], b"WEBP");
        assert_eq!(decoded(&out).dimensions(), (64, 48));
    }

    #[test]
    fn transform_downscales_to_max_width() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 50, Rgb([0, 0, 0])));
        let out = ArtworkTransformer::transform(
            &png_bytes(&img),
            TransformOptions {
                max_width: 40,
                quality: 75.0,
            },
        )
        .unwrap();
        assert_eq!(decoded(&out).dimensions(), (40, 20));
    }

    #[test]
    fn transform_rejects_garbage() {
        let err = ArtworkTransformer::transform(
            b"definitely not an image",
            TransformOptions {
                max_width: 1920,
                quality: 75.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[test]
    fn flatten_composites_alpha_over_white() {
        // 50% transparent pure red: expect roughly half red, half white.
        let rgba = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 128]));
        let flat = ArtworkTransformer::flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));
        let px = flat.get_pixel(0, 0);
        assert_eq!(px[0], 255);
        assert!((126..=129).contains(&px[1]), "green was {}", px[1]);
        assert!((126..=129).contains(&px[2]), "blue was {}", px[2]);
    }

    #[test]
    fn flatten_fully_transparent_is_white() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0]));
        let flat = ArtworkTransformer::flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(1, 1), &Rgb([255, 255, 255]));
    }

    #[test]
    fn flatten_opaque_passes_through() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([9, 9, 9])));
        let flat = ArtworkTransformer::flatten_to_rgb(&img);
        assert_eq!(flat.get_pixel(2, 2), &Rgb([9, 9, 9]));
    }

    #[test]
    fn bound_width_rounds_height() {
        let img = RgbImage::new(1000, 333);
        let resized = ArtworkTransformer::bound_width(img, 500);
        // round(333 * 500 / 1000) = round(166.5) = 167
        assert_eq!(resized.dimensions(), (500, 167));
    }

    #[test]
    fn bound_width_never_upscales() {
        let img = RgbImage::new(200, 100);
        let resized = ArtworkTransformer::bound_width(img, 1920);
        assert_eq!(resized.dimensions(), (200, 100));
    }

    #[test]
    fn bound_width_exact_limit_unchanged() {
        let img = RgbImage::new(1920, 800);
        let resized = ArtworkTransformer::bound_width(img, 1920);
        assert_eq!(resized.dimensions(), (1920, 800));
    }

    #[test]
    fn persist_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("movies/posters/1_Test_poster.webp");
        ArtworkTransformer::persist(b"data", &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"data");
    }
}
