//! Downscale an arbitrary image to a compact JPEG for transmission and storage.

use std::io::Cursor;

use anyhow::Context;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use pricesnap_core::SnapError;

use crate::data_url::encode_data_url;

/// Longest side, in pixels, of a preprocessed image.
pub const DEFAULT_MAX_DIMENSION: u32 = 400;

/// JPEG quality (1-100) of a preprocessed image.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

const OUTPUT_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessOptions {
    pub max_dimension: u32,
    pub quality: u8,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// A re-encoded image ready to send to the extraction service.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    pub data: Bytes,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl PreprocessedImage {
    /// Embed the image as a `data:` URL for `ProductRecord::image_url`.
    pub fn to_data_url(&self) -> String {
        encode_data_url(self.mime_type, &self.data)
    }
}

/// Output size for an input of `width` x `height`.
///
/// When the longer side exceeds `max_dimension`, both sides are scaled by
/// `max_dimension / max(width, height)` and rounded. Smaller inputs keep their size.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / longer as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_dimension);
    (scaled(width), scaled(height))
}

/// Decode `bytes`, downscale, and re-encode as JPEG.
pub fn preprocess_image(bytes: &[u8], options: &PreprocessOptions) -> Result<PreprocessedImage, SnapError> {
    let img = image::load_from_memory(bytes).map_err(|e| SnapError::ImageDecode(e.to_string()))?;

    let (width, height) = img.dimensions();
    let (target_w, target_h) = target_dimensions(width, height, options.max_dimension.max(1));
    let img = if (target_w, target_h) == (width, height) {
        img
    } else {
        img.resize_exact(target_w, target_h, FilterType::Triangle)
    };

    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, options.quality.clamp(1, 100));
        encoder
            .encode_image(&rgb)
            .context("Failed to encode preprocessed image as JPEG")?;
    }

    Ok(PreprocessedImage {
        data: Bytes::from(out.into_inner()),
        mime_type: OUTPUT_MIME,
        width: rgb.width(),
        height: rgb.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([200, 120, 40, 255]),
        ));
        let img = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
        image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .unwrap()
            .dimensions()
    }

    #[test]
    fn target_dimensions_scale_longer_side_to_limit() {
        assert_eq!(target_dimensions(1000, 500, 400), (400, 200));
        assert_eq!(target_dimensions(500, 1000, 400), (200, 400));
        assert_eq!(target_dimensions(4032, 3024, 400), (400, 300));
        assert_eq!(target_dimensions(1001, 3, 400), (400, 1));
    }

    #[test]
    fn target_dimensions_leave_small_images_alone() {
        assert_eq!(target_dimensions(400, 400, 400), (400, 400));
        assert_eq!(target_dimensions(120, 80, 400), (120, 80));
    }

    #[test]
    fn target_dimensions_preserve_aspect_ratio() {
        for (w, h) in [(1920, 1080), (3000, 2000), (777, 1234), (401, 399), (5000, 17)] {
            let (tw, th) = target_dimensions(w, h, 400);
            assert!(tw.max(th) <= 400);
            let scale = 400.0 / w.max(h) as f64;
            assert!((tw as f64 - w as f64 * scale).abs() <= 0.5 + 1e-9, "{w}x{h} -> {tw}x{th}");
            assert!((th as f64 - h as f64 * scale).abs() <= 0.5 + 1e-9, "{w}x{h} -> {tw}x{th}");
        }
    }

    #[test]
    fn large_png_is_downscaled_to_jpeg() {
        let processed = preprocess_image(&encoded(1200, 900, ImageFormat::Png), &PreprocessOptions::default()).unwrap();
        assert_eq!(processed.mime_type, "image/jpeg");
        assert_eq!((processed.width, processed.height), (400, 300));
        assert_eq!(decoded_dimensions(&processed.data), (400, 300));
    }

    #[test]
    fn small_image_keeps_dimensions() {
        let processed = preprocess_image(&encoded(320, 240, ImageFormat::Jpeg), &PreprocessOptions::default()).unwrap();
        assert_eq!(decoded_dimensions(&processed.data), (320, 240));
    }

    #[test]
    fn custom_limit_is_honored() {
        let options = PreprocessOptions { max_dimension: 100, quality: 60 };
        let processed = preprocess_image(&encoded(300, 600, ImageFormat::Png), &options).unwrap();
        assert_eq!((processed.width, processed.height), (50, 100));
    }

    #[test]
    fn undecodable_input_fails() {
        let err = preprocess_image(b"definitely not an image", &PreprocessOptions::default()).unwrap_err();
        assert!(matches!(err, SnapError::ImageDecode(_)));
    }

    #[test]
    fn data_url_carries_jpeg_mime() {
        let processed = preprocess_image(&encoded(10, 10, ImageFormat::Png), &PreprocessOptions::default()).unwrap();
        assert!(processed.to_data_url().starts_with("data:image/jpeg;base64,"));
    }
}
