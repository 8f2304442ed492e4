//! Image intake for the add-record flow: read, sniff, downscale, re-encode.

use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use pricesnap_core::SnapError;
use tracing::{debug, info};

pub mod data_url;
pub mod preprocess;
pub mod mime_detect;

pub use data_url::{encode_data_url, parse_data_url};
pub use preprocess::{
    preprocess_image, target_dimensions, PreprocessOptions, PreprocessedImage,
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION,
};
pub use mime_detect::{detect_mime_type, is_image, sniff_mime_type};

/// A raw image selected by the user, before preprocessing.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub source: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl ImagePayload {
    /// Read one image file. Content sniffing wins over the file extension.
    pub async fn from_path(path: &Path) -> Result<Self, SnapError> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image file: {}", path.display()))?;

        let mime_type = sniff_mime_type(&data).unwrap_or_else(|| detect_mime_type(path));
        if !is_image(mime_type) {
            return Err(SnapError::UnsupportedMedia(format!(
                "{} ({})",
                path.display(),
                mime_type
            )));
        }

        debug!(path = %path.display(), mime = mime_type, bytes = data.len(), "Loaded image");
        Ok(Self {
            source: path.display().to_string(),
            mime_type: mime_type.to_string(),
            data: Bytes::from(data),
        })
    }

    /// Downscale and re-encode off the async thread.
    pub async fn preprocess(&self, options: PreprocessOptions) -> Result<PreprocessedImage, SnapError> {
        let data = self.data.clone();
        let processed = tokio::task::spawn_blocking(move || preprocess_image(&data, &options))
            .await
            .context("Image preprocessing task panicked")??;

        info!(
            source = %self.source,
            input_bytes = self.data.len(),
            output_bytes = processed.data.len(),
            width = processed.width,
            height = processed.height,
            "Preprocessed image"
        );
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn reads_and_preprocesses_file() {
        let dir = std::env::temp_dir().join(format!("pricesnap-media-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        // Extension lies; the content is PNG.
        let path = dir.join("receipt.jpg");
        std::fs::write(&path, png_bytes(800, 600)).unwrap();

        let payload = ImagePayload::from_path(&path).await.unwrap();
        assert_eq!(payload.mime_type, "image/png");

        let processed = payload.preprocess(PreprocessOptions::default()).await.unwrap();
        assert_eq!((processed.width, processed.height), (400, 300));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn rejects_non_image_files() {
        let dir = std::env::temp_dir().join(format!("pricesnap-media-txt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("notes.txt");
        std::fs::write(&path, b"milk 2.50").unwrap();

        let err = ImagePayload::from_path(&path).await.unwrap_err();
        assert!(matches!(err, SnapError::UnsupportedMedia(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = ImagePayload::from_path(Path::new("/nonexistent/receipt.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapError::Other(_)));
    }
}
