//! Extraction client: receipt image in, proposed name and price out.

use pricesnap_core::{InferenceProvider, OcrResult, SnapError};
use tracing::{info, warn};

/// Ask the provider for the product name and price on a preprocessed image.
///
/// One attempt. Any failure becomes a single `SnapError::Inference` message.
pub async fn extract_product(
    provider: &dyn InferenceProvider,
    image_bytes: &[u8],
    mime_type: &str,
) -> Result<OcrResult, SnapError> {
    if image_bytes.is_empty() {
        return Err(SnapError::ImageDecode("image is empty".into()));
    }

    info!(provider = provider.name(), bytes = image_bytes.len(), mime = mime_type, "Extracting product from image");
    match provider.extract(image_bytes, mime_type).await {
        Ok(ocr) => {
            info!(product = %ocr.product_name, price = ocr.price, "Extraction succeeded");
            Ok(ocr)
        }
        Err(e) => {
            warn!(provider = provider.name(), error = %format!("{e:#}"), "Extraction failed");
            Err(SnapError::inference(provider.name(), &e))
        }
    }
}
