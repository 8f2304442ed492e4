use anyhow::Result;
use async_trait::async_trait;

use crate::error::SnapError;
use crate::types::{GeoPosition, OcrResult, ProductRecord};

/// An external multimodal inference service.
///
/// Both calls are plain request/response: one attempt, no retry, no streaming.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Read a product name and price off a receipt or price tag image.
    async fn extract(&self, image_bytes: &[u8], mime_type: &str) -> Result<OcrResult>;

    /// Answer a free-text question about the purchase history.
    async fn analyze(&self, query: &str, history: &[ProductRecord]) -> Result<String>;
}

/// Source of a single geolocation sample.
pub trait LocationSource: Send + Sync {
    fn current_position(&self) -> Result<GeoPosition, SnapError>;
}

/// A location supplied up front (command-line flags or config).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoPosition);

impl LocationSource for FixedLocation {
    fn current_position(&self) -> Result<GeoPosition, SnapError> {
        Ok(self.0)
    }
}

/// The capability is not available on this host.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationSource for NoLocation {
    fn current_position(&self) -> Result<GeoPosition, SnapError> {
        Err(SnapError::Geolocation("geolocation is not supported here".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_location_yields_its_position() {
        let pos = GeoPosition::new(1.0, 2.0).unwrap();
        assert_eq!(FixedLocation(pos).current_position().unwrap(), pos);
    }

    #[test]
    fn no_location_is_unsupported() {
        assert!(matches!(NoLocation.current_position(), Err(SnapError::Geolocation(_))));
    }
}
