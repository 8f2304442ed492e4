use thiserror::Error;

/// Top-level error type for PriceSnap.
///
/// Every variant renders as a single human-readable line so the caller can
/// show it to the user as-is.
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("could not read the image: {0}")]
    ImageDecode(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("{provider} request failed: {message}")]
    Inference { provider: String, message: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("a record with id {0} already exists")]
    DuplicateId(String),

    #[error("no record with id {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("location unavailable: {0}")]
    Geolocation(String),

    #[error("{0} is already in progress")]
    Busy(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SnapError {
    /// Wrap a provider failure, flattening the anyhow context chain into one line.
    pub fn inference(provider: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Inference {
            provider: provider.into(),
            message: format!("{err:#}"),
        }
    }
}
