pub mod error;
pub mod traits;
pub mod types;

pub use error::SnapError;
pub use traits::{FixedLocation, InferenceProvider, LocationSource, NoLocation};
pub use types::{GeoPosition, OcrResult, ProductRecord, RecordDraft};
