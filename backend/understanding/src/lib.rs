//! Extraction and analysis over an external multimodal inference service.

pub mod analysis;
pub mod extraction;
pub mod parse;
pub mod prompt;
pub mod providers;

pub use analysis::analyze_history;
pub use extraction::extract_product;
pub use parse::{parse_ocr_reply, parse_price};
pub use providers::gemini::GeminiProvider;
pub use providers::mock::MockProvider;
pub use providers::openai::OpenAiProvider;
pub use providers::{create_provider, ProviderKind, ProviderSettings};
