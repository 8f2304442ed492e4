pub mod gemini;
pub mod mock;
pub mod openai;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use pricesnap_core::InferenceProvider;
use reqwest::Client;

use self::gemini::GeminiProvider;
use self::openai::OpenAiProvider;

/// Which inference backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            other => bail!("unknown inference provider: {other}"),
        }
    }
}

/// Everything needed to build a provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

/// Build the configured provider.
pub fn create_provider(settings: &ProviderSettings) -> Result<Arc<dyn InferenceProvider>> {
    if settings.api_key.trim().is_empty() {
        bail!("no API key configured for {:?}", settings.kind);
    }
    let client = Client::builder()
        .timeout(settings.timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let provider: Arc<dyn InferenceProvider> = match settings.kind {
        ProviderKind::Gemini => {
            let mut p = GeminiProvider::new(&settings.api_key).with_client(client);
            if let Some(model) = &settings.model {
                p = p.with_model(model);
            }
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderKind::OpenAi => {
            let mut p = OpenAiProvider::new(&settings.api_key).with_client(client);
            if let Some(model) = &settings.model {
                p = p.with_model(model);
            }
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
    };
    Ok(provider)
}
