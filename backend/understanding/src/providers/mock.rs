use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use pricesnap_core::{InferenceProvider, OcrResult, ProductRecord};

/// A provider that returns canned replies and counts calls.
pub struct MockProvider {
    name: String,
    ocr: Option<OcrResult>,
    answer: Option<String>,
    failure: Option<String>,
    extract_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
    last_history_len: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ocr: None,
            answer: None,
            failure: None,
            extract_calls: AtomicUsize::new(0),
            analyze_calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
            last_history_len: AtomicUsize::new(0),
        }
    }

    pub fn with_ocr(mut self, product_name: impl Into<String>, price: f64) -> Self {
        self.ocr = Some(OcrResult {
            product_name: product_name.into(),
            price,
        });
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    /// Make every call fail with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().ok().and_then(|q| q.clone())
    }

    pub fn last_history_len(&self) -> usize {
        self.last_history_len.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, _image_bytes: &[u8], _mime_type: &str) -> Result<OcrResult> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        self.ocr.clone().ok_or_else(|| anyhow!("no canned OCR result"))
    }

    async fn analyze(&self, query: &str, history: &[ProductRecord]) -> Result<String> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_query.lock() {
            *last = Some(query.to_string());
        }
        self.last_history_len.store(history.len(), Ordering::SeqCst);
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        Ok(self.answer.clone().unwrap_or_else(|| "Mock answer".to_string()))
    }
}
