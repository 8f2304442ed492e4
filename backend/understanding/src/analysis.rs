//! Analysis client: free-text questions over the purchase history.

use pricesnap_core::{InferenceProvider, ProductRecord, SnapError};
use tracing::{info, warn};

/// Ask a question about `history`.
///
/// Returns `Ok(None)` without contacting the provider when the query is blank.
pub async fn analyze_history(
    provider: &dyn InferenceProvider,
    query: &str,
    history: &[ProductRecord],
) -> Result<Option<String>, SnapError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(None);
    }

    info!(provider = provider.name(), records = history.len(), "Analyzing purchase history");
    match provider.analyze(query, history).await {
        Ok(answer) => Ok(Some(answer)),
        Err(e) => {
            warn!(provider = provider.name(), error = %format!("{e:#}"), "Analysis failed");
            Err(SnapError::inference(provider.name(), &e))
        }
    }
}
