use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider returned no text")]
    EmptyResponse,
    #[error("No API key configured: set GEMINI_API_KEY or provider.api_key")]
    MissingApiKey,
    #[error("Provider error: {0}")]
    Other(String),
}

/// Abstraction over the document extraction service.
/// Implementations accept raw PDF bytes and return the provider's text
/// response, expected to be a JSON array of transaction rows.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    async fn extract(&self, pdf: &[u8]) -> Result<String, ProviderError>;
}

// ── Mock provider (always available, used for tests) ─────────────────────────

/// Returns pre-set responses without any network access. Responses can be
/// keyed on the exact PDF bytes; anything else gets the default.
pub struct MockProvider {
    default: Result<String, String>,
    by_content: Vec<(Vec<u8>, Result<String, String>)>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            default: Ok(text.into()),
            by_content: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            default: Err(message.into()),
            ..Self::new("")
        }
    }

    pub fn with_response(mut self, pdf: &[u8], text: impl Into<String>) -> Self {
        self.by_content.push((pdf.to_vec(), Ok(text.into())));
        self
    }

    pub fn with_failure(mut self, pdf: &[u8], message: impl Into<String>) -> Self {
        self.by_content.push((pdf.to_vec(), Err(message.into())));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionProvider for MockProvider {
    async fn extract(&self, pdf: &[u8]) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .by_content
            .iter()
            .find(|(content, _)| content.as_slice() == pdf)
            .map(|(_, response)| response)
            .unwrap_or(&self.default);
        response.clone().map_err(ProviderError::Other)
    }
}
