//! Gemini `generateContent` client.
//!
//! Serves both collaborators: statement extraction (PDF in, JSON text out) and
//! per-category trend comments (prompt in, one sentence out).

use async_trait::async_trait;
use base64::Engine;
use insight_report::{CommentError, DataPoint, TrendCommenter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::prompt::{response_schema, trend_prompt, EXTRACTION_INSTRUCTIONS};
use crate::provider::{ExtractionProvider, ProviderError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key: None,
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Builds a client from config; `GEMINI_API_KEY` wins over the file.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, ProviderError> {
        let api_key = resolve_api_key(std::env::var("GEMINI_API_KEY").ok(), config)?;
        Ok(Self::new(&config.base_url, &config.model, &api_key))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = response.json().await?;
        let text = body.text();
        debug!(model = %self.model, chars = text.len(), "Gemini response");
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}

fn resolve_api_key(from_env: Option<String>, config: &GeminiConfig) -> Result<String, ProviderError> {
    from_env
        .into_iter()
        .chain(config.api_key.clone())
        .find(|k| !k.trim().is_empty())
        .ok_or(ProviderError::MissingApiKey)
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}

fn extraction_request(pdf: &[u8]) -> GenerateRequest {
    let encoded = base64::engine::general_purpose::STANDARD.encode(pdf);
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: "application/pdf".to_string(),
                        data: encoded,
                    },
                },
                Part::Text {
                    text: EXTRACTION_INSTRUCTIONS.to_string(),
                },
            ],
        }],
        generation_config: Some(GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(),
        }),
    }
}

fn text_request(prompt: String) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![Part::Text { text: prompt }],
        }],
        generation_config: None,
    }
}

#[async_trait]
impl ExtractionProvider for GeminiClient {
    async fn extract(&self, pdf: &[u8]) -> Result<String, ProviderError> {
        self.generate(&extraction_request(pdf)).await
    }
}

#[async_trait]
impl TrendCommenter for GeminiClient {
    /// An empty reply is not a failure here: the caller substitutes its
    /// "no analysis" text for it.
    async fn comment(&self, label: &str, points: &[DataPoint]) -> Result<String, CommentError> {
        match self.generate(&text_request(trend_prompt(label, points))).await {
            Ok(text) => Ok(text),
            Err(ProviderError::EmptyResponse) => Ok(String::new()),
            Err(e) => Err(CommentError::Provider(e.to_string())),
        }
    }
}
