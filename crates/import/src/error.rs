use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Provider response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Provider response is not a JSON array of transactions")]
    NotAnArray,
    #[error("Record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
    #[error("Failed to parse rule table: {0}")]
    RuleTable(#[from] toml::de::Error),
    #[error("Invalid keyword in rule '{tag}': {source}")]
    Keyword {
        tag: String,
        #[source]
        source: regex::Error,
    },
}
