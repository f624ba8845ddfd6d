pub mod gemini;
pub mod hash;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod session;

pub use gemini::{GeminiClient, GeminiConfig};
pub use hash::{sha256_bytes, to_hex};
pub use pipeline::{spawn_intake_watcher, PipelineError, StatementPipeline};
pub use provider::{ExtractionProvider, MockProvider, ProviderError};
pub use session::{PendingId, Session};
