//! Embedding provider contract.
//!
//! The vector store only ever talks to [`EmbeddingProvider`]; network calls,
//! batching limits, and timeouts live behind it. Two providers ship here: an
//! OpenAI-compatible HTTP client and a deterministic offline hasher.

mod hashing;
mod openai;

pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbeddings;

use async_trait::async_trait;
use core_types::Vector;
use core_types::config::{EmbeddingConfig, ProviderKind};
use std::sync::Arc;
use thiserror::Error;

/// Failures surfaced by embedding providers. A batch either yields one
/// vector per input or fails as a whole.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("embedding API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed embedding response: {0}")]
    Decode(String),
    #[error("provider returned {got} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
    #[error("no embedding provider configured")]
    NotConfigured,
    #[error("embedding provider error: {0}")]
    Provider(String),
}

/// Converts text into fixed-width vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vector, EmbeddingError>;

    /// Embed `texts`, returning vectors in input order.
    ///
    /// The default issues one `embed` call per text; providers with a native
    /// batch endpoint should override it to save round trips.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Build the provider selected by configuration.
pub fn provider_from_config(
    cfg: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    match cfg.resolved_provider() {
        ProviderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(cfg.dimension))),
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiEmbeddings::from_config(cfg)?)),
    }
}
