//! Embedding provider interface.
//!
//! The provider is a black box to the rest of the service: text in,
//! fixed-length f32 vector out. It is stateless, deterministic for a given
//! model version, and safe to call concurrently. It does no batching of its
//! own, so the ingestion pipeline batches calls itself via
//! [`Embedder::encode_batch`].

mod api;
mod stub;

pub use api::ApiEmbedder;
pub use stub::StubEmbedder;

use crate::config::EmbeddingConfig;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by an embedding provider.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Provider configuration is inconsistent (e.g. api mode without a URL).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
    /// The inference request failed or timed out.
    #[error("inference failure: {0}")]
    Inference(String),
    /// The provider returned a vector of the wrong length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Text-to-vector embedding provider.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this provider produces.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed a batch of texts, preserving input order.
    ///
    /// The default issues one `encode` per text; providers that support
    /// request-level batching override this.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.encode(text).await?);
        }
        Ok(out)
    }
}

/// Construct the embedder named by configuration.
pub fn build_embedder(cfg: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match cfg.mode.as_str() {
        "api" => Ok(Arc::new(ApiEmbedder::new(cfg)?)),
        "stub" => Ok(Arc::new(StubEmbedder::new(cfg.dimension))),
        other => Err(EmbeddingError::InvalidConfig(format!(
            "unknown embedding mode '{other}', expected 'api' or 'stub'"
        ))),
    }
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Check a returned vector against the expected dimensionality.
pub(crate) fn check_dimension(v: &[f32], expected: usize) -> Result<(), EmbeddingError> {
    if v.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: v.len(),
        });
    }
    Ok(())
}
