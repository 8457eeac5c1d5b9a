use crate::embedding::{l2_normalize_in_place, Embedder, EmbeddingError};
use async_trait::async_trait;
use fxhash::hash64;

/// Deterministic stand-in for the real model.
///
/// Generates sinusoid values derived from a hash of the input text, so the
/// same text always maps to the same vector at minimal CPU cost. Used in
/// tests and in `embedding.mode = "stub"` deployments where no inference
/// endpoint is available.
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = vec![0f32; self.dimension];
        let h = hash64(text.as_bytes());
        for (idx, value) in v.iter_mut().enumerate() {
            *value = ((h.rotate_left((idx % 64) as u32) as f32) * 0.0001).sin();
        }
        l2_normalize_in_place(&mut v);
        Ok(v)
    }
}
