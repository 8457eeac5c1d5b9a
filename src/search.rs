//! Nearest-neighbor retrieval.
//!
//! Embeds the query text and asks the store gateway for the `k` closest
//! records. An empty store is a normal outcome, distinct from failure, so
//! the boundary layer can choose its own user-facing status for it.

use crate::embedding::{Embedder, EmbeddingError};
use crate::store::{ScoredRecord, StoreError, VectorStore};
use std::sync::Arc;
use thiserror::Error;

/// Default result bound when the caller does not supply one.
pub const DEFAULT_K: usize = 5;

/// Errors surfaced by [`SearchService::search`].
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query text was empty after trimming; caller must correct it.
    #[error("query text must not be empty")]
    InvalidQuery,

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),
}

/// Result of a successful search.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Records ordered by non-decreasing distance to the query.
    Hits(Vec<ScoredRecord>),
    /// The store holds no records. Empty-success, not a failure.
    Empty,
}

/// Retrieval service with injected provider and store.
pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl SearchService {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Return up to `k` records closest to `query`, ascending by distance.
    ///
    /// `k` is clamped to at least 1; callers that pass `None` get
    /// [`DEFAULT_K`].
    pub async fn search(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        let k = k.unwrap_or(DEFAULT_K).max(1);

        let query_vector = self.embedder.encode(query).await?;
        let hits = self.store.nearest_neighbors(&query_vector, k).await?;

        metrics::counter!("semqa_searches_total").increment(1);
        if hits.is_empty() {
            Ok(SearchOutcome::Empty)
        } else {
            Ok(SearchOutcome::Hits(hits))
        }
    }
}
