//! Vector store gateway.
//!
//! Sole owner of persisted records. Exposes three primitives: idempotent
//! schema initialization, transactional batch insert, and a ranked
//! nearest-neighbor query. Backed by PostgreSQL + pgvector in production and
//! by [`MemoryStore`] in tests and `store.backend = "memory"` deployments.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgVectorStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the store gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No pooled connection within the bounded wait, or connectivity lost.
    /// Retryable by the caller.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store rejected the transaction (constraint or IO). Zero rows were
    /// committed; not retryable without fixing the input.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// A record prepared for insertion: text pair plus its computed embedding.
#[derive(Debug, Clone)]
pub struct NewQaRecord {
    pub question: String,
    pub answer: String,
    pub embedding: Vec<f32>,
}

/// A retrieval hit: stored record plus its distance to the query vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub distance: f64,
}

/// Persistent vector store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotently ensure the record table and its vector column exist.
    /// Safe under concurrent startup of multiple instances.
    async fn init_schema(&self) -> Result<(), StoreError>;

    /// Persist all records as one atomic unit: all rows become visible or
    /// none do.
    async fn insert_batch(&self, records: &[NewQaRecord]) -> Result<(), StoreError>;

    /// Up to `k` records ordered by ascending cosine distance to
    /// `query_vector`. An empty store yields an empty vec, not an error.
    async fn nearest_neighbors(
        &self,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredRecord>, StoreError>;
}
