//! semqa — semantic question/answer retrieval service.
//!
//! Stores question/answer pairs with 768-dimension embeddings in a
//! pgvector-backed table and retrieves the nearest stored pairs for a query
//! string by cosine distance. Ingestion runs as background jobs pollable by
//! id; search is synchronous.
//!
//! The pipeline: raw rows → validation → embedding of the
//! `"{question} {answer}"` concatenation → one transactional batch insert.
//! Query path: query text → embedding → ranked `<=>` lookup → results in
//! ascending distance order.

pub mod config;
pub mod embedding;
pub mod ingest;
pub mod jobs;
pub mod search;
pub mod server;
pub mod store;

pub use config::AppConfig;
pub use embedding::{build_embedder, ApiEmbedder, Embedder, EmbeddingError, StubEmbedder};
pub use ingest::{validate_rows, IngestError, IngestPipeline, QaPair, RawRow};
pub use jobs::{JobQueue, JobRecord, JobState, SubmitError};
pub use search::{SearchError, SearchOutcome, SearchService, DEFAULT_K};
pub use store::{MemoryStore, NewQaRecord, PgVectorStore, ScoredRecord, StoreError, VectorStore};
