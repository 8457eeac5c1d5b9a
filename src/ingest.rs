//! Batch ingestion pipeline.
//!
//! Turns raw (question, answer) rows into embedded, persisted records.
//! Validation happens up front: a row missing either field aborts the whole
//! batch before any embedding work begins. What gets embedded is the
//! concatenation `"{question} {answer}"` (trimmed), not the fields
//! separately; question+answer context is what makes retrieval relevant, so
//! the concatenation must be preserved. All embeddings are computed before a
//! store connection is acquired, and the whole batch commits in one
//! transaction.

use crate::embedding::{Embedder, EmbeddingError};
use crate::store::{NewQaRecord, StoreError, VectorStore};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The batch is malformed; the caller must correct and resubmit.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),
}

/// One raw row as submitted by the caller. Fields are optional so that a
/// missing column is a validation error, not a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// A validated, trimmed question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    /// The text that gets embedded for this pair.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.question, self.answer)
    }
}

/// Validate a raw batch into usable pairs.
///
/// A row with a missing `question` or `answer` field aborts the entire batch.
/// Rows whose fields are present but empty after trimming are skipped with a
/// warning; a batch that validates to zero usable pairs is rejected.
pub fn validate_rows(rows: &[RawRow]) -> Result<Vec<QaPair>, IngestError> {
    if rows.is_empty() {
        return Err(IngestError::InvalidInput("batch contains no rows".into()));
    }

    let mut pairs = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let question = row.question.as_deref().ok_or_else(|| {
            IngestError::InvalidInput(format!("row {idx} is missing the 'question' field"))
        })?;
        let answer = row.answer.as_deref().ok_or_else(|| {
            IngestError::InvalidInput(format!("row {idx} is missing the 'answer' field"))
        })?;

        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() || answer.is_empty() {
            tracing::warn!(row = idx, "skipping row with empty question or answer");
            continue;
        }

        pairs.push(QaPair {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }

    if pairs.is_empty() {
        return Err(IngestError::InvalidInput(
            "no usable rows after validation".into(),
        ));
    }
    Ok(pairs)
}

/// Embeds validated pairs and persists them through the store gateway.
///
/// Dependencies are injected at construction so tests can substitute both
/// the provider and the store.
pub struct IngestPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl IngestPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed and persist one validated batch. Returns the number of rows
    /// committed. On any error zero rows are committed.
    pub async fn run(&self, pairs: &[QaPair]) -> Result<usize, IngestError> {
        let texts: Vec<String> = pairs.iter().map(QaPair::embedding_text).collect();

        // Vector computation is the expensive step; do all of it before the
        // store pool is touched so slow inference cannot starve connections.
        let vectors = self.embedder.encode_batch(&texts).await?;

        let expected = self.embedder.dimension();
        for vector in &vectors {
            if vector.len() != expected {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                }
                .into());
            }
        }

        let records: Vec<NewQaRecord> = pairs
            .iter()
            .zip(vectors)
            .map(|(pair, embedding)| NewQaRecord {
                question: pair.question.clone(),
                answer: pair.answer.clone(),
                embedding,
            })
            .collect();

        self.store.insert_batch(&records).await?;
        metrics::counter!("semqa_records_ingested_total").increment(records.len() as u64);
        Ok(records.len())
    }
}
