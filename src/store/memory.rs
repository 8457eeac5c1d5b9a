use crate::store::{NewQaRecord, ScoredRecord, StoreError, VectorStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

/// In-process store with the same contract as the Postgres gateway.
///
/// Enforces the dimensionality invariant on insert, inserts batches under a
/// single write lock (all rows visible or none), and ranks by cosine
/// distance with ties broken by id so a query is deterministic for a fixed
/// store state.
pub struct MemoryStore {
    dimension: usize,
    rows: RwLock<Vec<StoredRow>>,
    next_id: AtomicI64,
}

struct StoredRow {
    id: i64,
    question: String,
    answer: String,
    embedding: Vec<f32>,
}

impl MemoryStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of persisted records.
    pub fn len(&self) -> usize {
        self.rows.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine distance between two equal-length vectors. Degenerate (zero-norm)
/// vectors are treated as maximally distant.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0f64;
    let mut norm_a = 0f64;
    let mut norm_b = 0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_batch(&self, records: &[NewQaRecord]) -> Result<(), StoreError> {
        // Validate the whole batch before touching shared state so a bad
        // record leaves zero rows visible.
        for record in records {
            if record.embedding.len() != self.dimension {
                return Err(StoreError::Persistence(format!(
                    "embedding dimension {} does not match column dimension {}",
                    record.embedding.len(),
                    self.dimension
                )));
            }
        }

        let mut rows = self.rows.write().expect("store lock poisoned");
        for record in records {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            rows.push(StoredRow {
                id,
                question: record.question.clone(),
                answer: record.answer.clone(),
                embedding: record.embedding.clone(),
            });
        }
        Ok(())
    }

    async fn nearest_neighbors(
        &self,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let rows = self.rows.read().expect("store lock poisoned");
        let mut scored: Vec<ScoredRecord> = rows
            .iter()
            .map(|row| ScoredRecord {
                id: row.id,
                question: row.question.clone(),
                answer: row.answer.clone(),
                distance: cosine_distance(&row.embedding, query_vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str, answer: &str, embedding: Vec<f32>) -> NewQaRecord {
        NewQaRecord {
            question: question.into(),
            answer: answer.into(),
            embedding,
        }
    }

    #[tokio::test]
    async fn empty_store_returns_empty_vec() {
        let store = MemoryStore::new(3);
        let hits = store.nearest_neighbors(&[1.0, 0.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn results_ordered_by_non_decreasing_distance() {
        let store = MemoryStore::new(2);
        store
            .insert_batch(&[
                record("far", "far", vec![0.0, 1.0]),
                record("near", "near", vec![1.0, 0.0]),
                record("mid", "mid", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store.nearest_neighbors(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].question, "near");
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[tokio::test]
    async fn k_larger_than_store_returns_all_rows() {
        let store = MemoryStore::new(2);
        store
            .insert_batch(&[
                record("a", "a", vec![1.0, 0.0]),
                record("b", "b", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store.nearest_neighbors(&[1.0, 1.0], 100).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn bad_dimension_leaves_zero_rows_visible() {
        let store = MemoryStore::new(3);
        let result = store
            .insert_batch(&[
                record("ok", "ok", vec![1.0, 0.0, 0.0]),
                record("bad", "bad", vec![1.0, 0.0]),
            ])
            .await;

        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn ids_are_assigned_and_stable() {
        let store = MemoryStore::new(1);
        store
            .insert_batch(&[record("a", "a", vec![1.0]), record("b", "b", vec![0.5])])
            .await
            .unwrap();

        let hits = store.nearest_neighbors(&[1.0], 2).await.unwrap();
        let mut ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn duplicate_pairs_create_distinct_records() {
        let store = MemoryStore::new(1);
        let rec = record("same", "same", vec![1.0]);
        store.insert_batch(&[rec.clone()]).await.unwrap();
        store.insert_batch(&[rec]).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn cosine_distance_identical_vectors_is_zero() {
        let d = cosine_distance(&[0.3, 0.7], &[0.3, 0.7]);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn cosine_distance_orthogonal_vectors_is_one() {
        let d = cosine_distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_distance_zero_vector_is_max() {
        let d = cosine_distance(&[0.0, 0.0], &[1.0, 0.0]);
        assert_eq!(d, 1.0);
    }
}
