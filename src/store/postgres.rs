use crate::config::StoreConfig;
use crate::store::{NewQaRecord, ScoredRecord, StoreError, VectorStore};
use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// PostgreSQL + pgvector store.
///
/// Holds a bounded connection pool shared by all callers; sqlx returns every
/// borrowed connection when its handle drops, on success and error paths
/// alike. Cosine distance is the pgvector `<=>` operator.
pub struct PgVectorStore {
    pool: PgPool,
    dimension: usize,
}

impl PgVectorStore {
    /// Connect with a bounded pool per configuration.
    pub async fn connect(cfg: &StoreConfig, dimension: usize) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(cfg.pool_min)
            .max_connections(cfg.pool_max)
            .acquire_timeout(cfg.acquire_timeout())
            .connect(&cfg.connection_url())
            .await
            .map_err(classify_sqlx_error)?;

        Ok(Self { pool, dimension })
    }
}

/// Sort sqlx failures into the retryable/non-retryable taxonomy.
fn classify_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(err.to_string())
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Configuration(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Persistence(other.to_string()),
    }
}

#[derive(sqlx::FromRow)]
struct ScoredRow {
    id: i64,
    question: String,
    answer: String,
    distance: f64,
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS qa_records (
                id BIGSERIAL PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                embedding vector({}) NOT NULL
            )",
            self.dimension
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        tracing::info!(dimension = self.dimension, "qa_records schema ready");
        Ok(())
    }

    async fn insert_batch(&self, records: &[NewQaRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(classify_sqlx_error)?;
        for record in records {
            sqlx::query(
                "INSERT INTO qa_records (question, answer, embedding) VALUES ($1, $2, $3)",
            )
            .bind(&record.question)
            .bind(&record.answer)
            .bind(Vector::from(record.embedding.clone()))
            .execute(&mut *tx)
            .await
            .map_err(classify_sqlx_error)?;
        }
        tx.commit().await.map_err(classify_sqlx_error)?;

        tracing::info!(rows = records.len(), "batch committed to qa_records");
        Ok(())
    }

    async fn nearest_neighbors(
        &self,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let rows: Vec<ScoredRow> = sqlx::query_as(
            "SELECT id, question, answer, (embedding <=> $1)::float8 AS distance
             FROM qa_records
             ORDER BY distance, id
             LIMIT $2",
        )
        .bind(Vector::from(query_vector.to_vec()))
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| ScoredRecord {
                id: row.id,
                question: row.question,
                answer: row.answer,
                distance: row.distance,
            })
            .collect())
    }
}
