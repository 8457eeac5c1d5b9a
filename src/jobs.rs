//! Background ingestion jobs.
//!
//! The request that triggers ingestion must not block on embedding work, but
//! a pure fire-and-forget thread leaves no way to observe late failures. So
//! submissions go onto a bounded queue, a fixed pool of worker tasks drains
//! it, and each job's lifecycle (pending, running, succeeded, failed) lives
//! in a registry the caller can poll by the job id returned at hand-off.
//! Once a worker picks a job up it runs to completion or failure; there is
//! no cancellation.

use crate::ingest::{validate_rows, IngestPipeline, QaPair, RawRow};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Errors surfaced at job submission time.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The batch failed validation; nothing was queued.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The job queue is full; retry later.
    #[error("ingest queue is full")]
    QueueFull,
}

/// Lifecycle of one ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Pollable record of one ingestion job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub state: JobState,
    /// Validated rows queued for this job.
    pub rows: usize,
    /// Rows committed to the store; zero until the job succeeds.
    pub inserted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

struct QueuedJob {
    id: Uuid,
    pairs: Vec<QaPair>,
}

/// Handle for submitting ingestion jobs and polling their status.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    registry: Arc<DashMap<Uuid, JobRecord>>,
}

impl JobQueue {
    /// Spawn `workers` tasks draining a queue of `capacity` and return the
    /// submission handle.
    pub fn start(pipeline: Arc<IngestPipeline>, capacity: usize, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel::<QueuedJob>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let registry: Arc<DashMap<Uuid, JobRecord>> = Arc::new(DashMap::new());

        for worker in 0..workers.max(1) {
            let rx = rx.clone();
            let registry = registry.clone();
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                loop {
                    // Hold the receiver lock only for the dequeue itself.
                    let job = { rx.lock().await.recv().await };
                    let Some(job) = job else {
                        tracing::debug!(worker, "ingest queue closed, worker exiting");
                        break;
                    };
                    run_job(&pipeline, &registry, job).await;
                }
            });
        }

        Self { tx, registry }
    }

    /// Validate a raw batch and hand it off for background processing.
    ///
    /// Returns immediately with the job id on success. Validation failures
    /// are synchronous; everything after hand-off is observable only through
    /// the job record and logs.
    pub fn submit(&self, rows: &[RawRow]) -> Result<JobRecord, SubmitError> {
        let pairs = match validate_rows(rows) {
            Ok(pairs) => pairs,
            Err(err) => return Err(SubmitError::InvalidInput(err.to_string())),
        };

        let record = JobRecord {
            id: Uuid::new_v4(),
            state: JobState::Pending,
            rows: pairs.len(),
            inserted: 0,
            error: None,
            submitted_at: Utc::now(),
            finished_at: None,
        };

        let job = QueuedJob {
            id: record.id,
            pairs,
        };

        // The record must be visible before a worker can dequeue the job;
        // run_job's state transitions are lost on a missing entry.
        self.registry.insert(record.id, record.clone());
        match self.tx.try_send(job) {
            Ok(()) => {
                metrics::counter!("semqa_ingest_jobs_total", "outcome" => "accepted").increment(1);
                Ok(record)
            }
            Err(_) => {
                self.registry.remove(&record.id);
                metrics::counter!("semqa_ingest_jobs_total", "outcome" => "refused").increment(1);
                Err(SubmitError::QueueFull)
            }
        }
    }

    /// Look up a job by id.
    pub fn status(&self, id: Uuid) -> Option<JobRecord> {
        self.registry.get(&id).map(|entry| entry.clone())
    }
}

async fn run_job(
    pipeline: &IngestPipeline,
    registry: &DashMap<Uuid, JobRecord>,
    job: QueuedJob,
) {
    if let Some(mut entry) = registry.get_mut(&job.id) {
        entry.state = JobState::Running;
    }

    match pipeline.run(&job.pairs).await {
        Ok(inserted) => {
            tracing::info!(job_id = %job.id, rows = inserted, "ingestion job succeeded");
            metrics::counter!("semqa_ingest_jobs_total", "outcome" => "succeeded").increment(1);
            if let Some(mut entry) = registry.get_mut(&job.id) {
                entry.state = JobState::Succeeded;
                entry.inserted = inserted;
                entry.finished_at = Some(Utc::now());
            }
        }
        Err(err) => {
            // The submitting request has long since returned; the record and
            // this log line are the only places the failure surfaces.
            tracing::error!(job_id = %job.id, error = %err, "ingestion job failed");
            metrics::counter!("semqa_ingest_jobs_total", "outcome" => "failed").increment(1);
            if let Some(mut entry) = registry.get_mut(&job.id) {
                entry.state = JobState::Failed;
                entry.error = Some(err.to_string());
                entry.finished_at = Some(Utc::now());
            }
        }
    }
}
