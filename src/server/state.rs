use crate::config::AppConfig;
use crate::jobs::JobQueue;
use crate::search::SearchService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state.
///
/// Everything a handler needs is constructed once at startup and injected
/// here; handlers hold no state of their own.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Ingestion job queue and status registry
    pub jobs: JobQueue,

    /// Retrieval service (query embedding + ranked store lookup)
    pub search: Arc<SearchService>,

    /// Prometheus recorder handle, present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        jobs: JobQueue,
        search: SearchService,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            jobs,
            search: Arc::new(search),
            metrics,
        }
    }
}
