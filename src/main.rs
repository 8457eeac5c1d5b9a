use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use semqa::config::AppConfig;
use semqa::embedding::build_embedder;
use semqa::ingest::IngestPipeline;
use semqa::jobs::JobQueue;
use semqa::search::SearchService;
use semqa::server::{start_server, AppState};
use semqa::store::{MemoryStore, PgVectorStore, VectorStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(&config.server.log_level)
        .with_target(false)
        .json()
        .init();

    if config.server.auth_username.is_empty() || config.server.auth_password.is_empty() {
        anyhow::bail!(
            "auth credentials missing: set SEMQA_SERVER__AUTH_USERNAME and SEMQA_SERVER__AUTH_PASSWORD"
        );
    }

    let embedder = build_embedder(&config.embedding).context("constructing embedding provider")?;

    let store: Arc<dyn VectorStore> = match config.store.backend.as_str() {
        "postgres" => Arc::new(
            PgVectorStore::connect(&config.store, config.embedding.dimension)
                .await
                .context("connecting to the vector store")?,
        ),
        "memory" => {
            tracing::warn!("using in-memory store backend; records are not durable");
            Arc::new(MemoryStore::new(config.embedding.dimension))
        }
        other => anyhow::bail!("unknown store backend '{other}', expected 'postgres' or 'memory'"),
    };
    store.init_schema().await.context("initializing schema")?;

    let metrics = if config.server.metrics_enabled {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("installing metrics recorder")?,
        )
    } else {
        None
    };

    let pipeline = Arc::new(IngestPipeline::new(embedder.clone(), store.clone()));
    let jobs = JobQueue::start(
        pipeline,
        config.ingest.queue_capacity,
        config.ingest.workers,
    );
    let search = SearchService::new(embedder, store);

    let state = AppState::new(config, jobs, search, metrics);
    start_server(state).await
}
