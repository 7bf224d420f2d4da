//! Startup orchestration.
//!
//! # Responsibilities
//! - Select the active store from configuration
//! - Start the query cache flusher when the store is cache-fronted
//! - Build each writer and give it its own pool
//!
//! # Design Decisions
//! - Fail fast: an unusable store or client aborts startup
//! - A disabled store only removes the time-series writer

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{ConfigError, IngestConfig};
use crate::observability::IngestMetrics;
use crate::store::{build_store, StoreError};
use crate::transform::{TagRules, Translator};
use crate::writer::{AppMetricsWriter, Ingestor, MarkWriter, TimeSeriesWriter, WritePool};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("app metrics client: {0}")]
    AppMetrics(#[from] reqwest::Error),
}

/// Compose the writer set. Must run inside a tokio runtime.
pub fn build_ingestor(config: &IngestConfig, metrics: Arc<IngestMetrics>) -> Result<Ingestor, StartupError> {
    let mut ingestor = Ingestor::new();

    match build_store(config, metrics.clone())? {
        Some(active) => {
            if let Some(cache) = &active.cache {
                let interval = Duration::from_millis(config.query_cache.flush_interval_ms);
                ingestor.add_flusher(cache.spawn_flusher(interval, config.query_cache.flush_batch));
            }
            let translator = Translator::new(TagRules::from_config(&config.tags));
            let writer = TimeSeriesWriter::new(
                translator,
                active.store,
                metrics.clone(),
                config.tags.result_size_warning,
            );
            let pool = WritePool::spawn("timeseries", &config.pools.timeseries, metrics.clone());
            ingestor.add_writer(Arc::new(writer), pool);
        }
        None => {
            tracing::warn!(
                backend = config.store.backend.name(),
                "Time-series writer not registered, store disabled"
            );
        }
    }

    let pool = WritePool::spawn("mark", &config.pools.mark, metrics.clone());
    ingestor.add_writer(Arc::new(MarkWriter::new(metrics.clone())), pool);

    if config.app_metrics.hosts.is_empty() {
        tracing::info!("App metrics push disabled, no hosts configured");
    } else {
        let writer = AppMetricsWriter::new(&config.app_metrics, metrics.clone())?;
        let pool = WritePool::spawn("app_metrics", &config.pools.app_metrics, metrics);
        ingestor.add_writer(Arc::new(writer), pool);
    }

    Ok(ingestor)
}
