//! Backend store abstraction.
//!
//! # Data Flow
//! ```text
//! GenericMetric batch
//!     → WritePayload (serialized write records + reference check id)
//!     → DataPointsStore::store
//!         → http.rs  (kairosdb / m3db: sharded fan-out, see shard.rs)
//!         → cache.rs (bounded FIFO, flushed to kairosdb in the background)
//! ```
//!
//! # Design Decisions
//! - Exactly one store is active; `build_store` picks it from config once
//! - Stores never retry; a failed destination is counted and skipped
//! - Each store owns its connection pool and concurrency limit

pub mod cache;
pub mod http;
pub mod shard;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{BackendKind, IngestConfig};
use crate::model::generic::{point_count, to_write_records};
use crate::model::GenericMetric;
use crate::observability::IngestMetrics;

pub use cache::{CacheFlusher, QueryCacheStore};
pub use http::HttpDataPointsStore;
pub use shard::ShardGroups;

/// Errors raised by store construction or a whole write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid endpoint url '{0}'")]
    InvalidUrl(String),

    #[error("no destinations configured")]
    NoDestinations,

    #[error("connection limiter closed")]
    LimiterClosed,
}

/// Serialized write destined for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePayload {
    /// Check id that decides shard routing for the whole payload.
    pub reference_check_id: i64,
    /// JSON array of write records.
    pub body: String,
    pub point_count: usize,
}

impl WritePayload {
    pub fn from_metrics(reference_check_id: i64, metrics: &[GenericMetric]) -> Result<Self, StoreError> {
        let body = serde_json::to_string(&to_write_records(metrics))?;
        Ok(Self {
            reference_check_id,
            body,
            point_count: point_count(metrics),
        })
    }
}

/// Outcome of a write across all destinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

impl Delivery {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// A backend that accepts serialized data point writes.
#[async_trait]
pub trait DataPointsStore: Send + Sync {
    /// Label for logs and metrics.
    fn name(&self) -> &'static str;

    /// Write the payload to every destination this store covers.
    ///
    /// Per-destination failures are reported in [`Delivery`]; `Err` means
    /// nothing could be attempted.
    async fn store(&self, payload: &WritePayload) -> Result<Delivery, StoreError>;
}

/// The store selected at startup.
pub struct ActiveStore {
    pub store: Arc<dyn DataPointsStore>,
    /// Set when the store is cache-fronted; its flusher must be started.
    pub cache: Option<Arc<QueryCacheStore>>,
}

/// Build the configured store.
///
/// Returns `None` when the selected backend is disabled.
pub fn build_store(
    config: &IngestConfig,
    metrics: Arc<IngestMetrics>,
) -> Result<Option<ActiveStore>, StoreError> {
    let kind = config.store.backend;
    let mut cache = None;
    let store: Arc<dyn DataPointsStore> = match kind {
        BackendKind::KairosDb if config.kairosdb.enabled => Arc::new(HttpDataPointsStore::new(
            kind,
            &config.kairosdb,
            &config.observability,
            metrics,
        )?),
        BackendKind::M3Db if config.m3db.enabled => Arc::new(HttpDataPointsStore::new(
            kind,
            &config.m3db,
            &config.observability,
            metrics,
        )?),
        BackendKind::QueryCache if config.query_cache.enabled => {
            let backing = Arc::new(HttpDataPointsStore::new(
                BackendKind::KairosDb,
                &config.kairosdb,
                &config.observability,
                metrics.clone(),
            )?);
            let store = Arc::new(QueryCacheStore::new(config.query_cache.capacity, backing, metrics));
            cache = Some(store.clone());
            store
        }
        _ => {
            tracing::info!(backend = kind.name(), "Selected store is disabled");
            return Ok(None);
        }
    };

    tracing::info!(backend = store.name(), "Data points store selected");
    Ok(Some(ActiveStore { store, cache }))
}
