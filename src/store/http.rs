//! HTTP time-series store (kairosdb, m3db).
//!
//! # Responsibilities
//! - POST each payload to one endpoint in every shard group
//! - Bound concurrent requests per backend
//! - Count and optionally log each failed destination
//!
//! # Design Decisions
//! - Groups are written concurrently; one slow or dead group never blocks
//!   delivery to the others
//! - Non-2xx responses count as failures, same as transport errors

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::Semaphore;

use crate::config::{BackendKind, HttpBackendConfig, ObservabilityConfig};
use crate::observability::IngestMetrics;
use crate::store::{DataPointsStore, Delivery, ShardGroups, StoreError, WritePayload};

/// Sharded HTTP writer for one backend kind.
pub struct HttpDataPointsStore {
    name: &'static str,
    client: reqwest::Client,
    shards: ShardGroups,
    /// Caps in-flight requests to this backend.
    connection_limit: Arc<Semaphore>,
    metrics: Arc<IngestMetrics>,
    log_requests: bool,
    log_errors: bool,
}

impl HttpDataPointsStore {
    pub fn new(
        kind: BackendKind,
        config: &HttpBackendConfig,
        observability: &ObservabilityConfig,
        metrics: Arc<IngestMetrics>,
    ) -> Result<Self, StoreError> {
        let shards = ShardGroups::new(&config.write_urls, &config.write_path)?;
        if shards.is_empty() {
            return Err(StoreError::NoDestinations);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.timeout_ms))
            .timeout(request_timeout(config))
            .pool_max_idle_per_host(config.max_connections)
            .build()?;

        tracing::info!(
            backend = kind.name(),
            shard_groups = shards.len(),
            max_connections = config.max_connections,
            "HTTP store initialized"
        );

        Ok(Self {
            name: kind.name(),
            client,
            shards,
            connection_limit: Arc::new(Semaphore::new(config.max_connections.max(1))),
            metrics,
            log_requests: observability.log_write_requests,
            log_errors: observability.log_write_errors,
        })
    }

    async fn post(&self, url: &str, body: &str) -> Result<(), StoreError> {
        let _permit = self
            .connection_limit
            .acquire()
            .await
            .map_err(|_| StoreError::LimiterClosed)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Response budget is the socket timeout on top of connecting.
fn request_timeout(config: &HttpBackendConfig) -> Duration {
    Duration::from_millis(config.timeout_ms.saturating_add(config.socket_timeout_ms))
}

#[async_trait]
impl DataPointsStore for HttpDataPointsStore {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn store(&self, payload: &WritePayload) -> Result<Delivery, StoreError> {
        let targets = self.shards.targets(payload.reference_check_id);
        if targets.is_empty() {
            return Err(StoreError::NoDestinations);
        }

        if self.log_requests {
            tracing::info!(
                backend = self.name,
                check_id = payload.reference_check_id,
                body = %payload.body,
                "Write request"
            );
        }

        let started = Instant::now();
        let results = join_all(targets.iter().map(|url| self.post(url, &payload.body))).await;
        self.metrics.record_write_duration(self.name, started);

        let mut delivery = Delivery::default();
        for (url, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    delivery.failed += 1;
                    self.metrics.record_host_error(self.name);
                    if self.log_errors {
                        tracing::error!(
                            backend = self.name,
                            url = %url,
                            check_id = payload.reference_check_id,
                            error = %e,
                            "Write to destination failed"
                        );
                    }
                }
            }
        }

        Ok(delivery)
    }
}
