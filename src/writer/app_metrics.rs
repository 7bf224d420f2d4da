//! Push of check results to the external app-metrics cache.
//!
//! # Responsibilities
//! - Partition a batch by `check_id mod host_count`
//! - POST each non-empty slice to its host, tagged with the slice index
//!
//! Failed pushes are counted and logged; there are no retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::header::COOKIE;

use crate::config::AppMetricsConfig;
use crate::model::{CheckResult, WriteData};
use crate::observability::IngestMetrics;
use crate::store::shard::shard_index;
use crate::writer::WorkResultWriter;

const METRICS_PATH: &str = "/api/v1/rest-api-metrics/";

pub struct AppMetricsWriter {
    client: reqwest::Client,
    endpoints: Vec<String>,
    metrics: Arc<IngestMetrics>,
}

impl AppMetricsWriter {
    pub fn new(config: &AppMetricsConfig, metrics: Arc<IngestMetrics>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let endpoints = config
            .hosts
            .iter()
            .map(|host| format!("http://{}:{}{}", host, config.port, METRICS_PATH))
            .collect();

        tracing::info!(hosts = ?config.hosts, port = config.port, "App metrics cache configured");
        Ok(Self {
            client,
            endpoints,
            metrics,
        })
    }

    async fn push(&self, index: usize, slice: &[&CheckResult]) {
        let url = &self.endpoints[index];
        let sent = self
            .client
            .post(url)
            .header(COOKIE, format!("metric_cache={}", index))
            .json(slice)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        if let Err(e) = sent {
            self.metrics.record_app_metrics_error();
            tracing::error!(url = %url, error = %e, "App metrics push failed");
        }
    }
}

/// Group results by destination host index.
pub fn partition(results: &[CheckResult], hosts: usize) -> Vec<Vec<&CheckResult>> {
    let mut slices = vec![Vec::new(); hosts];
    if hosts == 0 {
        return slices;
    }
    for result in results {
        slices[shard_index(result.check_id, hosts)].push(result);
    }
    slices
}

#[async_trait]
impl WorkResultWriter for AppMetricsWriter {
    fn name(&self) -> &'static str {
        "app_metrics"
    }

    async fn write(&self, data: &WriteData) {
        let Some(results) = data.results() else {
            tracing::debug!(account = %data.account_id, "No check results to push");
            return;
        };

        let slices = partition(results, self.endpoints.len());
        let pushes = slices
            .iter()
            .enumerate()
            .filter(|(_, slice)| !slice.is_empty())
            .map(|(index, slice)| self.push(index, slice));
        join_all(pushes).await;
    }
}
