//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ingest_parse_errors_total` (counter): check results abandoned during transformation
//! - `ingest_write_errors_total{backend}` (counter): failed store writes
//! - `ingest_host_errors_total{backend}` (counter): failed writes to a single destination
//! - `ingest_data_points_total{backend}` (counter): data points delivered
//! - `ingest_write_duration_seconds{backend}` (histogram): store write latency
//! - `ingest_result_size_warnings_total` (counter): results or batches above the size threshold
//! - `ingest_pool_rejected_total{pool}` (counter): jobs refused by a full writer pool
//! - `ingest_app_metrics_errors_total` (counter): failed app-metrics cache pushes
//! - `ingest_account_bytes_total{account,region}` / `ingest_check_bytes_total{check}`
//!
//! # Design Decisions
//! - Facade counters (`metrics` crate) feed the Prometheus exporter
//! - The same events land in `IngestMetrics` atomics so tests and
//!   shutdown summaries can read totals without a recorder installed

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Pipeline counters shared by every writer task.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    parse_errors: AtomicU64,
    write_errors: AtomicU64,
    host_errors: AtomicU64,
    data_points: AtomicU64,
    result_size_warnings: AtomicU64,
    rejected_jobs: AtomicU64,
    app_metrics_errors: AtomicU64,
    marked_batches: AtomicU64,
    marked_bytes: AtomicU64,
}

/// Point-in-time copy of [`IngestMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub parse_errors: u64,
    pub write_errors: u64,
    pub host_errors: u64,
    pub data_points: u64,
    pub result_size_warnings: u64,
    pub rejected_jobs: u64,
    pub app_metrics_errors: u64,
    pub marked_batches: u64,
    pub marked_bytes: u64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A check result could not be transformed.
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        counter!("ingest_parse_errors_total").increment(1);
    }

    /// A whole store write failed.
    pub fn record_write_error(&self, backend: &'static str) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
        counter!("ingest_write_errors_total", "backend" => backend).increment(1);
    }

    /// A single destination of a fan-out failed.
    pub fn record_host_error(&self, backend: &'static str) {
        self.host_errors.fetch_add(1, Ordering::Relaxed);
        counter!("ingest_host_errors_total", "backend" => backend).increment(1);
    }

    pub fn record_data_points(&self, backend: &'static str, count: usize) {
        self.data_points.fetch_add(count as u64, Ordering::Relaxed);
        counter!("ingest_data_points_total", "backend" => backend).increment(count as u64);
    }

    pub fn record_write_duration(&self, backend: &'static str, started: Instant) {
        histogram!("ingest_write_duration_seconds", "backend" => backend)
            .record(started.elapsed().as_secs_f64());
    }

    pub fn record_result_size_warning(&self) {
        self.result_size_warnings.fetch_add(1, Ordering::Relaxed);
        counter!("ingest_result_size_warnings_total").increment(1);
    }

    /// A writer pool refused a job because its queue was full.
    pub fn record_rejected(&self, pool: &'static str) {
        self.rejected_jobs.fetch_add(1, Ordering::Relaxed);
        counter!("ingest_pool_rejected_total", "pool" => pool).increment(1);
    }

    pub fn record_app_metrics_error(&self) {
        self.app_metrics_errors.fetch_add(1, Ordering::Relaxed);
        counter!("ingest_app_metrics_errors_total").increment(1);
    }

    /// Account bookkeeping for one ingested batch.
    pub fn mark_account(&self, account: &str, region: &str, bytes: usize) {
        self.marked_batches.fetch_add(1, Ordering::Relaxed);
        self.marked_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        counter!(
            "ingest_account_bytes_total",
            "account" => account.to_string(),
            "region" => region.to_string()
        )
        .increment(bytes as u64);
    }

    pub fn mark_check(&self, check_id: i64, bytes: usize) {
        counter!("ingest_check_bytes_total", "check" => check_id.to_string())
            .increment(bytes as u64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            host_errors: self.host_errors.load(Ordering::Relaxed),
            data_points: self.data_points.load(Ordering::Relaxed),
            result_size_warnings: self.result_size_warnings.load(Ordering::Relaxed),
            rejected_jobs: self.rejected_jobs.load(Ordering::Relaxed),
            app_metrics_errors: self.app_metrics_errors.load(Ordering::Relaxed),
            marked_batches: self.marked_batches.load(Ordering::Relaxed),
            marked_bytes: self.marked_bytes.load(Ordering::Relaxed),
        }
    }
}
