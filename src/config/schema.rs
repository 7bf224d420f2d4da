//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! ingestion pipeline. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Which backend the time-series writer stores into.
    pub store: StoreConfig,

    /// Primary time-series backend.
    pub kairosdb: HttpBackendConfig,

    /// Secondary time-series backend.
    pub m3db: HttpBackendConfig,

    /// Cache-backed query store.
    pub query_cache: QueryCacheConfig,

    /// Series and tag derivation.
    pub tags: TagConfig,

    /// External app-metrics cache.
    pub app_metrics: AppMetricsConfig,

    /// Writer pool sizing.
    pub pools: PoolsConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            kairosdb: HttpBackendConfig::default(),
            m3db: HttpBackendConfig {
                enabled: false,
                ..HttpBackendConfig::default()
            },
            query_cache: QueryCacheConfig::default(),
            tags: TagConfig::default(),
            app_metrics: AppMetricsConfig::default(),
            pools: PoolsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Store implementations selectable at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum BackendKind {
    #[default]
    #[serde(rename = "kairosdb")]
    KairosDb,
    #[serde(rename = "m3db")]
    M3Db,
    #[serde(rename = "query_cache")]
    QueryCache,
}

impl BackendKind {
    /// Label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::KairosDb => "kairosdb",
            BackendKind::M3Db => "m3db",
            BackendKind::QueryCache => "query_cache",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Active store (kairosdb, m3db, query_cache).
    pub backend: BackendKind,
}

/// An HTTP time-series backend reached through sharded endpoint groups.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpBackendConfig {
    /// Enable writes to this backend.
    pub enabled: bool,

    /// Shard groups; each inner list holds alternate base URLs.
    pub write_urls: Vec<Vec<String>>,

    /// Path appended to the selected base URL.
    pub write_path: String,

    /// Connect timeout in milliseconds.
    pub timeout_ms: u64,

    /// Read timeout in milliseconds.
    pub socket_timeout_ms: u64,

    /// Maximum concurrent connections to this backend.
    pub max_connections: usize,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            write_urls: Vec::new(),
            write_path: "/api/v1/datapoints".to_string(),
            timeout_ms: 1000,
            socket_timeout_ms: 500,
            max_connections: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryCacheConfig {
    /// Enable the cache-fronted store. Flushes go to the `kairosdb` endpoints.
    pub enabled: bool,

    /// Maximum buffered payloads before the oldest is evicted.
    pub capacity: usize,

    /// Milliseconds between flushes to the backing store.
    pub flush_interval_ms: u64,

    /// Payloads forwarded per flush.
    pub flush_batch: usize,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 10_000,
            flush_interval_ms: 1000,
            flush_batch: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TagConfig {
    /// Entity attributes copied into tags; empty means the built-in set.
    pub entity_tag_fields: Vec<String>,

    /// Checks whose keys embed HTTP status codes.
    pub actuator_metric_checks: Vec<i64>,

    /// Data points per result above which a warning is logged.
    pub result_size_warning: usize,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            entity_tag_fields: Vec::new(),
            actuator_metric_checks: Vec::new(),
            result_size_warning: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppMetricsConfig {
    /// Cache hosts; the writer is disabled when empty.
    pub hosts: Vec<String>,

    pub port: u16,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for AppMetricsConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            port: 8088,
            timeout_ms: 1000,
        }
    }
}

/// What a full writer queue does with new work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Submitter waits for queue space.
    #[default]
    Block,
    /// Job is refused and counted.
    Reject,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Jobs running at once.
    pub max_concurrency: usize,

    /// Jobs waiting for a slot.
    pub queue_capacity: usize,

    pub overflow: OverflowPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 200,
            queue_capacity: 5000,
            overflow: OverflowPolicy::Block,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolsConfig {
    pub timeseries: PoolConfig,
    pub mark: PoolConfig,
    pub app_metrics: PoolConfig,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub log_json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Log every serialized write payload.
    pub log_write_requests: bool,

    /// Log each failed destination write.
    pub log_write_errors: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
            log_write_requests: false,
            log_write_errors: false,
        }
    }
}
