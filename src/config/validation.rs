//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - The selected store, when enabled, must have usable endpoints
//! - Validate value ranges (timeouts > 0, pool sizes > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: IngestConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{BackendKind, HttpBackendConfig, IngestConfig, PoolConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}: no write_urls configured")]
    NoShardGroups(&'static str),

    #[error("{backend}: shard group {group} is empty")]
    EmptyShardGroup { backend: &'static str, group: usize },

    #[error("{backend}: invalid url '{url}'")]
    InvalidUrl { backend: &'static str, url: String },

    #[error("{0}: {1} must be greater than zero")]
    Zero(&'static str, &'static str),
}

pub fn validate_config(config: &IngestConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // A disabled selected store is allowed; startup skips the time-series writer.
    let selected = config.store.backend;
    if config.kairosdb.enabled && selected == BackendKind::KairosDb {
        validate_http_backend("kairosdb", &config.kairosdb, &mut errors);
    }
    if config.m3db.enabled && selected == BackendKind::M3Db {
        validate_http_backend("m3db", &config.m3db, &mut errors);
    }
    if config.query_cache.enabled && selected == BackendKind::QueryCache {
        let cache = &config.query_cache;
        if cache.capacity == 0 {
            errors.push(ValidationError::Zero("query_cache", "capacity"));
        }
        if cache.flush_interval_ms == 0 {
            errors.push(ValidationError::Zero("query_cache", "flush_interval_ms"));
        }
        if cache.flush_batch == 0 {
            errors.push(ValidationError::Zero("query_cache", "flush_batch"));
        }
        // Flushes are forwarded to the kairosdb endpoints.
        validate_http_backend("kairosdb", &config.kairosdb, &mut errors);
    }
    if !config.app_metrics.hosts.is_empty() && config.app_metrics.timeout_ms == 0 {
        errors.push(ValidationError::Zero("app_metrics", "timeout_ms"));
    }

    validate_pool("pools.timeseries", &config.pools.timeseries, &mut errors);
    validate_pool("pools.mark", &config.pools.mark, &mut errors);
    validate_pool("pools.app_metrics", &config.pools.app_metrics, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_http_backend(
    backend: &'static str,
    config: &HttpBackendConfig,
    errors: &mut Vec<ValidationError>,
) {
    if config.write_urls.is_empty() {
        errors.push(ValidationError::NoShardGroups(backend));
    }
    for (group, urls) in config.write_urls.iter().enumerate() {
        if urls.is_empty() {
            errors.push(ValidationError::EmptyShardGroup { backend, group });
        }
        for url in urls {
            if Url::parse(url).is_err() {
                errors.push(ValidationError::InvalidUrl {
                    backend,
                    url: url.clone(),
                });
            }
        }
    }
    if config.timeout_ms == 0 {
        errors.push(ValidationError::Zero(backend, "timeout_ms"));
    }
    if config.socket_timeout_ms == 0 {
        errors.push(ValidationError::Zero(backend, "socket_timeout_ms"));
    }
    if config.max_connections == 0 {
        errors.push(ValidationError::Zero(backend, "max_connections"));
    }
}

fn validate_pool(name: &'static str, pool: &PoolConfig, errors: &mut Vec<ValidationError>) {
    if pool.max_concurrency == 0 {
        errors.push(ValidationError::Zero(name, "max_concurrency"));
    }
    if pool.queue_capacity == 0 {
        errors.push(ValidationError::Zero(name, "queue_capacity"));
    }
}
