//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::IngestConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<IngestConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<IngestConfig, ConfigError> {
    let config: IngestConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendKind, OverflowPolicy};
    use std::io::Write;

    const SAMPLE: &str = r#"
        [store]
        backend = "m3db"

        [kairosdb]
        enabled = false

        [m3db]
        enabled = true
        write_urls = [["http://m3-a:7201", "http://m3-b:7201"], ["http://m3-c:7201"]]
        max_connections = 10

        [tags]
        actuator_metric_checks = [12, 34]
        result_size_warning = 50

        [pools.timeseries]
        max_concurrency = 4
        queue_capacity = 16
        overflow = "reject"

        [observability]
        metrics_enabled = false
        log_write_errors = true
    "#;

    #[test]
    fn test_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_config(file.path()).expect("config should load");
        assert_eq!(config.store.backend, BackendKind::M3Db);
        assert_eq!(config.m3db.write_urls.len(), 2);
        assert_eq!(config.m3db.max_connections, 10);
        assert_eq!(config.m3db.write_path, "/api/v1/datapoints");
        assert_eq!(config.tags.actuator_metric_checks, vec![12, 34]);
        assert_eq!(config.tags.result_size_warning, 50);
        assert_eq!(config.pools.timeseries.overflow, OverflowPolicy::Reject);
        assert_eq!(config.pools.mark.overflow, OverflowPolicy::Block);
        assert!(config.observability.log_write_errors);
    }

    #[test]
    fn test_minimal_config_is_valid() {
        let config = parse_config(
            r#"
            [kairosdb]
            write_urls = [["http://kairos:8080"]]
        "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, BackendKind::KairosDb);
        assert!(config.kairosdb.enabled);
        assert!(!config.m3db.enabled);
        assert_eq!(config.tags.result_size_warning, 100);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/check-ingest.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[store]\nbackend = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_all_problems() {
        let err = parse_config(
            r#"
            [kairosdb]
            write_urls = []
            timeout_ms = 0
        "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
