//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → IngestConfig (validated, immutable)
//!     → shared via Arc to all writers and stores
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AppMetricsConfig, BackendKind, HttpBackendConfig, IngestConfig, ObservabilityConfig,
    OverflowPolicy, PoolConfig, PoolsConfig, QueryCacheConfig, StoreConfig, TagConfig,
};
pub use loader::{load_config, parse_config, ConfigError};
pub use validation::{validate_config, ValidationError};
