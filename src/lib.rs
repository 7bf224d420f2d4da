//! Check result ingestion pipeline.
//!
//! Turns worker check results into tagged time-series data points and
//! delivers them to the configured store, alongside bookkeeping and
//! app-metrics side effects.

pub mod config;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod store;
pub mod transform;
pub mod writer;

pub use config::IngestConfig;
pub use lifecycle::{build_ingestor, Shutdown};
pub use model::{CheckResult, WorkerBatch, WriteData};
pub use observability::IngestMetrics;
pub use writer::Ingestor;
