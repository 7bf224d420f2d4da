//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (IngestMetrics atomics + metrics facade counters)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON or pretty)
//!     → Prometheus scrape endpoint (metrics-exporter-prometheus)
//! ```
//!
//! # Design Decisions
//! - Every failure in the write path is visible here and nowhere else;
//!   writers never surface errors to the ingestion caller
//! - Counters are atomic so any writer task can bump them

pub mod logging;
pub mod metrics;

pub use metrics::{IngestMetrics, MetricsSnapshot};
