//! Data model for the ingestion pipeline.
//!
//! # Data Flow
//! ```text
//! worker JSON line
//!     → check.rs (WorkerBatch / CheckResult, wire format)
//!     → WriteData (batch + account/region, shared by every writer)
//!     → generic.rs (GenericMetric / GenericDataPoint)
//!     → WriteRecord (backend write payload)
//! ```
//!
//! # Design Decisions
//! - Batches are immutable once built; writers share them through `Arc`
//! - The raw `check_result` object is kept untyped so a malformed result
//!   fails only its own transformation, not the whole batch

pub mod check;
pub mod generic;

pub use check::{CheckResult, ParsedBatch, WorkerBatch, WriteData};
pub use generic::{GenericDataPoint, GenericMetric, WriteRecord};
