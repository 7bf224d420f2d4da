//! Backend-agnostic metric model and the write record it serializes to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One tagged value of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericDataPoint {
    /// Series identifier (e.g. `zmon.check.42.latency`).
    pub id: String,
    /// Value truncated towards zero.
    pub value: i64,
    pub tags: BTreeMap<String, String>,
}

/// All data points derived from one check result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericMetric {
    pub check_id: i64,
    /// Milliseconds since epoch.
    pub timestamp_ms: i64,
    pub data_points: Vec<GenericDataPoint>,
}

impl GenericMetric {
    pub fn new(check_id: i64, timestamp_ms: i64) -> Self {
        Self {
            check_id,
            timestamp_ms,
            data_points: Vec::new(),
        }
    }
}

/// Wire record posted to time-series backends.
///
/// Serializes as `{"name": .., "datapoints": [[ts, value]], "tags": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    pub name: String,
    pub datapoints: Vec<(i64, i64)>,
    pub tags: BTreeMap<String, String>,
}

/// Flatten generic metrics into one write record per data point.
pub fn to_write_records(metrics: &[GenericMetric]) -> Vec<WriteRecord> {
    metrics
        .iter()
        .flat_map(|m| {
            m.data_points.iter().map(move |dp| WriteRecord {
                name: dp.id.clone(),
                datapoints: vec![(m.timestamp_ms, dp.value)],
                tags: dp.tags.clone(),
            })
        })
        .collect()
}

/// Total number of data points across a batch.
pub fn point_count(metrics: &[GenericMetric]) -> usize {
    metrics.iter().map(|m| m.data_points.len()).sum()
}
