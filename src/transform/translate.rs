//! Translation of check results into the generic metric model.

use thiserror::Error;

use crate::model::{CheckResult, GenericDataPoint, GenericMetric};
use crate::observability::IngestMetrics;
use crate::transform::flatten::{flatten, truncate};
use crate::transform::tags::TagRules;

/// Reasons a single check result cannot be transformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// `check_result.ts` missing or not a number.
    #[error("check {check_id}: missing or non-numeric timestamp")]
    InvalidTimestamp { check_id: i64 },

    /// `check_result.value` missing or null.
    #[error("check {check_id}: missing result value")]
    MissingValue { check_id: i64 },
}

/// Converts check results into [`GenericMetric`]s.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    rules: TagRules,
}

impl Translator {
    pub fn new(rules: TagRules) -> Self {
        Self { rules }
    }

    /// Translate one result.
    ///
    /// Returns `Ok(None)` for non-sampled results; they are dropped before
    /// any parsing happens.
    pub fn translate(&self, result: &CheckResult) -> Result<Option<GenericMetric>, TransformError> {
        if !result.is_sampled {
            tracing::debug!(check_id = result.check_id, "Dropping non-sampled result");
            return Ok(None);
        }

        let check_id = result.check_id;
        let ts = result
            .timestamp()
            .ok_or(TransformError::InvalidTimestamp { check_id })?;
        let value = result
            .value()
            .filter(|v| !v.is_null())
            .ok_or(TransformError::MissingValue { check_id })?;

        let mut metric = GenericMetric::new(check_id, (ts * 1000.0) as i64);
        for (key, number) in flatten(value) {
            let Some(series) = self
                .rules
                .derive(check_id, &key, &result.entity_id, &result.entity)
            else {
                continue;
            };
            metric.data_points.push(GenericDataPoint {
                id: series.id,
                value: truncate(&number),
                tags: series.tags,
            });
        }
        Ok(Some(metric))
    }

    /// Translate a batch, skipping results that fail.
    ///
    /// Each failure bumps the parse-error counter.
    pub fn translate_batch(&self, results: &[CheckResult], metrics: &IngestMetrics) -> Vec<GenericMetric> {
        let mut translated = Vec::with_capacity(results.len());
        for result in results {
            match self.translate(result) {
                Ok(Some(metric)) => translated.push(metric),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, entity = %result.entity_id, "Skipping check result");
                    metrics.record_parse_error();
                }
            }
        }
        translated
    }
}
