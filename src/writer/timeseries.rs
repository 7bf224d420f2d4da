//! Time-series writer: translate, serialize, hand to the active store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::generic::point_count;
use crate::model::WriteData;
use crate::observability::IngestMetrics;
use crate::store::{DataPointsStore, WritePayload};
use crate::transform::Translator;
use crate::writer::WorkResultWriter;

pub struct TimeSeriesWriter {
    translator: Translator,
    store: Arc<dyn DataPointsStore>,
    metrics: Arc<IngestMetrics>,
    /// Points per check result above which a warning is logged.
    result_size_warning: usize,
}

impl TimeSeriesWriter {
    pub fn new(
        translator: Translator,
        store: Arc<dyn DataPointsStore>,
        metrics: Arc<IngestMetrics>,
        result_size_warning: usize,
    ) -> Self {
        Self {
            translator,
            store,
            metrics,
            result_size_warning,
        }
    }
}

#[async_trait]
impl WorkResultWriter for TimeSeriesWriter {
    fn name(&self) -> &'static str {
        "timeseries"
    }

    async fn write(&self, data: &WriteData) {
        let Some(results) = data.results() else {
            tracing::debug!(account = %data.account_id, "No check results in batch");
            return;
        };

        let metrics = self.translator.translate_batch(results, &self.metrics);
        let mut oversized = 0;
        for metric in &metrics {
            if metric.data_points.len() > self.result_size_warning {
                oversized += 1;
                self.metrics.record_result_size_warning();
                tracing::warn!(
                    check_id = metric.check_id,
                    data_points = metric.data_points.len(),
                    threshold = self.result_size_warning,
                    "Check result produced unusually many data points"
                );
            }
        }

        let total = point_count(&metrics);
        // Many small results can add up; warn once for the batch.
        if oversized == 0 && total > self.result_size_warning {
            self.metrics.record_result_size_warning();
            tracing::warn!(
                results = metrics.len(),
                data_points = total,
                threshold = self.result_size_warning,
                "Batch produced unusually many data points"
            );
        }

        if total == 0 {
            tracing::debug!(results = results.len(), "Batch produced no data points");
            return;
        }

        let backend = self.store.name();
        let reference_check_id = results[0].check_id;
        let payload = match WritePayload::from_metrics(reference_check_id, &metrics) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_write_error(backend);
                tracing::error!(backend, error = %e, "Failed to serialize write payload");
                return;
            }
        };

        match self.store.store(&payload).await {
            Ok(delivery) => {
                if delivery.delivered > 0 {
                    self.metrics.record_data_points(backend, payload.point_count);
                }
                if !delivery.is_complete() {
                    tracing::debug!(
                        backend,
                        delivered = delivery.delivered,
                        failed = delivery.failed,
                        "Partial delivery"
                    );
                }
            }
            Err(e) => {
                self.metrics.record_write_error(backend);
                tracing::error!(backend, check_id = reference_check_id, error = %e, "Store write failed");
            }
        }
    }
}
