//! Bookkeeping writer: per-account and per-check traffic counters.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::WriteData;
use crate::observability::IngestMetrics;
use crate::writer::WorkResultWriter;

pub struct MarkWriter {
    metrics: Arc<IngestMetrics>,
}

impl MarkWriter {
    pub fn new(metrics: Arc<IngestMetrics>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl WorkResultWriter for MarkWriter {
    fn name(&self) -> &'static str {
        "mark"
    }

    async fn write(&self, data: &WriteData) {
        let Some(results) = data.results() else {
            tracing::debug!(account = %data.account_id, "No check results to mark");
            return;
        };

        self.metrics
            .mark_account(&data.account_id, &data.region, data.payload_bytes);
        self.metrics.mark_check(results[0].check_id, data.payload_bytes);
    }
}
