//! Writers and their dispatch.
//!
//! # Data Flow
//! ```text
//! WriteData
//!     → Ingestor::ingest
//!         → WritePool("timeseries")  → TimeSeriesWriter → DataPointsStore
//!                                       (query cache: CacheFlusher → kairosdb)
//!         → WritePool("mark")        → MarkWriter       → IngestMetrics
//!         → WritePool("app_metrics") → AppMetricsWriter → app-metrics hosts
//! ```
//!
//! # Design Decisions
//! - Every writer gets the same batch behind one `Arc`
//! - `ingest` returns once jobs are queued; writes finish out of band
//! - Writers swallow their own failures; nothing flows back to the caller

pub mod app_metrics;
pub mod mark;
pub mod pool;
pub mod timeseries;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::model::WriteData;
use crate::store::CacheFlusher;

pub use app_metrics::AppMetricsWriter;
pub use mark::MarkWriter;
pub use pool::{SubmitError, WritePool};
pub use timeseries::TimeSeriesWriter;

/// Consumer of ingested batches.
#[async_trait]
pub trait WorkResultWriter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Handle one batch. Failures are logged and counted, never returned.
    async fn write(&self, data: &WriteData);
}

struct Lane {
    writer: Arc<dyn WorkResultWriter>,
    pool: WritePool,
}

/// Fans each batch out to every registered writer.
#[derive(Default)]
pub struct Ingestor {
    lanes: Vec<Lane>,
    flushers: Vec<CacheFlusher>,
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a writer with its own pool.
    pub fn add_writer(&mut self, writer: Arc<dyn WorkResultWriter>, pool: WritePool) {
        tracing::info!(writer = writer.name(), pool = pool.name(), "Writer registered");
        self.lanes.push(Lane { writer, pool });
    }

    /// Background cache flush stopped after the writers drain.
    pub fn add_flusher(&mut self, flusher: CacheFlusher) {
        self.flushers.push(flusher);
    }

    pub fn writer_names(&self) -> Vec<&'static str> {
        self.lanes.iter().map(|lane| lane.writer.name()).collect()
    }

    /// Queue `data` on every writer. Returns how many writers accepted it.
    ///
    /// Lanes are submitted concurrently; a saturated `block` pool only holds
    /// up its own enqueue, every other writer still receives the batch.
    pub async fn ingest(&self, data: WriteData) -> usize {
        let data = Arc::new(data);
        let submits = self.lanes.iter().map(|lane| {
            let writer = lane.writer.clone();
            let data = data.clone();
            async move {
                let submitted = lane.pool.submit(async move { writer.write(&data).await }).await;
                if let Err(e) = &submitted {
                    tracing::debug!(writer = lane.writer.name(), error = %e, "Batch not queued");
                }
                submitted.is_ok()
            }
        });

        join_all(submits).await.into_iter().filter(|ok| *ok).count()
    }

    /// Drain every pool, then flush cached payloads.
    pub async fn shutdown(self) {
        for lane in self.lanes {
            let name = lane.writer.name();
            lane.pool.shutdown().await;
            tracing::info!(writer = name, "Writer drained");
        }
        for flusher in self.flushers {
            flusher.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OverflowPolicy, PoolConfig};
    use crate::model::WorkerBatch;
    use crate::observability::IngestMetrics;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Recording {
        name: &'static str,
        delay: Duration,
        seen: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl WorkResultWriter for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn write(&self, data: &WriteData) {
            tokio::time::sleep(self.delay).await;
            self.seen.lock().unwrap().push(data.payload_bytes);
        }
    }

    fn recording(name: &'static str, delay_ms: u64) -> Arc<Recording> {
        Arc::new(Recording {
            name,
            delay: Duration::from_millis(delay_ms),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_every_writer_receives_batch() {
        let metrics = Arc::new(IngestMetrics::new());
        let fast = recording("fast", 0);
        let slow = recording("slow", 200);

        let mut ingestor = Ingestor::new();
        ingestor.add_writer(fast.clone(), WritePool::spawn("fast", &PoolConfig::default(), metrics.clone()));
        ingestor.add_writer(slow.clone(), WritePool::spawn("slow", &PoolConfig::default(), metrics));
        assert_eq!(ingestor.writer_names(), vec!["fast", "slow"]);

        let started = std::time::Instant::now();
        let accepted = ingestor
            .ingest(WriteData::new(WorkerBatch::default(), "acc", "eu", 11))
            .await;
        assert_eq!(accepted, 2);
        assert!(started.elapsed() < Duration::from_millis(200), "ingest must not wait for writers");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*fast.seen.lock().unwrap(), vec![11]);
        assert!(slow.seen.lock().unwrap().is_empty());

        ingestor.shutdown().await;
        assert_eq!(*slow.seen.lock().unwrap(), vec![11]);
    }

    /// Writer that waits until `gate` is closed.
    struct Gated {
        gate: Arc<tokio::sync::Semaphore>,
    }

    #[async_trait]
    impl WorkResultWriter for Gated {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn write(&self, _data: &WriteData) {
            let _ = self.gate.acquire().await;
        }
    }

    #[tokio::test]
    async fn test_blocked_writer_does_not_starve_others() {
        let metrics = Arc::new(IngestMetrics::new());
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let healthy = recording("healthy", 0);
        let tight = PoolConfig {
            max_concurrency: 1,
            queue_capacity: 1,
            overflow: OverflowPolicy::Block,
        };

        let mut ingestor = Ingestor::new();
        ingestor.add_writer(
            Arc::new(Gated { gate: gate.clone() }),
            WritePool::spawn("gated", &tight, metrics.clone()),
        );
        ingestor.add_writer(healthy.clone(), WritePool::spawn("healthy", &PoolConfig::default(), metrics));
        let ingestor = Arc::new(ingestor);

        let callers: Vec<_> = (0..10)
            .map(|i| {
                let ingestor = ingestor.clone();
                tokio::spawn(async move {
                    ingestor
                        .ingest(WriteData::new(WorkerBatch::default(), "acc", "eu", i))
                        .await
                })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(healthy.seen.lock().unwrap().len(), 10);
        assert!(callers.iter().any(|c| !c.is_finished()), "gated lane is saturated");

        gate.close();
        for caller in callers {
            assert_eq!(caller.await.unwrap(), 2);
        }
        let ingestor = Arc::try_unwrap(ingestor).ok().unwrap();
        ingestor.shutdown().await;
    }

    #[tokio::test]
    async fn test_rejecting_writer_does_not_affect_others() {
        let metrics = Arc::new(IngestMetrics::new());
        let stuck = recording("stuck", 300);
        let healthy = recording("healthy", 0);
        let tight = PoolConfig {
            max_concurrency: 1,
            queue_capacity: 1,
            overflow: OverflowPolicy::Reject,
        };

        let mut ingestor = Ingestor::new();
        ingestor.add_writer(stuck.clone(), WritePool::spawn("stuck", &tight, metrics.clone()));
        ingestor.add_writer(healthy.clone(), WritePool::spawn("healthy", &PoolConfig::default(), metrics.clone()));

        let mut total = 0;
        for i in 0..5 {
            total += ingestor
                .ingest(WriteData::new(WorkerBatch::default(), "acc", "eu", i))
                .await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(total < 10);
        assert!(metrics.snapshot().rejected_jobs > 0);

        ingestor.shutdown().await;
        assert_eq!(healthy.seen.lock().unwrap().len(), 5);
    }
}
