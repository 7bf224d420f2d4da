//! Cache-fronted store.
//!
//! # Data Flow
//! ```text
//! store()  → bounded FIFO of payloads (oldest evicted when full)
//! flusher  → every flush interval, drain up to flush_batch payloads
//!          → backing store (kairosdb shard groups)
//! shutdown → flush until the FIFO is empty
//! ```
//!
//! Writes return as soon as the payload is buffered. Evictions and failed
//! forwards are counted as write errors.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::observability::IngestMetrics;
use crate::store::{DataPointsStore, Delivery, StoreError, WritePayload};

const NAME: &str = "query_cache";

pub struct QueryCacheStore {
    capacity: usize,
    entries: Mutex<VecDeque<WritePayload>>,
    backing: Arc<dyn DataPointsStore>,
    metrics: Arc<IngestMetrics>,
}

impl QueryCacheStore {
    pub fn new(capacity: usize, backing: Arc<dyn DataPointsStore>, metrics: Arc<IngestMetrics>) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            backing,
            metrics,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, max: usize) -> Vec<WritePayload> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let n = max.min(entries.len());
        entries.drain(..n).collect()
    }

    /// Forward up to `max` buffered payloads, oldest first, to the backing
    /// store. Returns how many were taken from the cache.
    pub async fn flush(&self, max: usize) -> usize {
        let pending = self.take(max);
        if pending.is_empty() {
            return 0;
        }

        let forwards = pending.iter().map(|payload| self.backing.store(payload));
        for (payload, result) in pending.iter().zip(join_all(forwards).await) {
            match result {
                Ok(delivery) if delivery.delivered == 0 => {
                    tracing::debug!(
                        check_id = payload.reference_check_id,
                        backend = self.backing.name(),
                        "Cached payload reached no destination"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    self.metrics.record_write_error(NAME);
                    tracing::error!(
                        check_id = payload.reference_check_id,
                        backend = self.backing.name(),
                        error = %e,
                        "Cached payload forward failed"
                    );
                }
            }
        }

        tracing::debug!(forwarded = pending.len(), remaining = self.len(), "Query cache flushed");
        pending.len()
    }

    /// Start the periodic flusher. Must be called inside a tokio runtime.
    pub fn spawn_flusher(self: &Arc<Self>, interval: Duration, batch: usize) -> CacheFlusher {
        let cache = self.clone();
        let stop = Arc::new(Notify::new());
        let stopped = stop.clone();
        let batch = batch.max(1);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        cache.flush(batch).await;
                    }
                    _ = stopped.notified() => break,
                }
            }
            while cache.flush(batch).await > 0 {}
        });

        CacheFlusher { stop, handle }
    }
}

/// Handle to the background flush task.
pub struct CacheFlusher {
    stop: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl CacheFlusher {
    /// Stop the periodic flush and forward everything still buffered.
    pub async fn shutdown(self) {
        self.stop.notify_one();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Query cache flusher failed");
        }
    }
}

#[async_trait]
impl DataPointsStore for QueryCacheStore {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn store(&self, payload: &WritePayload) -> Result<Delivery, StoreError> {
        let evicted = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let evicted = entries.len() >= self.capacity;
            if evicted {
                entries.pop_front();
            }
            entries.push_back(payload.clone());
            evicted
        };

        if evicted {
            self.metrics.record_write_error(NAME);
            tracing::warn!(capacity = self.capacity, "Query cache full, evicted oldest payload");
        }

        Ok(Delivery {
            delivered: 1,
            failed: 0,
        })
    }
}
