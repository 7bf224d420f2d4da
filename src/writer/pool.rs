//! Bounded write pool.
//!
//! # Responsibilities
//! - Queue write jobs for one writer, up to a fixed depth
//! - Run at most `max_concurrency` jobs at once
//! - Apply the configured overflow policy when the queue is full
//! - Drain queued and running jobs on shutdown
//!
//! # Design Decisions
//! - A dispatcher task moves jobs from the queue onto the runtime once a
//!   semaphore permit is free, so a saturated writer only backs up its own queue
//! - A panicking job releases its permit and does not affect other jobs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::config::{OverflowPolicy, PoolConfig};
use crate::observability::IngestMetrics;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{pool} pool queue is full")]
    QueueFull { pool: &'static str },

    #[error("{pool} pool is shut down")]
    Closed { pool: &'static str },
}

pub struct WritePool {
    name: &'static str,
    overflow: OverflowPolicy,
    sender: mpsc::Sender<Job>,
    dispatcher: JoinHandle<()>,
    running: Arc<Semaphore>,
    max_concurrency: usize,
    metrics: Arc<IngestMetrics>,
}

impl WritePool {
    /// Start the pool's dispatcher. Must be called inside a tokio runtime.
    pub fn spawn(name: &'static str, config: &PoolConfig, metrics: Arc<IngestMetrics>) -> Self {
        let max_concurrency = config.max_concurrency.max(1);
        let (sender, mut receiver) = mpsc::channel::<Job>(config.queue_capacity.max(1));
        let running = Arc::new(Semaphore::new(max_concurrency));

        let limit = running.clone();
        let dispatcher = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let Ok(permit) = limit.clone().acquire_owned().await else {
                    break;
                };
                tokio::spawn(async move {
                    job.await;
                    drop(permit);
                });
            }
        });

        tracing::debug!(
            pool = name,
            max_concurrency,
            queue_capacity = config.queue_capacity,
            overflow = ?config.overflow,
            "Write pool started"
        );

        Self {
            name,
            overflow: config.overflow,
            sender,
            dispatcher,
            running,
            max_concurrency,
            metrics,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Jobs currently executing.
    pub fn in_flight(&self) -> usize {
        self.max_concurrency - self.running.available_permits()
    }

    /// Enqueue a job.
    ///
    /// With `block` this waits for queue space; with `reject` a full queue
    /// refuses the job immediately.
    pub async fn submit<F>(&self, job: F) -> Result<(), SubmitError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let job: Job = Box::pin(job);
        match self.overflow {
            OverflowPolicy::Block => self
                .sender
                .send(job)
                .await
                .map_err(|_| SubmitError::Closed { pool: self.name }),
            OverflowPolicy::Reject => match self.sender.try_send(job) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.metrics.record_rejected(self.name);
                    tracing::warn!(pool = self.name, "Write pool queue full, job rejected");
                    Err(SubmitError::QueueFull { pool: self.name })
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    Err(SubmitError::Closed { pool: self.name })
                }
            },
        }
    }

    /// Stop accepting jobs and wait for queued and running ones to finish.
    pub async fn shutdown(self) {
        let Self {
            name,
            sender,
            dispatcher,
            running,
            max_concurrency,
            ..
        } = self;

        drop(sender);
        if let Err(e) = dispatcher.await {
            tracing::error!(pool = name, error = %e, "Write pool dispatcher failed");
        }

        let permits = u32::try_from(max_concurrency).unwrap_or(u32::MAX);
        if running.acquire_many(permits).await.is_err() {
            tracing::warn!(pool = name, "Write pool limiter closed during drain");
        }
        tracing::debug!(pool = name, "Write pool drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn config(max_concurrency: usize, queue_capacity: usize, overflow: OverflowPolicy) -> PoolConfig {
        PoolConfig {
            max_concurrency,
            queue_capacity,
            overflow,
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_all_jobs() {
        let metrics = Arc::new(IngestMetrics::new());
        let pool = WritePool::spawn("test", &config(2, 16, OverflowPolicy::Block), metrics);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let done = done.clone();
            pool.submit(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                done.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let metrics = Arc::new(IngestMetrics::new());
        let pool = WritePool::spawn("test", &config(3, 64, OverflowPolicy::Block), metrics);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let active = active.clone();
            let peak = peak.clone();
            pool.submit(async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.shutdown().await;
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_reject_when_full() {
        let metrics = Arc::new(IngestMetrics::new());
        let pool = WritePool::spawn("test", &config(1, 1, OverflowPolicy::Reject), metrics.clone());
        let gate = Arc::new(Notify::new());

        // Occupies the only running slot.
        let g = gate.clone();
        pool.submit(async move { g.notified().await }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.in_flight(), 1);

        // Fills the queue, held by the dispatcher or the channel.
        let mut rejected = 0_u64;
        for _ in 0..4 {
            if pool.submit(async {}).await.is_err() {
                rejected += 1;
            }
        }
        assert!(rejected >= 2);
        assert_eq!(metrics.snapshot().rejected_jobs, rejected);

        gate.notify_one();
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_panicking_job_releases_slot() {
        let metrics = Arc::new(IngestMetrics::new());
        let pool = WritePool::spawn("test", &config(1, 4, OverflowPolicy::Block), metrics);
        let done = Arc::new(AtomicUsize::new(0));

        pool.submit(async { panic!("job failure") }).await.unwrap();
        let d = done.clone();
        pool.submit(async move {
            d.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

        pool.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
