//! Worker spawn and join.
//!
//! Every channel and worker in the pipeline is allocated through an [`Executor`], so a
//! caller can bound, count or fail allocations without touching stage logic. A
//! [`WorkerHandle`] is consumed by [`WorkerHandle::join`], which makes "join exactly once"
//! a property of the types.
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::channel::{self, Reader, Writer};
use crate::config::SieveConfig;
use crate::error::{ResourceError, SieveError};
use crate::report::StageReport;

/// What a stage worker hands back on join: its own report followed by its descendants'.
pub type StageResult = Result<Vec<StageReport>, SieveError>;

/// A stage body ready to be spawned.
pub type StageTask = Pin<Box<dyn Future<Output = StageResult> + Send + 'static>>;

pub trait Executor: Send + Sync {
    /// Allocates a fresh channel endpoint pair.
    fn open_channel(&self) -> Result<(Writer, Reader), ResourceError>;

    /// Starts `task` as an independent worker representing `prime`.
    fn spawn(&self, prime: u32, task: StageTask) -> Result<WorkerHandle, ResourceError>;

    fn stats(&self) -> ExecutorStats;
}

/// Point-in-time allocation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorStats {
    pub channels_opened: usize,
    pub workers_spawned: usize,
    pub workers_joined: usize,
}

impl ExecutorStats {
    /// Workers spawned but not yet joined.
    pub fn outstanding(&self) -> usize {
        self.workers_spawned.saturating_sub(self.workers_joined)
    }

    /// Allocations made after `earlier` was taken.
    pub fn since(&self, earlier: &ExecutorStats) -> ExecutorStats {
        ExecutorStats {
            channels_opened: self.channels_opened.saturating_sub(earlier.channels_opened),
            workers_spawned: self.workers_spawned.saturating_sub(earlier.workers_spawned),
            workers_joined: self.workers_joined.saturating_sub(earlier.workers_joined),
        }
    }
}

/// Shared allocation counters, updated by executors and by [`WorkerHandle::join`].
#[derive(Debug, Default)]
pub struct Counters {
    channels: AtomicUsize,
    spawned: AtomicUsize,
    joined: AtomicUsize,
    live: AtomicUsize,
}

impl Counters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_channel(&self) {
        self.channels.fetch_add(1, Ordering::SeqCst);
    }

    /// Reserves a live-worker slot, refusing once `max` workers are live.
    pub fn admit(&self, max: Option<usize>) -> Result<(), ResourceError> {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| match max {
                Some(max) if live >= max => None,
                _ => Some(live + 1),
            })
            .map(|_| ())
            .map_err(ResourceError::WorkerLimit)
    }

    pub fn record_spawn(&self) {
        self.spawned.fetch_add(1, Ordering::SeqCst);
    }

    fn record_join(&self) {
        self.joined.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutorStats {
        ExecutorStats {
            channels_opened: self.channels.load(Ordering::SeqCst),
            workers_spawned: self.spawned.load(Ordering::SeqCst),
            workers_joined: self.joined.load(Ordering::SeqCst),
        }
    }
}

/// Handle to a spawned stage worker. Must be joined.
#[must_use = "every spawned worker must be joined"]
#[derive(Debug)]
pub struct WorkerHandle {
    prime: u32,
    inner: JoinHandle<StageResult>,
    counters: Arc<Counters>,
}

impl WorkerHandle {
    /// Wraps a tokio task; the caller must already have admitted it on `counters`.
    pub fn new(prime: u32, inner: JoinHandle<StageResult>, counters: Arc<Counters>) -> Self {
        Self {
            prime,
            inner,
            counters,
        }
    }

    pub fn prime(&self) -> u32 {
        self.prime
    }

    /// Waits for the worker to terminate and collects its result.
    pub async fn join(self) -> StageResult {
        let outcome = self.inner.await;
        self.counters.record_join();
        match outcome {
            Ok(result) => result,
            Err(err) => Err(SieveError::WorkerPanicked {
                prime: self.prime,
                message: err.to_string(),
            }),
        }
    }
}

/// Spawns stages as tasks on the ambient tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    channel_capacity: usize,
    max_workers: Option<usize>,
    counters: Arc<Counters>,
}

impl TokioExecutor {
    pub fn new(channel_capacity: usize, max_workers: Option<usize>) -> Self {
        Self {
            channel_capacity,
            max_workers,
            counters: Counters::new(),
        }
    }

    pub fn from_config(config: &SieveConfig) -> Self {
        Self::new(config.channel_capacity, config.max_workers)
    }

    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

impl Default for TokioExecutor {
    fn default() -> Self {
        Self::from_config(&SieveConfig::default())
    }
}

impl Executor for TokioExecutor {
    fn open_channel(&self) -> Result<(Writer, Reader), ResourceError> {
        self.counters.record_channel();
        Ok(channel::channel(self.channel_capacity))
    }

    fn spawn(&self, prime: u32, task: StageTask) -> Result<WorkerHandle, ResourceError> {
        let runtime =
            Handle::try_current().map_err(|err| ResourceError::NoRuntime(err.to_string()))?;
        self.counters.admit(self.max_workers)?;
        self.counters.record_spawn();
        trace!(prime, "spawning stage worker");

        let inner = runtime.spawn(task);
        Ok(WorkerHandle::new(prime, inner, self.counters()))
    }

    fn stats(&self) -> ExecutorStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(prime: u32) -> StageTask {
        Box::pin(async move { Ok(vec![StageReport::new(prime, 1)]) })
    }

    #[tokio::test]
    async fn test_spawn_join_counts() {
        let executor = TokioExecutor::new(4, None);
        let handle = executor.spawn(3, finished(3)).unwrap();
        assert_eq!(executor.stats().outstanding(), 1);

        let reports = handle.join().await.unwrap();
        assert_eq!(reports[0].prime, 3);

        let stats = executor.stats();
        assert_eq!(stats.workers_spawned, 1);
        assert_eq!(stats.workers_joined, 1);
        assert_eq!(stats.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_worker_limit() {
        let executor = TokioExecutor::new(4, Some(1));
        let first = executor.spawn(3, finished(3)).unwrap();

        let refused = executor.spawn(5, finished(5));
        assert!(matches!(refused, Err(ResourceError::WorkerLimit(1))));

        // Joining frees the slot.
        first.join().await.unwrap();
        let second = executor.spawn(5, finished(5)).unwrap();
        second.join().await.unwrap();
        assert_eq!(executor.stats().workers_spawned, 2);
    }

    #[tokio::test]
    async fn test_panicking_worker_is_reported() {
        let executor = TokioExecutor::default();
        let explode = true;
        let task: StageTask = Box::pin(async move {
            if explode {
                panic!("stage blew up");
            }
            Ok(Vec::new())
        });
        let handle = executor.spawn(7, task).unwrap();

        let err = handle.join().await.unwrap_err();
        assert!(matches!(err, SieveError::WorkerPanicked { prime: 7, .. }));
        assert_eq!(executor.stats().outstanding(), 0);
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let executor = TokioExecutor::default();
        let result = executor.spawn(3, finished(3));
        assert!(matches!(result, Err(ResourceError::NoRuntime(_))));
        assert_eq!(executor.stats().workers_spawned, 0);
    }
}
