//! Stage: one concurrent filter worker in the sieve chain.
//!
//! A stage is born from the first value that reaches an uninitialized cursor. That value
//! has survived every filter above it, so it is prime and the stage emits it straight
//! away. Afterwards the stage drops multiples of its prime and lazily forwards the rest
//! through its own cursor, which grows the chain by one stage on first use.
use tracing::{debug, error};

use crate::channel::Reader;
use crate::context::StageContext;
use crate::cursor::Cursor;
use crate::error::SieveError;
use crate::executor::{StageResult, StageTask};
use crate::report::StageReport;

#[derive(Debug)]
pub struct Stage {
    prime: u32,
    depth: usize,
    upstream: Reader,
    downstream: Cursor,
    ctx: StageContext,
}

impl Stage {
    pub fn new(prime: u32, depth: usize, upstream: Reader, ctx: StageContext) -> Self {
        Self {
            prime,
            depth,
            upstream,
            downstream: Cursor::new(),
            ctx,
        }
    }

    pub fn prime(&self) -> u32 {
        self.prime
    }

    /// Boxes the stage body so it can be handed to an executor.
    pub fn into_task(self) -> StageTask {
        Box::pin(self.run())
    }

    /// Runs until upstream reaches end-of-stream, then tears down bottom-up: the
    /// upstream reader is dropped, the downstream cursor closed and its stage joined.
    /// Teardown also runs when filtering fails, so a failing stage never leaks workers.
    pub async fn run(self) -> StageResult {
        let Stage {
            prime,
            depth,
            mut upstream,
            mut downstream,
            ctx,
        } = self;
        let mut report = StageReport::new(prime, depth);
        debug!(prime, depth, "stage started");

        let filtered =
            filter(prime, depth, &mut upstream, &mut downstream, &ctx, &mut report).await;
        if let Err(err) = &filtered {
            error!(prime, depth, error = %err, "stage failed");
        }

        upstream.close();
        let below = downstream.shutdown().await;

        debug!(
            prime,
            depth,
            received = report.received,
            forwarded = report.forwarded,
            "stage finished"
        );
        settle(filtered, below).map(|mut chain| {
            chain.insert(0, report);
            chain
        })
    }
}

async fn filter(
    prime: u32,
    depth: usize,
    upstream: &mut Reader,
    downstream: &mut Cursor,
    ctx: &StageContext,
    report: &mut StageReport,
) -> Result<(), SieveError> {
    ctx.emit(prime)?;

    while let Some(value) = upstream.recv().await {
        report.received += 1;
        if value % prime == 0 {
            report.discarded += 1;
            continue;
        }
        downstream.forward(value, depth + 1, ctx).await?;
        report.forwarded += 1;
    }
    Ok(())
}

/// Combines an owner's own outcome with the outcome of the chain below it.
///
/// A failed send downstream is the symptom of the stage below having died, so the
/// error reported by that stage takes precedence over it.
pub(crate) fn settle(own: Result<(), SieveError>, below: StageResult) -> StageResult {
    match (own, below) {
        (Ok(()), below) => below,
        (Err(own), Ok(_)) => Err(own),
        (Err(own @ SieveError::DownstreamClosed { .. }), Err(child)) => {
            debug!(superseded = %own, "reporting downstream failure instead");
            Err(child)
        }
        (Err(own), Err(_)) => Err(own),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Writer;
    use crate::executor::{Executor, TokioExecutor, WorkerHandle};
    use crate::sink::MemorySink;
    use std::sync::Arc;

    struct Harness {
        executor: Arc<TokioExecutor>,
        sink: Arc<MemorySink>,
        writer: Writer,
        worker: WorkerHandle,
    }

    /// Spawns a lone stage for `prime` and returns the writer feeding it.
    fn spawn_stage(prime: u32, capacity: usize) -> Harness {
        let executor = Arc::new(TokioExecutor::new(capacity, None));
        let sink = Arc::new(MemorySink::new());
        let ctx = StageContext::new(executor.clone(), sink.clone());

        let (writer, reader) = executor.open_channel().unwrap();
        let task = Stage::new(prime, 1, reader, ctx).into_task();
        let worker = executor.spawn(prime, task).unwrap();
        Harness {
            executor,
            sink,
            writer,
            worker,
        }
    }

    #[tokio::test]
    async fn test_stage_emits_prime_and_filters_multiples() {
        let harness = spawn_stage(3, 4);
        for value in [5, 7, 9, 11, 13, 15] {
            harness.writer.send(value).await.unwrap();
        }
        harness.writer.close();

        let chain = harness.worker.join().await.unwrap();
        assert_eq!(harness.sink.primes(), vec![3, 5, 7, 11, 13]);

        let head = &chain[0];
        assert_eq!(head.prime, 3);
        assert_eq!(head.received, 6);
        assert_eq!(head.discarded, 2);
        assert_eq!(head.forwarded, 4);
        assert_eq!(chain.iter().map(|r| r.depth).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(harness.executor.stats().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_stage_preserves_arrival_order() {
        // Out-of-order input: each first survivor becomes the next stage's prime, so the
        // emitted order mirrors the order values were forwarded in.
        let harness = spawn_stage(2, 1);
        for value in [9, 3, 15, 5, 4] {
            harness.writer.send(value).await.unwrap();
        }
        harness.writer.close();

        let chain = harness.worker.join().await.unwrap();
        assert_eq!(harness.sink.primes(), vec![2, 9, 3, 5]);
        assert_eq!(chain[0].discarded, 1);
        assert_eq!(chain[1].prime, 9);
        assert_eq!(chain[2].discarded, 1);
    }

    #[tokio::test]
    async fn test_stage_without_input_spawns_nothing() {
        let harness = spawn_stage(31, 1);
        harness.writer.close();

        let chain = harness.worker.join().await.unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(harness.sink.primes(), vec![31]);
        assert_eq!(harness.executor.stats().workers_spawned, 1);
    }

    #[test]
    fn test_settle_prefers_root_cause() {
        let own = Err(SieveError::DownstreamClosed { candidate: 11 });
        let below = Err(SieveError::Protocol("child".to_string()));
        assert!(matches!(settle(own, below), Err(SieveError::Protocol(_))));

        let own = Err(SieveError::Config("own".to_string()));
        let below = Err(SieveError::Protocol("child".to_string()));
        assert!(matches!(settle(own, below), Err(SieveError::Config(_))));

        let below = Ok(vec![StageReport::new(5, 2)]);
        assert_eq!(settle(Ok(()), below).unwrap().len(), 1);
    }
}
