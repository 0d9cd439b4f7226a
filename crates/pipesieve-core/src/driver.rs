//! Pipeline Driver: feeds candidates into the head of the stage chain
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};

use crate::config::{SieveConfig, BASE_PRIME};
use crate::context::StageContext;
use crate::cursor::Cursor;
use crate::error::SieveError;
use crate::executor::{Executor, StageResult, TokioExecutor};
use crate::report::SieveReport;
use crate::sink::PrimeSink;
use crate::stage::settle;

pub struct SieveDriver {
    config: SieveConfig,
    ctx: StageContext,
}

impl SieveDriver {
    /// Driver on a caller-supplied executor. Only `config.limit` is read here;
    /// channel capacity and worker ceiling are whatever `executor` enforces.
    pub fn new(config: SieveConfig, executor: Arc<dyn Executor>, sink: Arc<dyn PrimeSink>) -> Self {
        let ctx = StageContext::new(executor, sink);
        Self { config, ctx }
    }

    /// Driver backed by a [`TokioExecutor`] built from `config`.
    pub fn with_tokio(config: SieveConfig, sink: Arc<dyn PrimeSink>) -> Result<Self, SieveError> {
        config.validate()?;
        let executor = Arc::new(TokioExecutor::from_config(&config));
        Ok(Self::new(config, executor, sink))
    }

    pub fn config(&self) -> &SieveConfig {
        &self.config
    }

    pub fn run_id(&self) -> &str {
        &self.ctx.run_id
    }

    /// Emits the base prime, pushes every odd candidate up to the limit through the
    /// top-level cursor, then closes it and waits for the whole chain to unwind.
    ///
    /// Returns only after every stage spawned during the run has been joined, whether
    /// the run succeeded or not. A driver runs once; `workers` in the report counts only
    /// this run's allocations, even when the executor is shared with other drivers.
    pub async fn drive(self) -> Result<SieveReport, SieveError> {
        let span = info_span!("sieve", run_id = %self.ctx.run_id, limit = self.config.limit);
        self.drive_inner().instrument(span).await
    }

    async fn drive_inner(&self) -> Result<SieveReport, SieveError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let baseline = self.ctx.executor().stats();

        let stages = if self.config.limit < BASE_PRIME {
            Vec::new()
        } else {
            self.ctx.emit(BASE_PRIME)?;
            let mut cursor = Cursor::new();
            let fed = self.feed(&mut cursor).await;
            let chain: StageResult = cursor.shutdown().await;
            settle(fed, chain).map_err(|err| {
                error!(error = %err, candidate = ?err.candidate(), "sieve run failed");
                err
            })?
        };

        let mut primes = Vec::with_capacity(stages.len() + 1);
        if self.config.limit >= BASE_PRIME {
            primes.push(BASE_PRIME);
        }
        primes.extend(stages.iter().map(|stage| stage.prime));

        let report = SieveReport {
            run_id: self.ctx.run_id.clone(),
            started_at,
            limit: self.config.limit,
            primes,
            stages,
            workers: self.ctx.executor().stats().since(&baseline),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            primes = report.primes.len(),
            stages = report.stage_count(),
            elapsed_ms = report.elapsed_ms,
            "sieve run complete"
        );
        Ok(report)
    }

    async fn feed(&self, cursor: &mut Cursor) -> Result<(), SieveError> {
        for candidate in (BASE_PRIME + 1)..=self.config.limit {
            if candidate % BASE_PRIME == 0 {
                continue;
            }
            cursor.forward(candidate, 1, &self.ctx).await?;
        }
        Ok(())
    }
}
