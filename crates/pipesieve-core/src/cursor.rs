//! Cursor: one owner's reference to its (possibly not yet created) downstream stage.
//!
//! ```text
//! Uninitialized ──first forward──▶ Active ──close──▶ Closed
//! ```
//!
//! The driver owns one cursor and every stage owns one. Nothing else ever touches it.
use tracing::{error, trace};

use crate::channel::Writer;
use crate::context::StageContext;
use crate::error::SieveError;
use crate::executor::{StageResult, WorkerHandle};
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Uninitialized,
    Active,
    Closed,
}

#[derive(Debug, Default)]
pub enum Cursor {
    #[default]
    Uninitialized,
    Active {
        writer: Writer,
        worker: WorkerHandle,
    },
    Closed,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CursorState {
        match self {
            Self::Uninitialized => CursorState::Uninitialized,
            Self::Active { .. } => CursorState::Active,
            Self::Closed => CursorState::Closed,
        }
    }

    /// Lazy-forward: the first value opens a channel and spawns a stage at `depth` whose
    /// prime is `value`; later values are plain sends to that stage.
    pub async fn forward(
        &mut self,
        value: u32,
        depth: usize,
        ctx: &StageContext,
    ) -> Result<(), SieveError> {
        match self {
            Self::Active { writer, .. } => writer
                .send(value)
                .await
                .map_err(|_| SieveError::DownstreamClosed { candidate: value }),
            Self::Closed => Err(SieveError::Protocol(format!(
                "forward of {} into a closed cursor",
                value
            ))),
            Self::Uninitialized => {
                let (writer, reader) = ctx.executor().open_channel().map_err(|source| {
                    error!(candidate = value, %source, "channel creation failed");
                    SieveError::ChannelCreation {
                        candidate: value,
                        source,
                    }
                })?;

                // The reader moves into the new stage; this side keeps only the writer.
                let task = Stage::new(value, depth, reader, ctx.clone()).into_task();
                let worker = ctx.executor().spawn(value, task).map_err(|source| {
                    error!(candidate = value, %source, "stage spawn failed");
                    SieveError::Spawn {
                        candidate: value,
                        source,
                    }
                })?;

                trace!(prime = value, depth, "stage attached");
                *self = Self::Active { writer, worker };
                Ok(())
            }
        }
    }

    /// Drops the writer so the downstream stage sees end-of-stream, and hands back its
    /// worker for joining. A no-op on a cursor that is not active.
    pub fn close(&mut self) -> Option<WorkerHandle> {
        match std::mem::replace(self, Self::Closed) {
            Self::Active { writer, worker } => {
                writer.close();
                Some(worker)
            }
            Self::Uninitialized | Self::Closed => None,
        }
    }

    /// Closes the cursor and joins the downstream stage, returning the reports of that
    /// stage and everything below it.
    pub async fn shutdown(&mut self) -> StageResult {
        match self.close() {
            Some(worker) => worker.join().await,
            None => Ok(Vec::new()),
        }
    }
}
