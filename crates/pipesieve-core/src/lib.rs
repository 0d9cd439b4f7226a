//! Pipesieve Core: a prime sieve grown as a chain of concurrent filter stages.
//!
//! # Pipeline Flow
//!
//! ```text
//! Driver(2) ──▶ Stage(3) ──▶ Stage(5) ──▶ Stage(7) ──▶ ...
//!   odd n        n % 3 != 0   n % 5 != 0   n % 7 != 0
//! ```
//!
//! Each stage is spawned by the first value that reaches its parent's cursor, emits that
//! value as a prime, and forwards every value its prime does not divide. Shutdown runs
//! bottom-up: closing a cursor ends the stream for the stage below, and every owner joins
//! its child before it terminates.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pipesieve_core::{MemorySink, SieveConfig, SieveDriver};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let sink = Arc::new(MemorySink::new());
//! let driver = SieveDriver::with_tokio(SieveConfig::new(10), sink.clone()).unwrap();
//! let report = driver.drive().await.unwrap();
//!
//! assert_eq!(sink.primes(), vec![2, 3, 5, 7]);
//! assert_eq!(report.workers.outstanding(), 0);
//! # });
//! ```

pub mod channel;
pub mod config;
pub mod context;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod executor;
pub mod report;
pub mod sink;
pub mod stage;

use std::sync::Arc;

pub use channel::{channel, ChannelClosed, Reader, Writer};
pub use config::{SieveConfig, BASE_PRIME, DEFAULT_CHANNEL_CAPACITY, DEFAULT_LIMIT};
pub use context::StageContext;
pub use cursor::{Cursor, CursorState};
pub use driver::SieveDriver;
pub use error::{ErrorKind, ResourceError, SieveError};
pub use executor::{
    Counters, Executor, ExecutorStats, StageResult, StageTask, TokioExecutor, WorkerHandle,
};
pub use report::{SieveReport, StageReport};
pub use sink::{MemorySink, PrimeSink, WriterSink};
pub use stage::Stage;

/// Pipesieve version
pub const PIPESIEVE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs the pipeline up to `limit` with default settings and returns the primes found.
pub async fn primes_up_to(limit: u32) -> Result<Vec<u32>, SieveError> {
    let sink = Arc::new(MemorySink::new());
    let driver = SieveDriver::with_tokio(SieveConfig::new(limit), sink.clone())?;
    driver.drive().await?;
    Ok(sink.primes())
}
