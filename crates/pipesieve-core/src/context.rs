//! Stage Context: what every stage of one run shares
use std::sync::Arc;

use crate::error::SieveError;
use crate::executor::Executor;
use crate::sink::PrimeSink;

/// Cheap to clone; each stage gets its own copy.
#[derive(Clone)]
pub struct StageContext {
    pub run_id: String,
    executor: Arc<dyn Executor>,
    sink: Arc<dyn PrimeSink>,
}

impl StageContext {
    pub fn new(executor: Arc<dyn Executor>, sink: Arc<dyn PrimeSink>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            executor,
            sink,
        }
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    pub fn emit(&self, prime: u32) -> Result<(), SieveError> {
        self.sink.emit(prime)
    }
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}
