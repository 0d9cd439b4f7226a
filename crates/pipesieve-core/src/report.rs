//! Data Model: per-stage and per-run reports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::executor::ExecutorStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// First value the stage received
    pub prime: u32,
    /// Position in the chain; the driver's first stage is depth 1
    pub depth: usize,
    /// Values read from upstream (the prime itself excluded)
    pub received: u64,
    /// Multiples of `prime` dropped
    pub discarded: u64,
    /// Survivors pushed downstream
    pub forwarded: u64,
}

impl StageReport {
    pub fn new(prime: u32, depth: usize) -> Self {
        Self {
            prime,
            depth,
            received: 0,
            discarded: 0,
            forwarded: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SieveReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub limit: u32,
    /// Every prime emitted, base prime first
    pub primes: Vec<u32>,
    /// One entry per stage, ordered by depth
    pub stages: Vec<StageReport>,
    pub workers: ExecutorStats,
    pub elapsed_ms: u64,
}

impl SieveReport {
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}
