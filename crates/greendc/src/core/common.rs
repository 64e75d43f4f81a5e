use serde::{Deserialize, Serialize};

/// Workload (VM) request. Immutable once created and consumed exactly once
/// by the scheduler, which either places it on a single pool or rejects it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorkloadRequest {
    pub id: u32,
    pub cpu_count: u32,
    pub memory_mb: u64,
    /// Marks requests for which latency is the dominant concern.
    /// Carried through decision records for downstream analysis.
    pub latency_sensitive: bool,
}

/// Pool classification derived from the current renewable percentage.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolClass {
    Green,
    Brown,
}

/// Reason for rejecting a pool during candidate generation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    /// Not enough free CPU or memory.
    /// A hard precondition, recorded but not counted as a constraint rejection.
    InsufficientCapacity,
    /// Estimated latency exceeds the configured threshold.
    LatencyExceeded,
    /// Green pool without enough renewable generation to cover the workload draw.
    RenewableDeficit,
}
