//! Commit backends modeling the downstream admission decision.

use dyn_clone::{clone_trait_object, DynClone};

use crate::core::common::WorkloadRequest;

/// The scheduler's own capacity check is a prediction, not a guarantee: the
/// component that physically admits a workload may still refuse it. The
/// scheduler reserves capacity optimistically, submits the decision here and
/// rolls the reservation back on refusal, treating it as an ordinary
/// placement failure.
pub trait CommitBackend: DynClone {
    fn try_commit(&mut self, pool_id: u32, request: &WorkloadRequest) -> bool;
}

clone_trait_object!(CommitBackend);

/// Backend that accepts every commit, for self-contained runs.
#[derive(Clone, Default)]
pub struct DirectCommit;

impl DirectCommit {
    pub fn new() -> Self {
        Self {}
    }
}

impl CommitBackend for DirectCommit {
    fn try_commit(&mut self, _pool_id: u32, _request: &WorkloadRequest) -> bool {
        true
    }
}
