//! Resource pool state and sustainability classification.

use crate::core::common::{PoolClass, WorkloadRequest};
use crate::core::geo::Location;
use crate::core::power_model::PowerModel;
use crate::core::sustainability::SustainabilityReading;

/// Renewable percentage above which a pool is classified as green.
pub const GREEN_THRESHOLD_PCT: f64 = 50.;

/// A datacenter candidate for workload placement.
///
/// Stores capacity, current allocation and the hourly-updated sustainability
/// state. Allocation and release are exact inverses; violating the capacity
/// invariant is a caller error and panics rather than being clamped, since a
/// corrupted allocation count would skew every subsequent decision.
#[derive(Clone)]
pub struct ResourcePool {
    id: u32,
    name: String,
    location: Location,

    cpu_total: u32,
    memory_total: u64,
    cpu_used: u32,
    memory_used: u64,

    pue: f64,
    power_model: Box<dyn PowerModel>,
    sustainability: SustainabilityReading,
}

impl ResourcePool {
    /// Creates an empty pool. The sustainability state starts zeroed, so the
    /// pool is brown until the first `update_state` call.
    pub fn new(
        id: u32,
        name: &str,
        location: Location,
        cpu_total: u32,
        memory_total: u64,
        pue: f64,
        power_model: Box<dyn PowerModel>,
    ) -> Self {
        assert!(cpu_total > 0, "pool {} has zero CPU capacity", id);
        assert!(memory_total > 0, "pool {} has zero memory capacity", id);
        Self {
            id,
            name: name.to_string(),
            location,
            cpu_total,
            memory_total,
            cpu_used: 0,
            memory_used: 0,
            pue,
            power_model,
            sustainability: SustainabilityReading::default(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn cpu_total(&self) -> u32 {
        self.cpu_total
    }

    pub fn memory_total(&self) -> u64 {
        self.memory_total
    }

    pub fn cpu_available(&self) -> u32 {
        self.cpu_total - self.cpu_used
    }

    pub fn memory_available(&self) -> u64 {
        self.memory_total - self.memory_used
    }

    pub fn pue(&self) -> f64 {
        self.pue
    }

    pub fn sustainability(&self) -> SustainabilityReading {
        self.sustainability
    }

    /// Checks if the pool has both CPU and memory headroom for the request.
    pub fn can_host(&self, request: &WorkloadRequest) -> bool {
        self.cpu_available() >= request.cpu_count && self.memory_available() >= request.memory_mb
    }

    /// Reserves the request's resources. The caller must check `can_host` first.
    pub fn allocate(&mut self, request: &WorkloadRequest) {
        assert!(
            self.can_host(request),
            "pool {}: allocation of workload {} exceeds capacity",
            self.id,
            request.id
        );
        self.cpu_used += request.cpu_count;
        self.memory_used += request.memory_mb;
    }

    /// Releases a previously allocated request. Exact inverse of `allocate`.
    pub fn release(&mut self, request: &WorkloadRequest) {
        assert!(
            self.cpu_used >= request.cpu_count && self.memory_used >= request.memory_mb,
            "pool {}: release of workload {} exceeds current allocation",
            self.id,
            request.id
        );
        self.cpu_used -= request.cpu_count;
        self.memory_used -= request.memory_mb;
    }

    pub fn cpu_utilization(&self) -> f64 {
        self.cpu_used as f64 / self.cpu_total as f64
    }

    pub fn memory_utilization(&self) -> f64 {
        self.memory_used as f64 / self.memory_total as f64
    }

    /// Classification is derived fresh from the current renewable percentage,
    /// never cached, since the sustainability state changes every hour.
    pub fn classification(&self) -> PoolClass {
        if self.sustainability.renewable_pct > GREEN_THRESHOLD_PCT {
            PoolClass::Green
        } else {
            PoolClass::Brown
        }
    }

    /// Overwrites the sustainability state from an external data feed.
    pub fn update_state(&mut self, reading: SustainabilityReading) {
        self.sustainability = reading;
    }

    /// Current power draw in Watts (before PUE).
    pub fn power_w(&self) -> f64 {
        self.power_model.power(self.cpu_utilization())
    }

    /// Marginal power draw in Watts implied by admitting the request (before PUE).
    pub fn incremental_power_w(&self, request: &WorkloadRequest) -> f64 {
        let util_after = (self.cpu_used + request.cpu_count) as f64 / self.cpu_total as f64;
        self.power_model.incremental_power(self.cpu_utilization(), util_after)
    }

    /// Energy consumed over the given window in kWh, PUE applied.
    pub fn energy_kwh(&self, hours: f64) -> f64 {
        self.power_w() * hours / 1000. * self.pue
    }
}
