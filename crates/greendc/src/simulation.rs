//! Episode driver running a scheduler over an hourly workload stream.

use indexmap::IndexMap;
use log::info;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::core::common::WorkloadRequest;
use crate::core::scheduler::PlacementScheduler;
use crate::core::sustainability::SustainabilityDataset;

/// Source of workload requests, queried once per simulated hour.
pub trait WorkloadSource {
    /// Returns the workload requests arriving within the given hour.
    fn requests_for_hour(&mut self, hour: u64) -> Vec<WorkloadRequest>;
}

/// Generates a fixed number of random requests per hour
/// (1-7 CPUs, 2-15 GB of memory), deterministic for a given seed.
pub struct RandomWorkload {
    arrivals_per_hour: u32,
    next_id: u32,
    rng: Pcg64,
}

impl RandomWorkload {
    pub fn new(seed: u64, arrivals_per_hour: u32) -> Self {
        Self {
            arrivals_per_hour,
            next_id: 1,
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl WorkloadSource for RandomWorkload {
    fn requests_for_hour(&mut self, _hour: u64) -> Vec<WorkloadRequest> {
        let mut requests = Vec::with_capacity(self.arrivals_per_hour as usize);
        for _ in 0..self.arrivals_per_hour {
            requests.push(WorkloadRequest {
                id: self.next_id,
                cpu_count: self.rng.gen_range(1..8),
                memory_mb: self.rng.gen_range(2..16) * 1024,
                latency_sensitive: self.rng.gen_bool(0.25),
            });
            self.next_id += 1;
        }
        requests
    }
}

/// Result of a completed evaluation episode.
pub struct EpisodeOutcome {
    /// Minimized objective vector: total energy (kWh), carbon emissions (kg),
    /// mean response time (ms).
    pub objectives: Vec<f64>,
    pub summary: IndexMap<String, String>,
}

/// Drives one scheduler through an episode: every simulated hour the pool
/// sustainability states are refreshed from the data feed, the hour's workload
/// arrivals are scheduled one at a time, and the hourly energy and carbon
/// accounting is recorded.
pub struct PlacementSimulation {
    scheduler: PlacementScheduler,
    dataset: Box<dyn SustainabilityDataset>,
    workload: Box<dyn WorkloadSource>,
    horizon_hours: u64,
}

impl PlacementSimulation {
    pub fn new(
        scheduler: PlacementScheduler,
        dataset: Box<dyn SustainabilityDataset>,
        workload: Box<dyn WorkloadSource>,
        horizon_hours: u64,
    ) -> Self {
        Self {
            scheduler,
            dataset,
            workload,
            horizon_hours,
        }
    }

    pub fn scheduler(&self) -> &PlacementScheduler {
        &self.scheduler
    }

    /// Runs the episode to completion and returns the objective vector fed to
    /// the Pareto front.
    pub fn run(&mut self) -> EpisodeOutcome {
        for hour in 0..self.horizon_hours {
            if let Some(record) = self.dataset.hourly_record(hour as usize) {
                self.scheduler.update_state(&record);
            }
            for request in self.workload.requests_for_hour(hour) {
                self.scheduler.schedule(&request, hour as f64);
            }
            self.scheduler.record_hourly_metrics(1.);
        }

        let metrics = self.scheduler.metrics();
        info!(
            "episode finished: {} placed, {} failed, {:.3} kWh, {:.3} kg CO2",
            metrics.placed_requests, metrics.failed_requests, metrics.total_energy_kwh, metrics.carbon_emissions_kg
        );
        EpisodeOutcome {
            objectives: vec![
                metrics.total_energy_kwh,
                metrics.carbon_emissions_kg,
                metrics.mean_response_time_ms(),
            ],
            summary: metrics.summary(),
        }
    }
}
