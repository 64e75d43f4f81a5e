//! Placement scheduler: pool classification, constraint filtering and
//! weighted multi-objective scoring.

use std::collections::BTreeMap;
use std::fs::File;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::common::{PoolClass, RejectionReason, WorkloadRequest};
use crate::core::config::SchedulerConfig;
use crate::core::geo::{distance_km, latency_model_resolver, LatencyModel, Location};
use crate::core::metrics::SchedulerMetrics;
use crate::core::placement_store::{CommitBackend, DirectCommit};
use crate::core::power_model::LinearPowerModel;
use crate::core::resource_pool::ResourcePool;
use crate::core::sustainability::HourlyRecord;

/// Assumed full-load draw of a single requested core, used to estimate the
/// hourly energy demand of a workload for the renewable-availability check.
const WATTS_PER_CORE: f64 = 50.;

// Reference scales dividing each raw objective so that weights stay
// comparable across runs.
const ENERGY_SCALE_W: f64 = 1000.;
const CARBON_SCALE_GCO2_KWH: f64 = 500.;
const LATENCY_SCALE_MS: f64 = 100.;

/// Relative importances of the three objectives. They do not need to sum to one.
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ObjectiveWeights {
    pub energy: f64,
    pub carbon: f64,
    pub latency: f64,
}

impl ObjectiveWeights {
    pub fn new(energy: f64, carbon: f64, latency: f64) -> Self {
        assert!(
            energy >= 0. && carbon >= 0. && latency >= 0.,
            "objective weights must be non-negative"
        );
        Self {
            energy,
            carbon,
            latency,
        }
    }
}

/// Outcome of evaluating a single pool for a single request.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PoolEvaluation {
    pub pool_id: u32,
    pub class: PoolClass,
    pub distance_km: f64,
    pub latency_ms: f64,
    pub verdict: PoolVerdict,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub enum PoolVerdict {
    Candidate { score: f64 },
    Rejected { reason: RejectionReason },
}

impl PoolEvaluation {
    pub fn score(&self) -> Option<f64> {
        match self.verdict {
            PoolVerdict::Candidate { score } => Some(score),
            PoolVerdict::Rejected { .. } => None,
        }
    }
}

/// Audit record of a single scheduling call. Created once, never mutated.
#[derive(Serialize, Clone, Debug)]
pub struct PlacementDecision {
    pub request_id: u32,
    pub pool_id: Option<u32>,
    pub pool_class: Option<PoolClass>,
    pub distance_km: Option<f64>,
    pub latency_ms: Option<f64>,
    pub score: Option<f64>,
    pub time: f64,
    /// Per-pool evaluations of the passes that actually ran.
    pub evaluations: Vec<PoolEvaluation>,
}

impl PlacementDecision {
    pub fn success(&self) -> bool {
        self.pool_id.is_some()
    }
}

/// One candidate-generation pass over a class of pools.
///
/// The green pass runs first; the brown pass runs only when the green pass
/// yields no candidate. Brown pools are exempt from the renewable check by
/// definition. New fallback policies are added here without touching the
/// scoring logic.
struct PlacementPass {
    class: PoolClass,
    check_renewables: bool,
}

const PASSES: [PlacementPass; 2] = [
    PlacementPass {
        class: PoolClass::Green,
        check_renewables: true,
    },
    PlacementPass {
        class: PoolClass::Brown,
        check_renewables: false,
    },
];

/// Assigns each workload request to the best-scoring feasible pool.
///
/// Owns its resource pools and processes one request at a time. A rejected
/// request is never retried here; retry policy belongs to the caller.
pub struct PlacementScheduler {
    weights: ObjectiveWeights,
    observer: Location,
    latency_threshold_ms: f64,
    latency_model: Box<dyn LatencyModel>,
    pools: BTreeMap<u32, ResourcePool>,
    commit_backend: Box<dyn CommitBackend>,
    metrics: SchedulerMetrics,
    decisions: Vec<PlacementDecision>,
}

impl PlacementScheduler {
    pub fn new(
        weights: ObjectiveWeights,
        observer: Location,
        latency_threshold_ms: f64,
        latency_model: Box<dyn LatencyModel>,
    ) -> Self {
        Self {
            weights,
            observer,
            latency_threshold_ms,
            latency_model,
            pools: BTreeMap::new(),
            commit_backend: Box::new(DirectCommit::new()),
            metrics: SchedulerMetrics::new(),
            decisions: Vec::new(),
        }
    }

    /// Creates a scheduler with its pools from a configuration.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        let mut scheduler = Self::new(
            ObjectiveWeights::new(config.energy_weight, config.carbon_weight, config.latency_weight),
            Location::new(config.observer_latitude, config.observer_longitude),
            config.latency_threshold_ms,
            latency_model_resolver(&config.latency_model),
        );
        let mut next_id = 1;
        for pool_config in &config.pools {
            let count = pool_config.count.unwrap_or(1);
            for i in 0..count {
                let name = if count == 1 {
                    pool_config
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("pool-{}", next_id))
                } else {
                    let prefix = pool_config.name_prefix.clone().unwrap_or_else(|| "pool-".to_string());
                    format!("{}{}", prefix, i + 1)
                };
                scheduler.add_pool(ResourcePool::new(
                    next_id,
                    &name,
                    Location::new(pool_config.latitude, pool_config.longitude),
                    pool_config.cpus,
                    pool_config.memory_gb * 1024,
                    pool_config.pue.unwrap_or(1.2),
                    Box::new(LinearPowerModel::new(
                        pool_config.power_idle_w.unwrap_or(200.),
                        pool_config.power_max_w.unwrap_or(400.),
                    )),
                ));
                next_id += 1;
            }
        }
        scheduler
    }

    pub fn add_pool(&mut self, pool: ResourcePool) {
        self.pools.insert(pool.id(), pool);
    }

    pub fn set_commit_backend(&mut self, backend: Box<dyn CommitBackend>) {
        self.commit_backend = backend;
    }

    pub fn pool(&self, id: u32) -> &ResourcePool {
        &self.pools[&id]
    }

    pub fn pools(&self) -> impl Iterator<Item = &ResourcePool> {
        self.pools.values()
    }

    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    pub fn decisions(&self) -> &[PlacementDecision] {
        &self.decisions
    }

    /// Applies hourly sustainability readings to the matching pools.
    pub fn update_state(&mut self, record: &HourlyRecord) {
        for (pool_id, reading) in record {
            if let Some(pool) = self.pools.get_mut(pool_id) {
                pool.update_state(*reading);
            }
        }
    }

    /// Places the request on the best-scoring feasible pool, or records a failure.
    ///
    /// Pools are evaluated green-first; the winning candidate has the lowest
    /// weighted score, ties broken by lowest pool id (pools are visited in
    /// ascending id order and only a strictly lower score replaces the
    /// current best).
    pub fn schedule(&mut self, request: &WorkloadRequest, now: f64) -> PlacementDecision {
        self.metrics.total_requests += 1;

        let mut evaluations: Vec<PoolEvaluation> = Vec::new();
        let mut winner: Option<PoolEvaluation> = None;

        for pass in &PASSES {
            let mut pass_evals: Vec<PoolEvaluation> = Vec::new();
            for pool in self.pools.values() {
                if pool.classification() != pass.class {
                    continue;
                }
                pass_evals.push(self.evaluate_pool(pool, request, pass.check_renewables));
            }

            for eval in &pass_evals {
                match eval.verdict {
                    PoolVerdict::Rejected {
                        reason: RejectionReason::LatencyExceeded,
                    } => self.metrics.latency_rejections += 1,
                    PoolVerdict::Rejected {
                        reason: RejectionReason::RenewableDeficit,
                    } => self.metrics.renewable_rejections += 1,
                    _ => {}
                }
            }

            let mut best: Option<PoolEvaluation> = None;
            for eval in &pass_evals {
                if let Some(score) = eval.score() {
                    let replace = match &best {
                        Some(current) => score < current.score().unwrap(),
                        None => true,
                    };
                    if replace {
                        best = Some(eval.clone());
                    }
                }
            }
            evaluations.extend(pass_evals);

            if best.is_some() {
                winner = best;
                break;
            }
        }

        if let Some(best) = winner {
            self.pools.get_mut(&best.pool_id).unwrap().allocate(request);
            if self.commit_backend.try_commit(best.pool_id, request) {
                self.metrics.placed_requests += 1;
                self.metrics.total_response_time_ms += best.latency_ms;
                debug!(
                    "placed workload {} on pool {} ({:?}, score {:.3})",
                    request.id,
                    best.pool_id,
                    best.class,
                    best.score().unwrap()
                );
                let decision = PlacementDecision {
                    request_id: request.id,
                    pool_id: Some(best.pool_id),
                    pool_class: Some(best.class),
                    distance_km: Some(best.distance_km),
                    latency_ms: Some(best.latency_ms),
                    score: best.score(),
                    time: now,
                    evaluations,
                };
                self.decisions.push(decision.clone());
                return decision;
            }
            warn!(
                "downstream rejected commit of workload {} to pool {}",
                request.id, best.pool_id
            );
            self.pools.get_mut(&best.pool_id).unwrap().release(request);
        }

        self.metrics.failed_requests += 1;
        debug!("failed to place workload {}", request.id);
        let decision = PlacementDecision {
            request_id: request.id,
            pool_id: None,
            pool_class: None,
            distance_km: None,
            latency_ms: None,
            score: None,
            time: now,
            evaluations,
        };
        self.decisions.push(decision.clone());
        decision
    }

    fn evaluate_pool(&self, pool: &ResourcePool, request: &WorkloadRequest, check_renewables: bool) -> PoolEvaluation {
        let distance = distance_km(self.observer, pool.location());
        let latency = self.latency_model.latency_ms(distance);

        let verdict = if !pool.can_host(request) {
            PoolVerdict::Rejected {
                reason: RejectionReason::InsufficientCapacity,
            }
        } else if latency > self.latency_threshold_ms {
            PoolVerdict::Rejected {
                reason: RejectionReason::LatencyExceeded,
            }
        } else if check_renewables && !Self::renewable_margin_ok(pool, request) {
            PoolVerdict::Rejected {
                reason: RejectionReason::RenewableDeficit,
            }
        } else {
            PoolVerdict::Candidate {
                score: self.weighted_score(pool, request, latency),
            }
        };

        PoolEvaluation {
            pool_id: pool.id(),
            class: pool.classification(),
            distance_km: distance,
            latency_ms: latency,
            verdict,
        }
    }

    /// Compares the workload's estimated hourly energy demand against the
    /// pool's renewable generation over the same 1-hour window.
    fn renewable_margin_ok(pool: &ResourcePool, request: &WorkloadRequest) -> bool {
        let demand_kwh = request.cpu_count as f64 * WATTS_PER_CORE / 1000.;
        let available_kwh = pool.sustainability().renewable_generation_mw * 1000.;
        available_kwh > demand_kwh
    }

    /// Weighted sum of the normalized objectives. Lower is better.
    fn weighted_score(&self, pool: &ResourcePool, request: &WorkloadRequest, latency_ms: f64) -> f64 {
        let incremental_power_w = pool.incremental_power_w(request) * pool.pue();
        let norm_energy = incremental_power_w / ENERGY_SCALE_W;
        let norm_carbon = pool.sustainability().carbon_intensity / CARBON_SCALE_GCO2_KWH;
        let norm_latency = latency_ms / LATENCY_SCALE_MS;
        self.weights.energy * norm_energy + self.weights.carbon * norm_carbon + self.weights.latency * norm_latency
    }

    /// Accumulates energy, renewable share and carbon emissions of all pools
    /// over the given window into the run metrics.
    pub fn record_hourly_metrics(&mut self, hours: f64) {
        for pool in self.pools.values() {
            let energy_kwh = pool.energy_kwh(hours);
            let renewable_kwh = energy_kwh * pool.sustainability().renewable_pct / 100.;
            let brown_kwh = energy_kwh - renewable_kwh;
            self.metrics.total_energy_kwh += energy_kwh;
            self.metrics.renewable_energy_kwh += renewable_kwh;
            self.metrics.carbon_emissions_kg += brown_kwh * pool.sustainability().carbon_intensity / 1000.;
        }
    }

    /// Saves the accumulated decision log as CSV (without per-pool evaluations).
    pub fn save_decisions(&self, path: &str) -> Result<(), std::io::Error> {
        let file = File::create(path)?;
        let mut wtr = csv::Writer::from_writer(file);
        for decision in &self.decisions {
            wtr.serialize(DecisionRow {
                time: decision.time,
                request_id: decision.request_id,
                pool_id: decision.pool_id,
                pool_class: decision.pool_class,
                distance_km: decision.distance_km,
                latency_ms: decision.latency_ms,
                score: decision.score,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct DecisionRow {
    time: f64,
    request_id: u32,
    pool_id: Option<u32>,
    pool_class: Option<PoolClass>,
    distance_km: Option<f64>,
    latency_ms: Option<f64>,
    score: Option<f64>,
}
