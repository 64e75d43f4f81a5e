use approx::assert_abs_diff_eq;

use greendc::core::common::{PoolClass, RejectionReason, WorkloadRequest};
use greendc::core::config::SchedulerConfig;
use greendc::core::geo::{distance_km, BaseDelayLatency, DistanceProportionalLatency, LatencyModel, Location};
use greendc::core::placement_store::CommitBackend;
use greendc::core::power_model::{LinearPowerModel, PowerModel};
use greendc::core::resource_pool::ResourcePool;
use greendc::core::scheduler::{ObjectiveWeights, PlacementScheduler, PoolVerdict};
use greendc::core::sustainability::{HourlyRecord, SustainabilityReading};

fn request(id: u32, cpu_count: u32, memory_mb: u64) -> WorkloadRequest {
    WorkloadRequest {
        id,
        cpu_count,
        memory_mb,
        latency_sensitive: false,
    }
}

fn reading(renewable_generation_mw: f64, carbon_intensity: f64, renewable_pct: f64) -> SustainabilityReading {
    SustainabilityReading {
        renewable_generation_mw,
        carbon_intensity,
        renewable_pct,
    }
}

fn pool(id: u32, latitude: f64, longitude: f64, cpus: u32) -> ResourcePool {
    ResourcePool::new(
        id,
        &format!("dc-{}", id),
        Location::new(latitude, longitude),
        cpus,
        (cpus as u64) * 4096,
        1.2,
        Box::new(LinearPowerModel::new(200., 400.)),
    )
}

fn scheduler(weights: ObjectiveWeights) -> PlacementScheduler {
    PlacementScheduler::new(
        weights,
        Location::new(0., 0.),
        100.,
        Box::new(DistanceProportionalLatency::new()),
    )
}

#[test]
// One degree of longitude along the equator spans 2*pi*6371/360 km.
fn test_haversine_distance() {
    let origin = Location::new(0., 0.);
    assert_eq!(distance_km(origin, origin), 0.);
    assert_abs_diff_eq!(distance_km(origin, Location::new(0., 1.)), 111.195, epsilon = 1e-3);
    // Symmetric.
    assert_abs_diff_eq!(
        distance_km(Location::new(48.8566, 2.3522), Location::new(52.52, 13.405)),
        distance_km(Location::new(52.52, 13.405), Location::new(48.8566, 2.3522)),
        epsilon = 1e-9
    );
}

#[test]
fn test_latency_models() {
    assert_abs_diff_eq!(DistanceProportionalLatency::new().latency_ms(100.), 10., epsilon = 1e-12);
    assert_abs_diff_eq!(BaseDelayLatency::new().latency_ms(100.), 6., epsilon = 1e-12);
    assert_abs_diff_eq!(BaseDelayLatency::with_params(2., 0.05).latency_ms(100.), 7., epsilon = 1e-12);
}

#[test]
// Linear model: idle + (max - idle) * utilization; incremental power is the
// difference between the two load levels.
fn test_linear_power_model() {
    let model = LinearPowerModel::new(200., 400.);
    assert_eq!(model.power(0.), 200.);
    assert_eq!(model.power(0.5), 300.);
    assert_eq!(model.power(1.), 400.);
    assert_abs_diff_eq!(model.incremental_power(0.2, 0.3), 20., epsilon = 1e-12);
}

#[test]
// Pools flip between green and brown as the renewable share crosses 50%.
fn test_classification_follows_state() {
    let mut pool = pool(1, 0., 0., 100);
    assert_eq!(pool.classification(), PoolClass::Brown);

    pool.update_state(reading(1., 100., 80.));
    assert_eq!(pool.classification(), PoolClass::Green);
    assert_eq!(pool.classification(), PoolClass::Green);

    pool.update_state(reading(1., 100., 30.));
    assert_eq!(pool.classification(), PoolClass::Brown);
    // Exactly at the threshold stays brown.
    pool.update_state(reading(1., 100., 50.));
    assert_eq!(pool.classification(), PoolClass::Brown);
}

#[test]
// Release is the exact inverse of allocate.
fn test_pool_capacity_accounting() {
    let mut pool = pool(1, 0., 0., 16);
    let first = request(1, 8, 16384);
    let second = request(2, 8, 16384);
    let third = request(3, 8, 16384);

    pool.allocate(&first);
    pool.allocate(&second);
    assert!(!pool.can_host(&third));
    assert_abs_diff_eq!(pool.cpu_utilization(), 1., epsilon = 1e-12);

    pool.release(&first);
    assert!(pool.can_host(&third));
    pool.release(&second);
    assert_eq!(pool.cpu_available(), 16);
    assert_eq!(pool.memory_available(), 16 * 4096);
    assert_abs_diff_eq!(pool.cpu_utilization(), 0., epsilon = 1e-12);
}

#[test]
#[should_panic(expected = "exceeds capacity")]
fn test_pool_over_allocation_panics() {
    let mut pool = pool(1, 0., 0., 4);
    pool.allocate(&request(1, 8, 1024));
}

#[test]
#[should_panic(expected = "exceeds current allocation")]
fn test_pool_over_release_panics() {
    let mut pool = pool(1, 0., 0., 4);
    pool.release(&request(1, 1, 1024));
}

#[test]
// With carbon weighted heavily, the green low-carbon pool wins even though
// both pools are equally close. Only the green pass runs.
fn test_green_pool_preferred() {
    let mut scheduler = scheduler(ObjectiveWeights::new(0.2, 0.6, 0.2));
    let mut green = pool(1, 0.09, 0., 100);
    green.update_state(reading(5., 50., 80.));
    let mut brown = pool(2, 0.09, 0., 100);
    brown.update_state(reading(0.5, 400., 10.));
    scheduler.add_pool(green);
    scheduler.add_pool(brown);

    let decision = scheduler.schedule(&request(1, 2, 4096), 0.);
    assert!(decision.success());
    assert_eq!(decision.pool_id, Some(1));
    assert_eq!(decision.pool_class, Some(PoolClass::Green));
    assert_eq!(decision.evaluations.len(), 1);
    assert_eq!(scheduler.metrics().placed_requests, 1);
    assert_eq!(scheduler.pool(1).cpu_available(), 98);
    assert_eq!(scheduler.pool(2).cpu_available(), 100);
}

#[test]
// The green pool sits ~2224 km away (20 degrees of latitude), giving ~222 ms
// against a 100 ms threshold, so the request falls back to the nearby brown pool.
fn test_latency_exclusion_falls_back_to_brown() {
    let mut scheduler = scheduler(ObjectiveWeights::new(0.2, 0.6, 0.2));
    let mut far_green = pool(1, 20., 0., 100);
    far_green.update_state(reading(5., 50., 80.));
    let mut near_brown = pool(2, 0.045, 0., 100);
    near_brown.update_state(reading(0.5, 400., 10.));
    scheduler.add_pool(far_green);
    scheduler.add_pool(near_brown);

    let decision = scheduler.schedule(&request(1, 2, 4096), 0.);
    assert_eq!(decision.pool_id, Some(2));
    assert_eq!(decision.pool_class, Some(PoolClass::Brown));
    assert_eq!(scheduler.metrics().latency_rejections, 1);

    let green_eval = decision.evaluations.iter().find(|e| e.pool_id == 1).unwrap();
    assert_eq!(
        green_eval.verdict,
        PoolVerdict::Rejected {
            reason: RejectionReason::LatencyExceeded
        }
    );
    assert!(green_eval.latency_ms > 100.);
}

#[test]
// A 2-CPU workload demands 0.1 kWh over the hour; generation of 0.00005 MW
// provides only 0.05 kWh, so the green pool is skipped.
fn test_renewable_deficit_falls_back_to_brown() {
    let mut scheduler = scheduler(ObjectiveWeights::new(0.2, 0.6, 0.2));
    let mut starved_green = pool(1, 0.09, 0., 100);
    starved_green.update_state(reading(0.00005, 50., 80.));
    let mut brown = pool(2, 0.09, 0., 100);
    brown.update_state(reading(0.5, 400., 10.));
    scheduler.add_pool(starved_green);
    scheduler.add_pool(brown);

    let decision = scheduler.schedule(&request(1, 2, 4096), 0.);
    assert_eq!(decision.pool_id, Some(2));
    assert_eq!(scheduler.metrics().renewable_rejections, 1);

    let green_eval = decision.evaluations.iter().find(|e| e.pool_id == 1).unwrap();
    assert_eq!(
        green_eval.verdict,
        PoolVerdict::Rejected {
            reason: RejectionReason::RenewableDeficit
        }
    );
}

#[test]
// No pool can host the request: both classes are evaluated, every verdict is
// a capacity rejection and the decision carries no pool.
fn test_total_failure() {
    let mut scheduler = scheduler(ObjectiveWeights::new(1., 1., 1.));
    scheduler.add_pool(pool(1, 0., 0., 10));
    scheduler.add_pool(pool(2, 0.09, 0., 10));

    let decision = scheduler.schedule(&request(1, 100, 4096), 0.);
    assert!(!decision.success());
    assert_eq!(decision.pool_id, None);
    assert_eq!(decision.score, None);
    assert_eq!(decision.evaluations.len(), 2);
    for eval in &decision.evaluations {
        assert_eq!(
            eval.verdict,
            PoolVerdict::Rejected {
                reason: RejectionReason::InsufficientCapacity
            }
        );
    }
    assert_eq!(scheduler.metrics().failed_requests, 1);
    assert_eq!(scheduler.metrics().latency_rejections, 0);
    assert_eq!(scheduler.metrics().renewable_rejections, 0);
}

#[test]
// Identical pools produce identical scores; the lowest id wins.
fn test_tie_break_lowest_pool_id() {
    let mut scheduler = scheduler(ObjectiveWeights::new(1., 1., 1.));
    for id in 1..4 {
        let mut p = pool(id, 0.09, 0., 100);
        p.update_state(reading(5., 50., 80.));
        scheduler.add_pool(p);
    }

    let decision = scheduler.schedule(&request(1, 2, 4096), 0.);
    assert_eq!(decision.pool_id, Some(1));
    assert_eq!(decision.evaluations.len(), 3);
}

#[test]
// Pool of 100 CPUs, 200-400 W linear model, PUE 1.2, observer co-located.
// A 10-CPU request raises utilization by 0.1: delta power 20 W, times PUE 24 W.
// Score = 1.0 * 24/1000 + 1.0 * 250/500 + 1.0 * 0/100 = 0.524.
fn test_weighted_score_value() {
    let mut scheduler = scheduler(ObjectiveWeights::new(1., 1., 1.));
    let mut p = pool(1, 0., 0., 100);
    p.update_state(reading(5., 250., 80.));
    scheduler.add_pool(p);

    let decision = scheduler.schedule(&request(1, 10, 4096), 0.);
    assert_abs_diff_eq!(decision.score.unwrap(), 0.524, epsilon = 1e-9);
    assert_abs_diff_eq!(decision.latency_ms.unwrap(), 0., epsilon = 1e-12);
}

#[derive(Clone)]
struct RejectingCommit;

impl CommitBackend for RejectingCommit {
    fn try_commit(&mut self, _pool_id: u32, _request: &WorkloadRequest) -> bool {
        false
    }
}

#[test]
// A refused commit rolls the optimistic reservation back and counts as an
// ordinary placement failure.
fn test_commit_refusal_rolls_back() {
    let mut scheduler = scheduler(ObjectiveWeights::new(1., 1., 1.));
    let mut p = pool(1, 0., 0., 100);
    p.update_state(reading(5., 50., 80.));
    scheduler.add_pool(p);
    scheduler.set_commit_backend(Box::new(RejectingCommit));

    let decision = scheduler.schedule(&request(1, 2, 4096), 0.);
    assert!(!decision.success());
    assert_eq!(scheduler.metrics().failed_requests, 1);
    assert_eq!(scheduler.metrics().placed_requests, 0);
    assert_eq!(scheduler.pool(1).cpu_available(), 100);
}

#[test]
// Unloaded 100-CPU pool with a 200-400 W model and PUE 1.0 draws 200 W, i.e.
// 0.2 kWh over one hour. At 50% renewable share and 300 gCO2/kWh this yields
// 0.1 renewable kWh and 0.1 * 300 / 1000 = 0.03 kg of emissions.
fn test_record_hourly_metrics() {
    let mut scheduler = scheduler(ObjectiveWeights::new(1., 1., 1.));
    let mut p = ResourcePool::new(
        1,
        "dc-1",
        Location::new(0., 0.),
        100,
        409600,
        1.0,
        Box::new(LinearPowerModel::new(200., 400.)),
    );
    p.update_state(reading(5., 300., 50.));
    scheduler.add_pool(p);

    scheduler.record_hourly_metrics(1.);
    let metrics = scheduler.metrics();
    assert_abs_diff_eq!(metrics.total_energy_kwh, 0.2, epsilon = 1e-9);
    assert_abs_diff_eq!(metrics.renewable_energy_kwh, 0.1, epsilon = 1e-9);
    assert_abs_diff_eq!(metrics.carbon_emissions_kg, 0.03, epsilon = 1e-9);
    assert_abs_diff_eq!(metrics.renewable_utilization_pct(), 50., epsilon = 1e-9);
}

#[test]
fn test_update_state_reaches_pools() {
    let mut scheduler = scheduler(ObjectiveWeights::new(1., 1., 1.));
    scheduler.add_pool(pool(1, 0., 0., 100));
    scheduler.add_pool(pool(2, 0.09, 0., 100));

    let mut record = HourlyRecord::new();
    record.insert(1, reading(5., 50., 80.));
    record.insert(2, reading(0.5, 400., 10.));
    scheduler.update_state(&record);

    assert_eq!(scheduler.pool(1).sustainability().carbon_intensity, 50.);
    assert_eq!(scheduler.pool(1).classification(), PoolClass::Green);
    assert_eq!(scheduler.pool(2).classification(), PoolClass::Brown);
}

#[test]
fn test_config_defaults() {
    let config = SchedulerConfig::from_str("{}");
    assert_eq!(config.energy_weight, 0.33);
    assert_eq!(config.carbon_weight, 0.33);
    assert_eq!(config.latency_weight, 0.34);
    assert_eq!(config.latency_threshold_ms, 100.);
    assert_eq!(config.latency_model, "distance-proportional");
    assert_eq!(config.horizon_hours, 24);
    assert_eq!(config.arrivals_per_hour, 10);
    assert!(config.sustainability_trace.is_none());
    assert!(config.pools.is_empty());
}

#[test]
// A pool entry with count > 1 expands into numbered pools sharing the prefix.
fn test_from_config_pool_expansion() {
    let config = SchedulerConfig::from_str(
        r#"
        latency_threshold_ms: 50
        pools:
          - name_prefix: edge-
            latitude: 0.0
            longitude: 0.0
            cpus: 64
            memory_gb: 256
            count: 2
          - name: core
            latitude: 1.0
            longitude: 1.0
            cpus: 128
            memory_gb: 512
            pue: 1.1
        "#,
    );
    let scheduler = PlacementScheduler::from_config(&config);
    assert_eq!(scheduler.pools().count(), 3);
    assert_eq!(scheduler.pool(1).name(), "edge-1");
    assert_eq!(scheduler.pool(2).name(), "edge-2");
    assert_eq!(scheduler.pool(3).name(), "core");
    assert_eq!(scheduler.pool(1).cpu_total(), 64);
    assert_eq!(scheduler.pool(1).memory_total(), 256 * 1024);
    assert_eq!(scheduler.pool(3).pue(), 1.1);
}
