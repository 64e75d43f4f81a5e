//! Geographic distance and network latency estimation.

use dyn_clone::{clone_trait_object, DynClone};
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.;

/// Geographic coordinates in degrees.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Great-circle distance between two points computed with the haversine formula.
pub fn distance_km(a: Location, b: Location) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlon / 2.).sin().powi(2);
    2. * EARTH_RADIUS_KM * h.sqrt().atan2((1. - h).sqrt())
}

/// Latency model converts a distance into an estimated one-way network delay.
///
/// A scheduler configuration uses a single model for every estimate it makes.
/// Mixing models within one configuration would change which pools pass the
/// latency-threshold constraint, so the model is fixed at construction.
pub trait LatencyModel: DynClone {
    fn latency_ms(&self, distance_km: f64) -> f64;
}

clone_trait_object!(LatencyModel);

pub fn latency_model_resolver(config_str: &str) -> Box<dyn LatencyModel> {
    match config_str {
        "distance-proportional" => Box::new(DistanceProportionalLatency::new()),
        "base-delay" => Box::new(BaseDelayLatency::new()),
        _ => panic!("Can't resolve latency model: {}", config_str),
    }
}

/// Latency proportional to distance with no base delay (default: 0.1 ms per km).
#[derive(Clone)]
pub struct DistanceProportionalLatency {
    ms_per_km: f64,
}

impl DistanceProportionalLatency {
    pub fn new() -> Self {
        Self { ms_per_km: 0.1 }
    }

    pub fn with_rate(ms_per_km: f64) -> Self {
        Self { ms_per_km }
    }
}

impl Default for DistanceProportionalLatency {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyModel for DistanceProportionalLatency {
    fn latency_ms(&self, distance_km: f64) -> f64 {
        distance_km * self.ms_per_km
    }
}

/// Latency with a fixed base delay on top of a smaller per-km coefficient
/// (default: 5 ms + 0.01 ms per km).
#[derive(Clone)]
pub struct BaseDelayLatency {
    base_ms: f64,
    ms_per_km: f64,
}

impl BaseDelayLatency {
    pub fn new() -> Self {
        Self {
            base_ms: 5.,
            ms_per_km: 0.01,
        }
    }

    pub fn with_params(base_ms: f64, ms_per_km: f64) -> Self {
        Self { base_ms, ms_per_km }
    }
}

impl Default for BaseDelayLatency {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyModel for BaseDelayLatency {
    fn latency_ms(&self, distance_km: f64) -> f64 {
        self.base_ms + distance_km * self.ms_per_km
    }
}
