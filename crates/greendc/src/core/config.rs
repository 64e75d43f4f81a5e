//! Scheduler and episode configuration.

use serde::{Deserialize, Serialize};

/// Holds raw config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawSchedulerConfig {
    pub energy_weight: Option<f64>,
    pub carbon_weight: Option<f64>,
    pub latency_weight: Option<f64>,
    pub observer_latitude: Option<f64>,
    pub observer_longitude: Option<f64>,
    pub latency_threshold_ms: Option<f64>,
    pub latency_model: Option<String>,
    pub horizon_hours: Option<u64>,
    pub arrivals_per_hour: Option<u32>,
    pub sustainability_trace: Option<String>,
    pub pools: Option<Vec<PoolConfig>>,
}

/// Holds configuration of a single resource pool or a set of identical pools.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PoolConfig {
    /// Pool name.
    /// Should be set if count = 1.
    pub name: Option<String>,
    /// Pool name prefix.
    /// Full name is produced by appending the pool instance number to the prefix.
    /// Should be set if count > 1.
    pub name_prefix: Option<String>,
    /// Pool latitude in degrees.
    pub latitude: f64,
    /// Pool longitude in degrees.
    pub longitude: f64,
    /// Pool CPU capacity.
    pub cpus: u32,
    /// Pool memory capacity in GB.
    pub memory_gb: u64,
    /// Power usage effectiveness multiplier.
    pub pue: Option<f64>,
    /// Power draw at zero CPU load in Watts.
    pub power_idle_w: Option<f64>,
    /// Power draw at full CPU load in Watts.
    pub power_max_w: Option<f64>,
    /// Number of such pools.
    pub count: Option<u32>,
}

/// Represents scheduler and episode configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Relative importance of the energy objective.
    pub energy_weight: f64,
    /// Relative importance of the carbon objective.
    pub carbon_weight: f64,
    /// Relative importance of the latency objective.
    pub latency_weight: f64,
    /// Observer (user) latitude used for distance calculation.
    pub observer_latitude: f64,
    /// Observer (user) longitude used for distance calculation.
    pub observer_longitude: f64,
    /// Maximum acceptable latency in milliseconds.
    pub latency_threshold_ms: f64,
    /// Latency model used for every estimate of this scheduler.
    pub latency_model: String,
    /// Length of an evaluation episode in hours.
    pub horizon_hours: u64,
    /// Number of workload arrivals generated per hour.
    pub arrivals_per_hour: u32,
    /// Optional path to a CSV sustainability feed.
    pub sustainability_trace: Option<String>,
    /// Configurations of resource pools.
    pub pools: Vec<PoolConfig>,
}

impl SchedulerConfig {
    /// Creates config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Self {
        Self::from_str(
            &std::fs::read_to_string(file_name).unwrap_or_else(|_| panic!("Can't read file {}", file_name)),
        )
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        let raw: RawSchedulerConfig =
            serde_yaml::from_str(content).unwrap_or_else(|err| panic!("Can't parse YAML config: {}", err));

        Self {
            energy_weight: raw.energy_weight.unwrap_or(0.33),
            carbon_weight: raw.carbon_weight.unwrap_or(0.33),
            latency_weight: raw.latency_weight.unwrap_or(0.34),
            observer_latitude: raw.observer_latitude.unwrap_or(48.8566),
            observer_longitude: raw.observer_longitude.unwrap_or(2.3522),
            latency_threshold_ms: raw.latency_threshold_ms.unwrap_or(100.),
            latency_model: raw
                .latency_model
                .unwrap_or_else(|| "distance-proportional".to_string()),
            horizon_hours: raw.horizon_hours.unwrap_or(24),
            arrivals_per_hour: raw.arrivals_per_hour.unwrap_or(10),
            sustainability_trace: raw.sustainability_trace,
            pools: raw.pools.unwrap_or_default(),
        }
    }
}
