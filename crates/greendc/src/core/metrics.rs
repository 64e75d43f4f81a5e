//! Run-scoped scheduler metrics and episode accounting.

use indexmap::IndexMap;
use serde::Serialize;

/// Counters and accumulators for a single scheduler run.
///
/// Constraint rejections are counted per evaluation event, so a request that
/// bounces off several pools bumps the corresponding counter several times.
#[derive(Serialize, Clone, Debug, Default)]
pub struct SchedulerMetrics {
    pub total_requests: u64,
    pub placed_requests: u64,
    pub failed_requests: u64,
    pub latency_rejections: u64,
    pub renewable_rejections: u64,

    pub total_response_time_ms: f64,
    pub total_energy_kwh: f64,
    pub renewable_energy_kwh: f64,
    pub carbon_emissions_kg: f64,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of consumed energy covered by renewable generation, in percent.
    pub fn renewable_utilization_pct(&self) -> f64 {
        if self.total_energy_kwh > 0. {
            self.renewable_energy_kwh / self.total_energy_kwh * 100.
        } else {
            0.
        }
    }

    pub fn mean_response_time_ms(&self) -> f64 {
        if self.placed_requests > 0 {
            self.total_response_time_ms / self.placed_requests as f64
        } else {
            0.
        }
    }

    pub fn failure_rate_pct(&self) -> f64 {
        if self.total_requests > 0 {
            self.failed_requests as f64 / self.total_requests as f64 * 100.
        } else {
            0.
        }
    }

    /// Report row with the headline indicators and raw totals.
    pub fn summary(&self) -> IndexMap<String, String> {
        let mut result = IndexMap::new();
        result.insert(
            "renewable_utilization_pct".to_string(),
            format!("{:.2}", self.renewable_utilization_pct()),
        );
        result.insert(
            "mean_response_time_ms".to_string(),
            format!("{:.2}", self.mean_response_time_ms()),
        );
        result.insert("failure_rate_pct".to_string(), format!("{:.2}", self.failure_rate_pct()));
        result.insert("total_energy_kwh".to_string(), format!("{:.3}", self.total_energy_kwh));
        result.insert(
            "renewable_energy_kwh".to_string(),
            format!("{:.3}", self.renewable_energy_kwh),
        );
        result.insert(
            "carbon_emissions_kg".to_string(),
            format!("{:.3}", self.carbon_emissions_kg),
        );
        result.insert("total_requests".to_string(), self.total_requests.to_string());
        result.insert("placed_requests".to_string(), self.placed_requests.to_string());
        result.insert("failed_requests".to_string(), self.failed_requests.to_string());
        result.insert("latency_rejections".to_string(), self.latency_rejections.to_string());
        result.insert(
            "renewable_rejections".to_string(),
            self.renewable_rejections.to_string(),
        );
        result
    }
}
