//! Pool power consumption models.

use dyn_clone::{clone_trait_object, DynClone};

/// Power model is a function, which computes the power draw of a resource pool
/// based on its current CPU utilization.
pub trait PowerModel: DynClone {
    /// Returns the pool power draw in Watts at the given CPU utilization.
    fn power(&self, cpu_utilization: f64) -> f64;

    /// Marginal power draw implied by a utilization change.
    fn incremental_power(&self, util_before: f64, util_after: f64) -> f64 {
        self.power(util_after) - self.power(util_before)
    }
}

clone_trait_object!(PowerModel);

/// Linear interpolation between idle and maximum power.
///
/// A pool is never powered off, so idle power is drawn even at zero load.
#[derive(Clone)]
pub struct LinearPowerModel {
    idle_power_w: f64,
    max_power_w: f64,
}

impl LinearPowerModel {
    pub fn new(idle_power_w: f64, max_power_w: f64) -> Self {
        assert!(
            max_power_w >= idle_power_w,
            "max power {} is below idle power {}",
            max_power_w,
            idle_power_w
        );
        Self {
            idle_power_w,
            max_power_w,
        }
    }
}

impl PowerModel for LinearPowerModel {
    fn power(&self, cpu_utilization: f64) -> f64 {
        self.idle_power_w + (self.max_power_w - self.idle_power_w) * cpu_utilization
    }
}
