pub mod common;
pub mod config;
pub mod geo;
pub mod metrics;
pub mod pareto;
pub mod placement_store;
pub mod power_model;
pub mod preference;
pub mod resource_pool;
pub mod scheduler;
pub mod sustainability;
