//! Tools for evaluating multiple preference vectors in parallel against a
//! shared Pareto front.

use std::fs::File;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use log::info;
use threadpool::ThreadPool;

use crate::core::config::SchedulerConfig;
use crate::core::pareto::ParetoFront;
use crate::core::scheduler::PlacementScheduler;
use crate::core::sustainability::{CsvSustainabilityReader, HourlyRecord, StaticSustainability, SustainabilityDataset};
use crate::simulation::{EpisodeOutcome, PlacementSimulation, RandomWorkload};

/// Runs one evaluation episode with the given configuration and seed.
pub fn run_episode(config: &SchedulerConfig, seed: u64) -> EpisodeOutcome {
    let scheduler = PlacementScheduler::from_config(config);
    let dataset: Box<dyn SustainabilityDataset> = match &config.sustainability_trace {
        Some(path) => Box::new(CsvSustainabilityReader::from_file(path)),
        None => Box::new(StaticSustainability::new(HourlyRecord::new())),
    };
    let workload = Box::new(RandomWorkload::new(seed, config.arrivals_per_hour));
    let mut sim = PlacementSimulation::new(scheduler, dataset, workload, config.horizon_hours);
    sim.run()
}

/// Evaluates a list of preference weight vectors, one episode per preference,
/// and collects the episode outcomes in a shared Pareto front.
///
/// Episodes run on a thread pool; the front is guarded by a coarse lock so
/// that each dominance-check-then-mutate insertion stays atomic.
pub struct Experiment {
    config: SchedulerConfig,
    preferences: Vec<Vec<f64>>,
    base_seed: u64,
    results_path: Option<String>,
}

impl Experiment {
    pub fn new(
        config: SchedulerConfig,
        preferences: Vec<Vec<f64>>,
        base_seed: u64,
        results_path: Option<String>,
    ) -> Self {
        Self {
            config,
            preferences,
            base_seed,
            results_path,
        }
    }

    /// Runs every preference using the specified number of threads and
    /// returns the resulting front.
    pub fn run(&mut self, num_threads: usize) -> ParetoFront {
        let front = Arc::new(Mutex::new(ParetoFront::new(3)));
        let results = Arc::new(Mutex::new(Vec::new()));
        let pool = ThreadPool::new(num_threads);

        for (run_id, preference) in self.preferences.iter().enumerate() {
            assert_eq!(preference.len(), 3, "preference vector has wrong dimension");
            let mut run_config = self.config.clone();
            run_config.energy_weight = preference[0];
            run_config.carbon_weight = preference[1];
            run_config.latency_weight = preference[2];

            let preference = preference.clone();
            let seed = self.base_seed + run_id as u64;
            let front = front.clone();
            let results = results.clone();

            pool.execute(move || {
                info!("run {}: preference {:?}", run_id, preference);
                let outcome = run_episode(&run_config, seed);

                let mut metadata = IndexMap::new();
                metadata.insert("run".to_string(), run_id.to_string());
                metadata.insert(
                    "preference".to_string(),
                    format!("{:.4},{:.4},{:.4}", preference[0], preference[1], preference[2]),
                );
                front.lock().unwrap().add(outcome.objectives.clone(), metadata);

                let mut row = IndexMap::new();
                row.insert("run".to_string(), run_id.to_string());
                row.insert(
                    "preference".to_string(),
                    format!("{:.4},{:.4},{:.4}", preference[0], preference[1], preference[2]),
                );
                row.extend(outcome.summary);
                results.lock().unwrap().push(row);
            });
        }
        pool.join();

        let results: Vec<IndexMap<String, String>> = Arc::try_unwrap(results).unwrap().into_inner().unwrap();
        if let Some(path) = &self.results_path {
            let mut file = File::create(path).unwrap_or_else(|_| panic!("Can't create file {}", path));
            serde_json::to_writer_pretty(&mut file, &results).unwrap();
            info!("saved {} result rows to {}", results.len(), path);
        }

        Arc::try_unwrap(front).unwrap().into_inner().unwrap()
    }
}
