use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use greendc::core::config::SchedulerConfig;
use greendc::core::preference::sample_preference_vectors;
use greendc::experiment::Experiment;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs placement episodes across sampled preference vectors and reports the
/// resulting Pareto front
struct Args {
    /// Path to YAML file with scheduler configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Number of preference vectors to sample
    #[arg(short, long, default_value_t = 6)]
    preferences: usize,

    /// Random seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Path to produced JSON file with per-run results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of threads to use (default - use all available cores)
    #[arg(short, long, default_value_t = std::thread::available_parallelism().unwrap().get())]
    threads: usize,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = SchedulerConfig::from_file(args.config.to_str().unwrap());
    let mut rng = Pcg64::seed_from_u64(args.seed);
    let preferences = sample_preference_vectors(&mut rng, args.preferences, 3);
    let results_path = args.output.map(|path| path.to_str().unwrap().to_string());

    let mut experiment = Experiment::new(config, preferences, args.seed, results_path);
    let front = experiment.run(args.threads);

    println!("Pareto front: {} solutions", front.len());
    for solution in front.solutions() {
        println!("  objectives {:?}  {:?}", solution.objectives, solution.metadata);
    }
    if let Some(hypervolume) = front.hypervolume(None) {
        println!("Hypervolume: {:.3}", hypervolume);
    }
    println!("Expected utility: {:.3}", front.expected_utility(100, &mut rng));
}
