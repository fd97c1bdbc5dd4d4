//! ORC AUTOMATA - CLI Entry Point
//!
//! Headless runner for the orc-colony simulation.

use clap::{Parser, Subcommand};
use orc_automata::{benchmark, MetricsHistory, Settings, Simulation};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "orc-automata")]
#[command(version)]
#[command(about = "Deterministic orc-colony cellular automaton")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation headless
    Run {
        /// Settings file (YAML)
        #[arg(short, long, default_value = "settings.yaml")]
        config: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "2000")]
        ticks: u64,

        /// Random seed for reproducibility (overrides the settings file)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the metrics history as JSON on completion
        #[arg(long)]
        history: Option<PathBuf>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate a default settings file
    Init {
        /// Output path
        #[arg(short, long, default_value = "settings.yaml")]
        output: PathBuf,
    },

    /// Run a performance benchmark
    Bench {
        /// Number of ticks
        #[arg(short, long, default_value = "1000")]
        ticks: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            seed,
            history,
            quiet,
        } => run_simulation(config, ticks, seed, history, quiet),

        Commands::Init { output } => generate_settings(output),

        Commands::Bench { ticks } => run_benchmark(ticks),
    }
}

fn run_simulation(
    config_path: PathBuf,
    ticks: u64,
    seed: Option<u64>,
    history_path: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load or create settings
    let mut settings = if config_path.exists() {
        log::info!("Loading settings from {:?}", config_path);
        Settings::from_file(&config_path)?
    } else {
        log::info!("Using default settings");
        Settings::default()
    };
    if seed.is_some() {
        settings.world.seed = seed;
    }

    let mut simulation = Simulation::new(settings.clone());
    log::info!("Seed: {}", simulation.seed());

    println!("Starting simulation");
    println!("  Seed: {}", simulation.seed());
    println!(
        "  Grid: {}x{}",
        settings.world.grid_width, settings.world.grid_height
    );
    println!("  Initial population: {}", simulation.population());
    println!("  Ticks: {}", ticks);
    println!();

    let interval = settings.logging.metrics_interval.max(1);
    let mut history = MetricsHistory::new(interval);
    let start = Instant::now();

    for _ in 0..ticks {
        simulation.step();

        if history.should_record(simulation.tick) {
            let metrics = simulation.metrics();
            if !quiet {
                println!("{}", metrics.summary());
            }
            history.record(metrics);
        }

        if simulation.is_extinct() {
            log::warn!("Population extinct at tick {}", simulation.tick);
            println!("\nPopulation extinct at tick {}", simulation.tick);
            break;
        }
    }

    let elapsed = start.elapsed();
    let ticks_per_sec = simulation.tick as f64 / elapsed.as_secs_f64();
    let metrics = simulation.metrics();
    let counts = simulation.counts_by_kind();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Ticks: {}", simulation.tick);
    println!("Speed: {:.1} ticks/s", ticks_per_sec);
    println!("Final population: {}", simulation.population());
    println!(
        "Kinds: {} dustkin / {} mosskin / {} bogkin",
        counts[0], counts[1], counts[2]
    );
    println!(
        "Average traits: str {:.2} / agi {:.2} / res {:.2}",
        metrics.average_strength, metrics.average_agility, metrics.average_resilience
    );

    if let Some(path) = history_path {
        history.record(metrics);
        history.save_json(path.to_string_lossy().as_ref())?;
        println!("Metrics history: {:?}", path);
    }

    Ok(())
}

fn generate_settings(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::default();
    settings.save(&output)?;
    println!("Settings saved to {:?}", output);
    Ok(())
}

fn run_benchmark(ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== ORC AUTOMATA Benchmark ===");
    println!("Ticks: {}", ticks);
    println!();

    let result = benchmark(ticks, Settings::default());
    println!("{}", result);

    Ok(())
}
