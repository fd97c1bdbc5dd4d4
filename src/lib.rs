//! # ORC AUTOMATA
//!
//! Deterministic orc-colony cellular automaton on procedurally generated
//! terrain.
//!
//! ## Features
//!
//! - **Deterministic**: one seeded random stream drives environment
//!   generation and every decision; equal seeds replay identically
//! - **Procedural**: humidity, fertility and biome layers from smoothed
//!   noise, fresh on every reset
//! - **Emergent**: reproduction with mutation, disease outbreaks, herd
//!   movement, endangered-kind protections, fights and skirmishes
//! - **Configurable**: YAML settings files
//!
//! ## Quick Start
//!
//! ```rust
//! use orc_automata::{Settings, Simulation};
//!
//! let settings = Settings::default();
//! let mut simulation = Simulation::new_with_seed(settings, 42);
//!
//! simulation.run(100);
//!
//! println!("Population: {}", simulation.population());
//! println!("{}", simulation.metrics().summary());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use orc_automata::Settings;
//!
//! let mut settings = Settings::default();
//! settings.world.grid_width = 96;
//! settings.reproduction.chance = 0.2;
//! ```

pub mod config;
pub mod environment;
pub mod metrics;
pub mod orc;
pub mod simulation;

// Re-export main types
pub use config::{ConfigError, Settings};
pub use environment::{Environment, PlacementError};
pub use metrics::{Metrics, MetricsHistory};
pub use orc::{Biome, Kind, Orc, OrcId, KIND_COUNT};
pub use simulation::Simulation;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(ticks: u64, settings: Settings) -> BenchmarkResult {
    use std::time::Instant;

    let mut simulation = Simulation::new(settings);
    let initial_population = simulation.population();

    let start = Instant::now();
    simulation.run(ticks);
    let elapsed = start.elapsed();

    BenchmarkResult {
        ticks,
        initial_population,
        final_population: simulation.population(),
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: ticks as f64 / elapsed.as_secs_f64(),
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub ticks: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(
            f,
            "Population: {} -> {}",
            self.initial_population, self.final_population
        )?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let settings = Settings::default();
        let mut simulation = Simulation::new_with_seed(settings, 1);

        simulation.run(100);

        assert_eq!(simulation.tick, 100);
    }

    #[test]
    fn test_benchmark() {
        let mut settings = Settings::default();
        settings.world.grid_width = 24;
        settings.world.grid_height = 16;
        let result = benchmark(50, settings);

        assert_eq!(result.ticks, 50);
        assert!(result.ticks_per_second > 0.0);
    }
}
