//! Aggregate metrics and their history.

use crate::orc::KIND_COUNT;
use serde::{Deserialize, Serialize};

/// Aggregate snapshot of the population at one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub tick: u64,
    pub population: usize,
    pub average_strength: f32,
    pub average_agility: f32,
    pub average_resilience: f32,
    /// Currently infected orcs
    pub infected: usize,
    /// Live population per kind, in kind index order
    pub kind_counts: [usize; KIND_COUNT],
}

impl Metrics {
    /// Format metrics as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Pop:{:4} | Str:{:.2} | Agi:{:.2} | Res:{:.2} | Inf:{:3} | Kinds:{}/{}/{}",
            self.tick,
            self.population,
            self.average_strength,
            self.average_agility,
            self.average_resilience,
            self.infected,
            self.kind_counts[0],
            self.kind_counts[1],
            self.kind_counts[2],
        )
    }
}

/// Historical metrics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetricsHistory {
    /// All recorded snapshots
    pub snapshots: Vec<Metrics>,
    /// Recording interval in ticks
    pub interval: u64,
}

impl MetricsHistory {
    /// Create a new history with the given recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval: interval.max(1),
        }
    }

    /// Whether a tick falls on the recording interval
    pub fn should_record(&self, tick: u64) -> bool {
        tick % self.interval == 0
    }

    /// Record a snapshot
    pub fn record(&mut self, metrics: Metrics) {
        self.snapshots.push(metrics);
    }

    /// Population over time
    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|m| (m.tick, m.population))
            .collect()
    }

    /// Average strength over time
    pub fn strength_series(&self) -> Vec<(u64, f32)> {
        self.snapshots
            .iter()
            .map(|m| (m.tick, m.average_strength))
            .collect()
    }

    /// Infected count over time
    pub fn infected_series(&self) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|m| (m.tick, m.infected))
            .collect()
    }

    /// Save history as JSON
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from JSON
    pub fn load_json(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_format() {
        let metrics = Metrics {
            tick: 12,
            population: 100,
            average_strength: 1.05,
            average_agility: 0.98,
            average_resilience: 1.11,
            infected: 4,
            kind_counts: [40, 35, 25],
        };

        let line = metrics.summary();
        assert!(line.contains("Pop: 100"));
        assert!(line.contains("Kinds:40/35/25"));
    }

    #[test]
    fn test_history_series() {
        let mut history = MetricsHistory::new(10);

        for i in 0..5u64 {
            let metrics = Metrics {
                tick: i * 10,
                population: (i as usize + 1) * 100,
                ..Metrics::default()
            };
            assert!(history.should_record(metrics.tick));
            history.record(metrics);
        }

        let series = history.population_series();
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], (0, 100));
        assert_eq!(series[4], (40, 500));
    }

    #[test]
    fn test_interval_gating() {
        let history = MetricsHistory::new(50);
        assert!(history.should_record(0));
        assert!(!history.should_record(49));
        assert!(history.should_record(100));
    }
}
