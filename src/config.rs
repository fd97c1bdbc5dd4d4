//! Configuration for the orc automaton.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::orc::{Kind, KIND_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Every tunable constant of a simulation run. Read-only after construction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub world: WorldSettings,
    #[serde(default)]
    pub energy: EnergySettings,
    #[serde(default)]
    pub population: PopulationSettings,
    #[serde(default)]
    pub reproduction: ReproductionSettings,
    #[serde(default)]
    pub combat: CombatSettings,
    #[serde(default)]
    pub social: SocialSettings,
    #[serde(default)]
    pub movement: MovementSettings,
    #[serde(default)]
    pub disease: DiseaseSettings,
    #[serde(default)]
    pub kinds: KindSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Grid shape and initial seeding
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub grid_width: usize,
    pub grid_height: usize,
    /// Fraction of cells seeded with an orc at start
    pub initial_orc_ratio: f32,
    /// Seed for the run; drawn from entropy when absent
    pub seed: Option<u64>,
}

/// Energy economy: decay, action costs and terrain pressure
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySettings {
    pub base_energy: f32,
    pub energy_decay: f32,
    pub move_cost: f32,
    pub forage_gain: f32,
    pub forage_cost: f32,
    /// Below this energy an orc prefers to forage over acting
    pub rest_threshold: f32,
    pub humidity_penalty: f32,
    pub humidity_bonus: f32,
    pub biome_bonus: f32,
    pub biome_penalty: f32,
}

/// Lifecycle limits and overpopulation pressure
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationSettings {
    pub max_age: u32,
    /// Cull pressure applies strictly above this cap; 0 disables it
    pub max_population: usize,
    pub overpop_base: f32,
    pub overpop_scale: f32,
    /// A kind at or below this count gains reproduction and combat protections
    pub endangered_threshold: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReproductionSettings {
    pub threshold: f32,
    pub chance: f32,
    /// Share of the parent's energy granted to the child
    pub energy_share: f32,
    pub overpop_pop_threshold: usize,
    pub overpop_factor: f32,
    pub endangered_factor: f32,
    pub endangered_bonus: f32,
    pub mutation_rate: f32,
    pub mutation_scale: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    pub fight_reward: f32,
    pub fight_cost: f32,
    pub aggression_bias: f32,
    /// Score gaps below this resolve as a non-lethal skirmish
    pub skirmish_threshold: f32,
    pub skirmish_cost_factor: f32,
    pub support_score_factor: f32,
    /// Kinds at or below this count never start fights
    pub peace_floor_count: usize,
}

/// Neighborhood effects applied during the social phase
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialSettings {
    pub group_support_bonus: f32,
    pub group_support_radius: usize,
    pub loner_grit_bonus: f32,
    pub loner_grit_threshold: usize,
}

/// Movement desirability weights
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    pub herd_radius: usize,
    pub herd_attraction: f32,
    /// Herd pull multiplier for orcs with no adjacent kin
    pub pair_seek_multiplier: f32,
    pub habitat_seek_radius: usize,
    pub habitat_seek_bonus: f32,
    pub habitat_bad_threshold: f32,
    pub escape_strength_threshold: f32,
    pub escape_threat_radius: usize,
    pub escape_threat_weight: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiseaseSettings {
    pub spawn_base: f32,
    pub spawn_stressed: f32,
    pub crowd_threshold: usize,
    pub crowd_pop_threshold: usize,
    pub crowd_multiplier: f32,
    pub spread_chance: f32,
    pub duration: u32,
    pub energy_penalty: f32,
    pub fight_penalty: f32,
}

/// Trait multipliers applied to a freshly spawned orc of one kind
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KindModifiers {
    pub strength: f32,
    pub agility: f32,
    pub resilience: f32,
}

/// Per-kind modifier table, indexed by [`Kind`] and validated at load time
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KindSettings {
    pub modifiers: [KindModifiers; KIND_COUNT],
}

impl KindSettings {
    /// Modifiers for one kind
    #[inline]
    pub fn for_kind(&self, kind: Kind) -> KindModifiers {
        self.modifiers[kind.index()]
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Ticks between metric summaries in the CLI runner
    pub metrics_interval: u64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            grid_width: 64,
            grid_height: 40,
            initial_orc_ratio: 0.08,
            seed: None,
        }
    }
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            base_energy: 18.0,
            energy_decay: 0.32,
            move_cost: 0.55,
            forage_gain: 1.8,
            forage_cost: 0.25,
            rest_threshold: 5.5,
            humidity_penalty: 0.18,
            humidity_bonus: 0.15,
            biome_bonus: 0.16,
            biome_penalty: 0.12,
        }
    }
}

impl Default for PopulationSettings {
    fn default() -> Self {
        Self {
            max_age: 220,
            max_population: 400,
            overpop_base: 0.04,
            overpop_scale: 0.18,
            endangered_threshold: 15,
        }
    }
}

impl Default for ReproductionSettings {
    fn default() -> Self {
        Self {
            threshold: 6.0,
            chance: 0.12,
            energy_share: 0.35,
            overpop_pop_threshold: 200,
            overpop_factor: 0.5,
            endangered_factor: 0.65,
            endangered_bonus: 0.08,
            mutation_rate: 0.15,
            mutation_scale: 0.25,
        }
    }
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            fight_reward: 2.6,
            fight_cost: 0.8,
            aggression_bias: 0.45,
            skirmish_threshold: 0.9,
            skirmish_cost_factor: 0.7,
            support_score_factor: 0.12,
            peace_floor_count: 4,
        }
    }
}

impl Default for SocialSettings {
    fn default() -> Self {
        Self {
            group_support_bonus: 0.15,
            group_support_radius: 2,
            loner_grit_bonus: 0.35,
            loner_grit_threshold: 3,
        }
    }
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            herd_radius: 3,
            herd_attraction: 0.55,
            pair_seek_multiplier: 1.8,
            habitat_seek_radius: 4,
            habitat_seek_bonus: 0.4,
            habitat_bad_threshold: 0.48,
            escape_strength_threshold: 0.95,
            escape_threat_radius: 2,
            escape_threat_weight: 0.6,
        }
    }
}

impl Default for DiseaseSettings {
    fn default() -> Self {
        Self {
            spawn_base: 0.0002,
            spawn_stressed: 0.0012,
            crowd_threshold: 6,
            crowd_pop_threshold: 150,
            crowd_multiplier: 5.0,
            spread_chance: 0.04,
            duration: 30,
            energy_penalty: 0.6,
            fight_penalty: 0.12,
        }
    }
}

impl Default for KindSettings {
    fn default() -> Self {
        Self {
            modifiers: [
                KindModifiers {
                    strength: 1.1,
                    agility: 0.95,
                    resilience: 1.0,
                },
                KindModifiers {
                    strength: 0.9,
                    agility: 1.1,
                    resilience: 0.95,
                },
                KindModifiers {
                    strength: 1.0,
                    agility: 1.0,
                    resilience: 1.1,
                },
            ],
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            metrics_interval: 50,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file and validate them
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self).map_err(ConfigError::Parse)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate settings values
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(msg: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.to_string()))
        }

        if self.world.grid_width == 0 || self.world.grid_width > 512 {
            return invalid("grid_width must be between 1 and 512");
        }
        if self.world.grid_height == 0 || self.world.grid_height > 512 {
            return invalid("grid_height must be between 1 and 512");
        }
        if !(0.0..=1.0).contains(&self.world.initial_orc_ratio) {
            return invalid("initial_orc_ratio must be between 0 and 1");
        }
        if self.energy.base_energy <= 0.0 {
            return invalid("base_energy must be > 0");
        }
        if self.energy.energy_decay < 0.0 {
            return invalid("energy_decay must be >= 0");
        }
        if !(0.0..=1.0).contains(&self.reproduction.chance) {
            return invalid("reproduction chance must be between 0 and 1");
        }
        if !(0.0..=1.0).contains(&self.reproduction.mutation_rate) {
            return invalid("mutation_rate must be between 0 and 1");
        }
        if self.reproduction.energy_share <= 0.0 || self.reproduction.energy_share > 1.0 {
            return invalid("energy_share must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.disease.spawn_base)
            || !(0.0..=1.0).contains(&self.disease.spawn_stressed)
            || !(0.0..=1.0).contains(&self.disease.spread_chance)
        {
            return invalid("disease chances must be between 0 and 1");
        }
        if self.disease.duration == 0 {
            return invalid("disease duration must be >= 1");
        }
        if self.combat.fight_cost < 0.0 || self.combat.skirmish_threshold < 0.0 {
            return invalid("combat costs and thresholds must be >= 0");
        }
        for (idx, mods) in self.kinds.modifiers.iter().enumerate() {
            if mods.strength <= 0.0 || mods.agility <= 0.0 || mods.resilience <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "kind modifiers for kind {idx} must all be > 0"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_roundtrip() {
        let settings = Settings::default();
        let yaml = serde_yaml::to_string(&settings).unwrap();
        let loaded: Settings = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(settings.world.grid_width, loaded.world.grid_width);
        assert_eq!(settings.energy.base_energy, loaded.energy.base_energy);
        assert_eq!(
            settings.disease.crowd_pop_threshold,
            loaded.disease.crowd_pop_threshold
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let loaded: Settings =
            serde_yaml::from_str("world:\n  grid_width: 32\n  grid_height: 20\n").unwrap();

        assert_eq!(loaded.world.grid_width, 32);
        assert_eq!(loaded.world.grid_height, 20);
        assert_eq!(loaded.energy.base_energy, 18.0);
        assert_eq!(loaded.population.max_population, 400);
    }

    #[test]
    fn test_invalid_grid_rejected() {
        let mut settings = Settings::default();
        settings.world.grid_width = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_modifier_rejected() {
        let mut settings = Settings::default();
        settings.kinds.modifiers[1].agility = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_kind_table_lookup() {
        let settings = Settings::default();
        let mods = settings.kinds.for_kind(Kind::Mosskin);
        assert_eq!(mods.agility, 1.1);
    }
}
