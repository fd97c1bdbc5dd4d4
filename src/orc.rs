//! Orc creature state and pure per-creature operations.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Unique orc identifier
pub type OrcId = u64;

/// Number of orc kinds (and terrain biomes; the two sets are paired)
pub const KIND_COUNT: usize = 3;

/// Orc kind, named for the biome the clan calls home
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Dustkin,
    Mosskin,
    Bogkin,
}

impl Kind {
    /// All kinds in index order
    pub const ALL: [Kind; KIND_COUNT] = [Kind::Dustkin, Kind::Mosskin, Kind::Bogkin];

    /// Stable index into per-kind lookup tables
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The kind native to a biome (used when seeding the initial population)
    #[inline]
    pub const fn for_biome(biome: Biome) -> Kind {
        Kind::ALL[biome.index()]
    }

    /// The biome this kind thrives in
    #[inline]
    pub const fn home_biome(self) -> Biome {
        Biome::ALL[self.index()]
    }
}

/// Terrain biome class, assigned per cell at environment generation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Barrens,
    Grove,
    Marsh,
}

impl Biome {
    /// All biomes in index order
    pub const ALL: [Biome; KIND_COUNT] = [Biome::Barrens, Biome::Grove, Biome::Marsh];

    /// Stable index into per-biome lookup tables
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A single orc in the simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orc {
    /// Unique, never reused within a run
    pub id: OrcId,
    pub x: usize,
    pub y: usize,
    /// Fixed at creation; children inherit the parent's kind
    pub kind: Kind,
    pub strength: f32,
    pub agility: f32,
    pub resilience: f32,
    /// Dead at <= 0
    pub energy: f32,
    /// Ticks since creation
    pub age: u32,
    pub infected: bool,
    pub infection_timer: u32,
}

impl Orc {
    /// Age one tick and pay the baseline energy decay
    pub fn tick(&mut self, energy_decay: f32) {
        self.age += 1;
        self.energy -= energy_decay;
    }

    /// Combat fitness: fixed weighted sum of the three traits
    #[inline]
    pub fn fitness(&self) -> f32 {
        self.strength * 1.1 + self.agility * 0.9 + self.resilience * 0.8
    }

    /// Produce a child at the parent's position with independently mutated
    /// traits. The caller relocates the child and adjusts its energy; the
    /// 60% share here is only the pre-adjustment default.
    pub fn clone_with_mutation<R: Rng>(
        &self,
        rng: &mut R,
        mutation_rate: f32,
        mutation_scale: f32,
        id: OrcId,
    ) -> Orc {
        let mut mutate = |value: f32| -> f32 {
            if rng.gen::<f32>() < mutation_rate {
                (value + rng.gen_range(-mutation_scale..mutation_scale)).max(0.1)
            } else {
                value
            }
        };

        Orc {
            id,
            x: self.x,
            y: self.y,
            kind: self.kind,
            strength: mutate(self.strength),
            agility: mutate(self.agility),
            resilience: mutate(self.resilience),
            energy: self.energy * 0.6,
            age: 0,
            infected: false,
            infection_timer: 0,
        }
    }

    /// Catch the virus for at least one tick
    pub fn infect(&mut self, duration: u32) {
        self.infected = true;
        self.infection_timer = duration.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_orc() -> Orc {
        Orc {
            id: 1,
            x: 3,
            y: 4,
            kind: Kind::Mosskin,
            strength: 1.2,
            agility: 0.8,
            resilience: 1.0,
            energy: 10.0,
            age: 0,
            infected: false,
            infection_timer: 0,
        }
    }

    #[test]
    fn test_tick_ages_and_decays() {
        let mut orc = test_orc();
        orc.tick(0.32);

        assert_eq!(orc.age, 1);
        assert!((orc.energy - 9.68).abs() < 1e-6);
    }

    #[test]
    fn test_fitness_weights() {
        let orc = test_orc();
        let expected = 1.2 * 1.1 + 0.8 * 0.9 + 1.0 * 0.8;
        assert!((orc.fitness() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_clone_without_mutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let orc = test_orc();
        let child = orc.clone_with_mutation(&mut rng, 0.0, 0.25, 2);

        assert_eq!(child.id, 2);
        assert_eq!((child.x, child.y), (orc.x, orc.y));
        assert_eq!(child.kind, orc.kind);
        assert_eq!(child.strength, orc.strength);
        assert_eq!(child.agility, orc.agility);
        assert_eq!(child.resilience, orc.resilience);
        assert!((child.energy - orc.energy * 0.6).abs() < 1e-6);
        assert_eq!(child.age, 0);
        assert!(!child.infected);
    }

    #[test]
    fn test_clone_with_full_mutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let orc = test_orc();
        let child = orc.clone_with_mutation(&mut rng, 1.0, 0.25, 2);

        for (trait_value, parent_value) in [
            (child.strength, orc.strength),
            (child.agility, orc.agility),
            (child.resilience, orc.resilience),
        ] {
            assert!(trait_value >= 0.1);
            assert!((trait_value - parent_value).abs() <= 0.25 + 1e-6);
        }
    }

    #[test]
    fn test_mutation_floor() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut orc = test_orc();
        orc.strength = 0.11;
        orc.agility = 0.11;
        orc.resilience = 0.11;

        let child = orc.clone_with_mutation(&mut rng, 1.0, 5.0, 2);
        assert!(child.strength >= 0.1);
        assert!(child.agility >= 0.1);
        assert!(child.resilience >= 0.1);
    }

    #[test]
    fn test_infect_minimum_duration() {
        let mut orc = test_orc();
        orc.infect(0);

        assert!(orc.infected);
        assert_eq!(orc.infection_timer, 1);
    }

    #[test]
    fn test_kind_biome_pairing() {
        for kind in Kind::ALL {
            assert_eq!(Kind::for_biome(kind.home_biome()), kind);
        }
        assert_eq!(Kind::for_biome(Biome::Barrens), Kind::Dustkin);
        assert_eq!(Biome::Marsh.index(), 2);
    }
}
