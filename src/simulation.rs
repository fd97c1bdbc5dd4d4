//! Simulation engine: the per-tick update pipeline over the orc population.
//!
//! All randomness flows through one seeded stream owned by the engine. The
//! order of draws — the processing shuffle, then each orc's pipeline draws —
//! is part of the observable contract: two engines with the same seed and
//! settings replay identically, tick for tick.

use crate::config::Settings;
use crate::environment::{Environment, PlacementError};
use crate::metrics::Metrics;
use crate::orc::{Biome, Kind, Orc, OrcId, KIND_COUNT};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// The simulation engine
pub struct Simulation {
    pub settings: Settings,
    pub environment: Environment,
    /// Sole owner of orc state; grid cells only hold ids into this map.
    /// Monotonic ids make iteration order equal insertion order.
    pub orcs: BTreeMap<OrcId, Orc>,
    pub tick: u64,
    next_id: OrcId,
    rng: ChaCha8Rng,
    seed: u64,
}

impl Simulation {
    /// Create a new simulation, seeding from `settings.world.seed` when set
    pub fn new(settings: Settings) -> Self {
        let seed = settings
            .world
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        Self::new_with_seed(settings, seed)
    }

    /// Create a new simulation with a specific seed for reproducibility
    pub fn new_with_seed(settings: Settings, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let environment = Environment::generate(
            settings.world.grid_width,
            settings.world.grid_height,
            &mut rng,
        );

        let mut simulation = Self {
            settings,
            environment,
            orcs: BTreeMap::new(),
            tick: 0,
            next_id: 1,
            rng,
            seed,
        };
        simulation.seed_initial_population();
        simulation
    }

    /// Rebuild the environment and population, continuing the same RNG
    /// lineage: the new map differs statistically but the run stays
    /// deterministic for a fixed seed.
    pub fn reset(&mut self) {
        self.environment = Environment::generate(
            self.settings.world.grid_width,
            self.settings.world.grid_height,
            &mut self.rng,
        );
        self.orcs.clear();
        self.tick = 0;
        self.next_id = 1;
        self.seed_initial_population();
    }

    fn seed_initial_population(&mut self) {
        let width = self.settings.world.grid_width;
        let height = self.settings.world.grid_height;
        let capacity = width * height;
        let target = (capacity as f32 * self.settings.world.initial_orc_ratio) as usize;

        let mut coords: Vec<(usize, usize)> = Vec::with_capacity(capacity);
        for x in 0..width {
            for y in 0..height {
                coords.push((x, y));
            }
        }
        coords.shuffle(&mut self.rng);

        for &(x, y) in coords.iter().take(target) {
            let kind = Kind::for_biome(self.environment.biome_at(x, y));
            self.spawn(x, y, kind)
                .expect("seed cells are distinct and empty");
        }
    }

    /// Spawn a fresh orc of one kind: random traits scaled by the kind's
    /// modifier table, full base energy, registered in both the population
    /// map and its grid cell.
    pub fn spawn(&mut self, x: usize, y: usize, kind: Kind) -> Result<OrcId, PlacementError> {
        let mods = self.settings.kinds.for_kind(kind);
        let orc = Orc {
            id: self.next_id,
            x,
            y,
            kind,
            strength: self.rng.gen_range(0.5..1.5) * mods.strength,
            agility: self.rng.gen_range(0.5..1.5) * mods.agility,
            resilience: self.rng.gen_range(0.5..1.5) * mods.resilience,
            energy: self.settings.energy.base_energy,
            age: 0,
            infected: false,
            infection_timer: 0,
        };
        self.register(orc)
    }

    /// Single registration point keeping grid and population consistent
    fn register(&mut self, orc: Orc) -> Result<OrcId, PlacementError> {
        let id = orc.id;
        self.environment.place(id, orc.x, orc.y)?;
        self.next_id = self.next_id.max(id) + 1;
        self.orcs.insert(id, orc);
        Ok(id)
    }

    /// Single removal point: an orc leaves the population map and its grid
    /// cell together, never one without the other.
    fn remove_orc(&mut self, id: OrcId) {
        if let Some(orc) = self.orcs.remove(&id) {
            self.environment.clear(id, orc.x, orc.y);
        }
    }

    /// Advance one tick: shuffle a snapshot of the population, then run each
    /// still-living orc through the pipeline in strict phase order.
    pub fn step(&mut self) {
        let mut order: Vec<OrcId> = self.orcs.keys().copied().collect();
        order.shuffle(&mut self.rng);

        for id in order {
            // Removed mid-tick by a fight, cull or plague.
            let Some(orc) = self.orcs.get_mut(&id) else {
                continue;
            };
            orc.tick(self.settings.energy.energy_decay);

            self.apply_environment_pressure(id);
            self.apply_social_context(id);
            self.apply_disease(id);
            if self.overpop_cull(id) {
                continue;
            }
            if self.is_dead(id) {
                self.remove_orc(id);
                continue;
            }
            if self.try_reproduce(id) {
                continue;
            }
            self.take_action(id);
        }

        self.tick += 1;
    }

    /// Run the simulation for the given number of ticks
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    // ------------------------------------------------------------------
    // Pipeline phases
    // ------------------------------------------------------------------

    fn apply_environment_pressure(&mut self, id: OrcId) {
        let Some(orc) = self.orcs.get(&id) else {
            return;
        };
        let (x, y, kind) = (orc.x, orc.y, orc.kind);

        let humidity = self.environment.humidity_at(x, y);
        let mut delta = humidity_delta(humidity, &self.settings);

        let biome = self.environment.biome_at(x, y);
        let (bonus, penalty) = self.biome_effect(kind, biome);
        delta += bonus - penalty;

        if let Some(orc) = self.orcs.get_mut(&id) {
            orc.energy += delta;
        }
    }

    fn apply_social_context(&mut self, id: OrcId) {
        let Some(orc) = self.orcs.get(&id) else {
            return;
        };
        let (x, y, kind) = (orc.x, orc.y, orc.kind);
        let (friends, foes) = self.social_counts(x, y, kind);

        let mut delta = 0.0;
        if friends >= 2 {
            delta += friends.min(3) as f32 * self.settings.social.group_support_bonus;
        }
        // Outnumbered orcs dig in.
        if foes >= friends + self.settings.social.loner_grit_threshold {
            delta += self.settings.social.loner_grit_bonus;
        }

        if let Some(orc) = self.orcs.get_mut(&id) {
            orc.energy += delta;
        }
    }

    fn apply_disease(&mut self, id: OrcId) {
        let Some(orc) = self.orcs.get(&id) else {
            return;
        };
        let (x, y, kind, infected) = (orc.x, orc.y, orc.kind, orc.infected);

        if !infected {
            let chance = self.virus_spawn_chance(x, y, kind);
            if self.rng.gen::<f32>() < chance {
                if let Some(orc) = self.orcs.get_mut(&id) {
                    orc.infect(self.settings.disease.duration);
                }
            }
        }

        let Some(orc) = self.orcs.get_mut(&id) else {
            return;
        };
        if !orc.infected {
            return;
        }
        orc.infection_timer = orc.infection_timer.saturating_sub(1);
        orc.energy -= self.settings.disease.energy_penalty;
        let (x, y) = (orc.x, orc.y);

        // Low-chance spread to each occupied neighbor.
        for (nx, ny) in self.environment.occupied_neighbors(x, y) {
            let Some(target_id) = self.environment.orc_at(nx, ny) else {
                continue;
            };
            let target_infected = self
                .orcs
                .get(&target_id)
                .map_or(true, |target| target.infected);
            if !target_infected && self.rng.gen::<f32>() < self.settings.disease.spread_chance {
                if let Some(target) = self.orcs.get_mut(&target_id) {
                    target.infect(self.settings.disease.duration);
                }
            }
        }

        if let Some(orc) = self.orcs.get_mut(&id) {
            if orc.infection_timer == 0 {
                orc.infected = false;
            }
        }
    }

    fn virus_spawn_chance(&self, x: usize, y: usize, kind: Kind) -> f32 {
        // Standing in a penalizing biome stresses the immune system.
        let biome = self.environment.biome_at(x, y);
        let (_bonus, penalty) = self.biome_effect(kind, biome);
        let mut chance = if penalty > 0.0 {
            self.settings.disease.spawn_stressed
        } else {
            self.settings.disease.spawn_base
        };

        if self.orcs.len() >= self.settings.disease.crowd_pop_threshold {
            let (friends, _) = self.social_counts(x, y, kind);
            if friends >= self.settings.disease.crowd_threshold {
                chance *= self.settings.disease.crowd_multiplier;
            }
        }
        chance
    }

    /// Cull pressure applies only strictly above the population cap
    fn overpop_cull(&mut self, id: OrcId) -> bool {
        let cap = self.settings.population.max_population;
        if cap == 0 {
            return false;
        }
        let current = self.orcs.len();
        if current <= cap {
            return false;
        }

        let overload = (current - cap) as f32 / cap as f32;
        let chance = (self.settings.population.overpop_base
            + overload * self.settings.population.overpop_scale)
            .min(0.75);
        if self.rng.gen::<f32>() < chance {
            self.remove_orc(id);
            return true;
        }
        false
    }

    fn is_dead(&self, id: OrcId) -> bool {
        self.orcs
            .get(&id)
            .map_or(true, |orc| orc.energy <= 0.0 || orc.age > self.settings.population.max_age)
    }

    /// Effective reproduction threshold and chance for one kind, relaxed for
    /// endangered kinds and damped when the whole grid is crowded.
    fn reproduction_terms(&self, kind: Kind) -> (f32, f32) {
        let repro = &self.settings.reproduction;
        let mut threshold = repro.threshold;
        let mut chance = repro.chance;

        if self.kind_count(kind) <= self.settings.population.endangered_threshold {
            threshold *= repro.endangered_factor;
            chance = (chance + repro.endangered_bonus).min(1.0);
        }
        if self.orcs.len() >= repro.overpop_pop_threshold {
            chance *= repro.overpop_factor;
        }
        (threshold, chance)
    }

    fn try_reproduce(&mut self, id: OrcId) -> bool {
        let Some(orc) = self.orcs.get(&id) else {
            return false;
        };
        let (x, y, kind, energy) = (orc.x, orc.y, orc.kind, orc.energy);

        let (threshold, chance) = self.reproduction_terms(kind);
        // Too little energy short-circuits before the chance draw.
        if energy < threshold {
            return false;
        }
        if self.rng.gen::<f32>() > chance {
            return false;
        }

        // Needs a same-kind partner adjacent and a free birth site.
        let ally_adjacent = self
            .environment
            .occupied_neighbors(x, y)
            .into_iter()
            .filter_map(|(nx, ny)| self.environment.orc_at(nx, ny))
            .filter_map(|neighbor_id| self.orcs.get(&neighbor_id))
            .any(|neighbor| neighbor.kind == kind);
        if !ally_adjacent {
            return false;
        }
        let empties = self.environment.empty_neighbors(x, y);
        if empties.is_empty() {
            return false;
        }
        let dest = empties[self.rng.gen_range(0..empties.len())];

        let share = self.settings.reproduction.energy_share;
        let energy_for_child = (energy * share)
            .min(self.settings.energy.base_energy)
            .max(2.0);

        let child_id = self.next_id;
        let child = {
            let Some(parent) = self.orcs.get(&id) else {
                return false;
            };
            let mut child = parent.clone_with_mutation(
                &mut self.rng,
                self.settings.reproduction.mutation_rate,
                self.settings.reproduction.mutation_scale,
                child_id,
            );
            child.energy = energy_for_child;
            child.x = dest.0;
            child.y = dest.1;
            child
        };

        self.register(child)
            .expect("birth site was sampled empty this turn");
        if let Some(parent) = self.orcs.get_mut(&id) {
            parent.energy -= energy_for_child;
        }
        true
    }

    // ------------------------------------------------------------------
    // Action phase: forage, fight or move
    // ------------------------------------------------------------------

    fn take_action(&mut self, id: OrcId) {
        let Some(orc) = self.orcs.get(&id) else {
            return;
        };
        let (x, y, energy) = (orc.x, orc.y, orc.energy);

        let occupied = self.environment.occupied_neighbors(x, y);
        let empties = self.environment.empty_neighbors(x, y);
        let fertility_here = self.environment.fertility_at(x, y);
        let low_energy = energy < self.settings.energy.rest_threshold;

        if low_energy && self.rng.gen::<f32>() < 0.55 {
            self.forage(id, fertility_here);
            return;
        }

        if let Some(target_coord) = self.pick_target(id, &occupied) {
            if let Some(target_id) = self.environment.orc_at(target_coord.0, target_coord.1) {
                if self.should_attack(id, target_id) {
                    self.resolve_fight(id, target_id);
                    return;
                }
            }
        }

        if !empties.is_empty() {
            let dest = self.choose_move_target(id, &empties);
            self.move_orc(id, dest);
            if let Some(orc) = self.orcs.get_mut(&id) {
                orc.energy -= self.settings.energy.move_cost;
            }
            // Opportunistic graze at the destination when still hungry.
            let energy_after = self.orcs.get(&id).map_or(0.0, |orc| orc.energy);
            if energy_after < self.settings.energy.rest_threshold && self.rng.gen::<f32>() < 0.35 {
                let fertility_moved = self.environment.fertility_at(dest.0, dest.1);
                self.forage(id, fertility_moved);
            }
            return;
        }

        if self.rng.gen::<f32>() < 0.4 {
            self.forage(id, fertility_here);
        }
    }

    /// Move through the single mutation point that keeps orc position and
    /// grid cell consistent. Stale destinations degrade to a no-op.
    fn move_orc(&mut self, id: OrcId, dest: (usize, usize)) {
        let Some(orc) = self.orcs.get(&id) else {
            return;
        };
        let from = (orc.x, orc.y);
        if self.environment.relocate(id, from, dest) {
            if let Some(orc) = self.orcs.get_mut(&id) {
                orc.x = dest.0;
                orc.y = dest.1;
            }
        }
    }

    /// Best-scoring adjacent victim of another kind, if its score clears the
    /// minimum margin.
    fn pick_target(&self, id: OrcId, occupied: &[(usize, usize)]) -> Option<(usize, usize)> {
        let orc = self.orcs.get(&id)?;

        let mut candidates: Vec<(f32, (usize, usize))> = Vec::new();
        for &coord in occupied {
            let Some(target) = self
                .environment
                .orc_at(coord.0, coord.1)
                .and_then(|target_id| self.orcs.get(&target_id))
            else {
                continue;
            };
            if target.kind == orc.kind {
                continue;
            }
            let advantage = orc.fitness() - target.fitness();
            let energy_gap = (orc.energy - target.energy) * 0.1;
            candidates.push((advantage + energy_gap, coord));
        }
        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        let (best_score, best_coord) = candidates[0];
        (best_score > -0.3).then_some(best_coord)
    }

    fn should_attack(&mut self, attacker_id: OrcId, defender_id: OrcId) -> bool {
        let (Some(attacker), Some(defender)) =
            (self.orcs.get(&attacker_id), self.orcs.get(&defender_id))
        else {
            return false;
        };
        if attacker.kind == defender.kind {
            return false;
        }
        let advantage = attacker.fitness() - defender.fitness();
        if advantage < -0.6 {
            return false;
        }
        let attacker_kind = attacker.kind;
        let defender_kind = defender.kind;
        let energy_edge = attacker.energy - defender.energy;

        // Extinction protection for the defender's kind.
        if self.kind_count(defender_kind) <= self.settings.population.endangered_threshold {
            return false;
        }
        // Small attacker populations avoid risking losses.
        if self.kind_count(attacker_kind) <= self.settings.combat.peace_floor_count {
            return false;
        }

        let mut aggression = self.settings.combat.aggression_bias + advantage * 0.1;
        if energy_edge > 2.0 {
            aggression += 0.1;
        }
        self.rng.gen::<f32>() < aggression
    }

    fn resolve_fight(&mut self, challenger_id: OrcId, defender_id: OrcId) {
        if !self.orcs.contains_key(&challenger_id) || !self.orcs.contains_key(&defender_id) {
            return;
        }
        let fight_cost = self.settings.combat.fight_cost;

        // Both pay for engaging before any blow lands.
        if let Some(challenger) = self.orcs.get_mut(&challenger_id) {
            challenger.energy -= fight_cost * 0.5;
        }
        if let Some(defender) = self.orcs.get_mut(&defender_id) {
            defender.energy -= fight_cost * 0.5;
        }
        if self
            .orcs
            .get(&challenger_id)
            .map_or(true, |challenger| challenger.energy <= 0.0)
        {
            self.remove_orc(challenger_id);
            return;
        }
        if self
            .orcs
            .get(&defender_id)
            .map_or(true, |defender| defender.energy <= 0.0)
        {
            self.remove_orc(defender_id);
            return;
        }

        let support_challenger = self.local_support_score(challenger_id);
        let support_defender = self.local_support_score(defender_id);
        let challenge_score =
            self.effective_fitness(challenger_id) + self.rng.gen_range(-0.4..0.4) + support_challenger;
        let defense_score =
            self.effective_fitness(defender_id) + self.rng.gen_range(-0.4..0.4) + support_defender;

        let diff = (challenge_score - defense_score).abs();
        let (winner_id, loser_id) = if challenge_score >= defense_score {
            (challenger_id, defender_id)
        } else {
            (defender_id, challenger_id)
        };

        if diff < self.settings.combat.skirmish_threshold {
            // Close scores: both retreat hurt, nobody dies unless already
            // exhausted.
            let skirmish_cost = fight_cost * self.settings.combat.skirmish_cost_factor;
            if let Some(challenger) = self.orcs.get_mut(&challenger_id) {
                challenger.energy -= skirmish_cost;
            }
            if let Some(defender) = self.orcs.get_mut(&defender_id) {
                defender.energy -= skirmish_cost;
            }
            if let Some(winner) = self.orcs.get_mut(&winner_id) {
                winner.energy += self.settings.combat.fight_reward * 0.4;
            }
            if self
                .orcs
                .get(&challenger_id)
                .is_some_and(|challenger| challenger.energy <= 0.0)
            {
                self.remove_orc(challenger_id);
            }
            if self
                .orcs
                .get(&defender_id)
                .is_some_and(|defender| defender.energy <= 0.0)
            {
                self.remove_orc(defender_id);
            }
            return;
        }

        self.remove_orc(loser_id);
        if let Some(winner) = self.orcs.get_mut(&winner_id) {
            winner.energy += self.settings.combat.fight_reward - fight_cost * 0.5;
            winner.strength += 0.05;
            winner.resilience += 0.03;
        }
        if self
            .orcs
            .get(&winner_id)
            .is_some_and(|winner| winner.energy <= 0.0)
        {
            self.remove_orc(winner_id);
        }
    }

    /// Forage at a cell: fertile ground pays, barren ground can cost more
    /// than it yields.
    fn forage(&mut self, id: OrcId, fertility: f32) {
        let gain = self.settings.energy.forage_gain * (0.4 + fertility) * self.rng.gen_range(0.6..1.2);
        if let Some(orc) = self.orcs.get_mut(&id) {
            orc.energy += gain - self.settings.energy.forage_cost;
        }
    }

    /// Weighted-random choice among the top 3 most desirable empty cells
    fn choose_move_target(&mut self, id: OrcId, empties: &[(usize, usize)]) -> (usize, usize) {
        let Some(orc) = self.orcs.get(&id) else {
            return empties[0];
        };
        let (x, y, kind, strength) = (orc.x, orc.y, orc.kind, orc.strength);

        let current_score = self.env_score(kind, (x, y));
        let target_vec = self.seek_habitat_direction(x, y, kind, current_score);
        let friends_adjacent = self
            .environment
            .occupied_neighbors(x, y)
            .into_iter()
            .filter_map(|(nx, ny)| self.environment.orc_at(nx, ny))
            .filter_map(|neighbor_id| self.orcs.get(&neighbor_id))
            .any(|neighbor| neighbor.kind == kind);
        let low_pop = self.kind_count(kind) <= self.settings.population.endangered_threshold;
        let low_strength = strength <= self.settings.movement.escape_strength_threshold;

        let mut weighted: Vec<(f32, (usize, usize))> = Vec::with_capacity(empties.len());
        for &coord in empties {
            let base = self.env_score(kind, coord);
            let mut herd_bonus = self.herd_bonus(kind, coord);
            if !friends_adjacent {
                herd_bonus *= self.settings.movement.pair_seek_multiplier;
            }
            let threat_penalty = if low_pop && low_strength {
                self.threat_penalty(kind, coord)
            } else {
                0.0
            };
            let mut desirability = base + herd_bonus - threat_penalty;

            if let Some((vx, vy)) = target_vec {
                let dx = coord.0 as f32 - x as f32;
                let dy = coord.1 as f32 - y as f32;
                let dot = dx * vx + dy * vy;
                let norm = ((dx * dx + dy * dy).sqrt() * (vx * vx + vy * vy).sqrt()).max(1e-3);
                let align = (dot / norm).max(0.0);
                desirability += self.settings.movement.habitat_seek_bonus * align;
            }
            if current_score < self.settings.movement.habitat_bad_threshold {
                desirability += (base - current_score) * 0.8;
            }
            desirability += self.rng.gen_range(-0.1..0.1);
            weighted.push((desirability, coord));
        }

        weighted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        let top = &weighted[..weighted.len().min(3)];
        top[self.rng.gen_range(0..top.len())].1
    }

    // ------------------------------------------------------------------
    // Scoring helpers
    // ------------------------------------------------------------------

    /// Asymmetric kind/biome relationship: home ground pays a bonus, the
    /// biome one step before home in the cycle is merely unfamiliar, every
    /// other biome punishes.
    fn biome_effect(&self, kind: Kind, biome: Biome) -> (f32, f32) {
        if biome == kind.home_biome() {
            (self.settings.energy.biome_bonus, 0.0)
        } else if (biome.index() + 1) % KIND_COUNT == kind.index() {
            (0.0, 0.0)
        } else {
            (0.0, self.settings.energy.biome_penalty)
        }
    }

    /// Terrain desirability of a cell for one kind
    fn env_score(&self, kind: Kind, coord: (usize, usize)) -> f32 {
        let humidity = self.environment.humidity_at(coord.0, coord.1);
        let fertility = self.environment.fertility_at(coord.0, coord.1);
        let biome = self.environment.biome_at(coord.0, coord.1);
        let (bonus, penalty) = self.biome_effect(kind, biome);
        humidity * 0.35 + fertility * 0.5 + bonus - penalty * 0.7
    }

    /// Direction toward the best habitat within scanning range, if any cell
    /// beats the current score by a clear margin.
    fn seek_habitat_direction(
        &self,
        x: usize,
        y: usize,
        kind: Kind,
        current_score: f32,
    ) -> Option<(f32, f32)> {
        let radius = self.settings.movement.habitat_seek_radius;
        if radius == 0 {
            return None;
        }
        let mut best_score = current_score;
        let mut best_coord: Option<(usize, usize)> = None;
        for (cx, cy) in self.scan_square(x, y, radius, false) {
            let score = self.env_score(kind, (cx, cy));
            if score > best_score + 0.05 {
                best_score = score;
                best_coord = Some((cx, cy));
            }
        }
        best_coord.map(|(bx, by)| (bx as f32 - x as f32, by as f32 - y as f32))
    }

    /// Herd pull toward same-kind density around a candidate cell
    fn herd_bonus(&self, kind: Kind, coord: (usize, usize)) -> f32 {
        let radius = self.settings.movement.herd_radius;
        if radius == 0 {
            return 0.0;
        }
        let mut total = 0usize;
        for (cx, cy) in self.scan_square(coord.0, coord.1, radius, false) {
            if self
                .environment
                .orc_at(cx, cy)
                .and_then(|other_id| self.orcs.get(&other_id))
                .is_some_and(|other| other.kind == kind)
            {
                total += 1;
            }
        }
        total as f32 * (self.settings.movement.herd_attraction / (radius * radius).max(1) as f32)
    }

    /// Threat pressure from other-kind orcs around a candidate cell
    fn threat_penalty(&self, kind: Kind, coord: (usize, usize)) -> f32 {
        let radius = self.settings.movement.escape_threat_radius;
        if radius == 0 {
            return 0.0;
        }
        let mut enemies = 0usize;
        for (cx, cy) in self.scan_square(coord.0, coord.1, radius, true) {
            if self
                .environment
                .orc_at(cx, cy)
                .and_then(|other_id| self.orcs.get(&other_id))
                .is_some_and(|other| other.kind != kind)
            {
                enemies += 1;
            }
        }
        enemies as f32 * self.settings.movement.escape_threat_weight
    }

    /// Same-kind and other-kind counts in the square around a cell,
    /// excluding the cell itself
    fn social_counts(&self, x: usize, y: usize, kind: Kind) -> (usize, usize) {
        let radius = self.settings.social.group_support_radius;
        let mut friends = 0usize;
        let mut foes = 0usize;
        for (cx, cy) in self.scan_square(x, y, radius, true) {
            if let Some(other) = self
                .environment
                .orc_at(cx, cy)
                .and_then(|other_id| self.orcs.get(&other_id))
            {
                if other.kind == kind {
                    friends += 1;
                } else {
                    foes += 1;
                }
            }
        }
        (friends, foes)
    }

    fn local_support_score(&self, id: OrcId) -> f32 {
        let Some(orc) = self.orcs.get(&id) else {
            return 0.0;
        };
        let (friends, foes) = self.social_counts(orc.x, orc.y, orc.kind);
        (friends as f32 - foes as f32 * 0.6) * self.settings.combat.support_score_factor
    }

    fn effective_fitness(&self, id: OrcId) -> f32 {
        let Some(orc) = self.orcs.get(&id) else {
            return 0.0;
        };
        let mut fitness = orc.fitness();
        if orc.infected {
            fitness *= (1.0 - self.settings.disease.fight_penalty).max(0.2);
        }
        fitness
    }

    /// In-bounds cells of the square of the given radius around a center,
    /// row by row, optionally skipping the center itself
    fn scan_square(
        &self,
        x: usize,
        y: usize,
        radius: usize,
        exclude_center: bool,
    ) -> Vec<(usize, usize)> {
        let width = self.environment.width() as i32;
        let height = self.environment.height() as i32;
        let (x0, y0) = (x as i32, y as i32);
        let r = radius as i32;

        let mut cells = Vec::new();
        for cy in (y0 - r).max(0)..=(y0 + r).min(height - 1) {
            for cx in (x0 - r).max(0)..=(x0 + r).min(width - 1) {
                if exclude_center && cx == x0 && cy == y0 {
                    continue;
                }
                cells.push((cx as usize, cy as usize));
            }
        }
        cells
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// Live population count
    pub fn population(&self) -> usize {
        self.orcs.len()
    }

    pub fn is_extinct(&self) -> bool {
        self.orcs.is_empty()
    }

    /// The seed this run replays from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Live population per kind
    pub fn counts_by_kind(&self) -> [usize; KIND_COUNT] {
        let mut counts = [0usize; KIND_COUNT];
        for orc in self.orcs.values() {
            counts[orc.kind.index()] += 1;
        }
        counts
    }

    fn kind_count(&self, kind: Kind) -> usize {
        self.orcs.values().filter(|orc| orc.kind == kind).count()
    }

    /// Aggregate metrics for the current state
    pub fn metrics(&self) -> Metrics {
        let mut metrics = Metrics {
            tick: self.tick,
            ..Metrics::default()
        };
        let count = self.orcs.len();
        if count == 0 {
            return metrics;
        }

        metrics.population = count;
        for orc in self.orcs.values() {
            metrics.average_strength += orc.strength;
            metrics.average_agility += orc.agility;
            metrics.average_resilience += orc.resilience;
            if orc.infected {
                metrics.infected += 1;
            }
            metrics.kind_counts[orc.kind.index()] += 1;
        }
        metrics.average_strength /= count as f32;
        metrics.average_agility /= count as f32;
        metrics.average_resilience /= count as f32;
        metrics
    }
}

/// Energy delta from humidity alone: dryness below 0.45 costs, wet ground
/// above 0.65 pays.
fn humidity_delta(humidity: f32, settings: &Settings) -> f32 {
    if humidity < 0.45 {
        -((0.45 - humidity) * settings.energy.humidity_penalty)
    } else if humidity > 0.65 {
        (humidity - 0.65) * settings.energy.humidity_bonus
    } else {
        0.0
    }
}
