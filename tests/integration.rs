//! Integration tests for ORC AUTOMATA

use orc_automata::{Kind, OrcId, Settings, Simulation};
use std::collections::HashSet;

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.world.grid_width = 32;
    settings.world.grid_height = 24;
    settings.world.initial_orc_ratio = 0.1;
    settings
}

/// Every occupied cell must point at a live orc whose recorded position is
/// that cell, and no orc may be missing its cell.
fn assert_grid_consistent(simulation: &Simulation) {
    let mut seen: HashSet<OrcId> = HashSet::new();
    let env = &simulation.environment;

    for y in 0..env.height() {
        for x in 0..env.width() {
            if let Some(id) = env.orc_at(x, y) {
                assert!(seen.insert(id), "id {} appears in two cells", id);
                let orc = simulation
                    .orcs
                    .get(&id)
                    .unwrap_or_else(|| panic!("cell ({x}, {y}) references dead id {id}"));
                assert_eq!((orc.x, orc.y), (x, y), "orc {} position diverged", id);
            }
        }
    }

    assert_eq!(
        seen.len(),
        simulation.population(),
        "population and grid disagree on live orcs"
    );
}

#[test]
fn test_engine_creation() {
    let settings = test_settings();
    let expected = (32.0_f32 * 24.0 * 0.1) as usize;
    let simulation = Simulation::new_with_seed(settings, 12345);

    assert_eq!(simulation.population(), expected);
    assert_eq!(simulation.tick, 0);
    assert_grid_consistent(&simulation);
}

#[test]
fn test_grid_consistency_over_many_ticks() {
    let mut simulation = Simulation::new_with_seed(test_settings(), 54321);

    for _ in 0..20 {
        simulation.run(10);
        assert_grid_consistent(&simulation);
    }
}

#[test]
fn test_terrain_layers_within_bounds() {
    let simulation = Simulation::new_with_seed(test_settings(), 777);
    let env = &simulation.environment;

    let mut biome_counts = [0usize; 3];
    for y in 0..env.height() {
        for x in 0..env.width() {
            let humidity = env.humidity_at(x, y);
            let fertility = env.fertility_at(x, y);
            assert!((0.0..=1.0).contains(&humidity));
            assert!((0.0..=1.0).contains(&fertility));
            biome_counts[env.biome_at(x, y).index()] += 1;
        }
    }

    // Tertile partition keeps the three biome areas roughly equal.
    let third = (env.width() * env.height()) / 3;
    for count in biome_counts {
        assert!(
            (count as i64 - third as i64).abs() <= 3,
            "unbalanced biomes: {:?}",
            biome_counts
        );
    }
}

#[test]
fn test_determinism_exact_replay() {
    let mut first = Simulation::new_with_seed(test_settings(), 99999);
    let mut second = Simulation::new_with_seed(test_settings(), 99999);

    for _ in 0..300 {
        first.step();
        second.step();
        assert_eq!(first.metrics(), second.metrics());
    }

    // Full state must match, not just the aggregates.
    assert_eq!(first.orcs, second.orcs);
    assert_eq!(first.counts_by_kind(), second.counts_by_kind());
    assert_eq!(first.seed(), second.seed());
}

#[test]
fn test_different_seeds_diverge() {
    let mut first = Simulation::new_with_seed(test_settings(), 1);
    let mut second = Simulation::new_with_seed(test_settings(), 2);

    first.run(100);
    second.run(100);

    // Same shape, different worlds.
    assert_eq!(first.tick, second.tick);
    assert_ne!(first.orcs, second.orcs);
}

#[test]
fn test_reset_continues_seed_lineage() {
    let mut first = Simulation::new_with_seed(test_settings(), 2024);
    let mut second = Simulation::new_with_seed(test_settings(), 2024);

    first.run(50);
    second.run(50);
    first.reset();
    second.reset();

    assert_eq!(first.tick, 0);
    assert_grid_consistent(&first);

    first.run(50);
    second.run(50);
    assert_eq!(first.orcs, second.orcs);
}

#[test]
fn test_reset_regenerates_terrain() {
    let mut simulation = Simulation::new_with_seed(test_settings(), 31);
    let env = &simulation.environment;

    let before: Vec<f32> = (0..env.height())
        .flat_map(|y| (0..env.width()).map(move |x| (x, y)))
        .map(|(x, y)| env.humidity_at(x, y))
        .collect();

    simulation.reset();

    let env = &simulation.environment;
    let after: Vec<f32> = (0..env.height())
        .flat_map(|y| (0..env.width()).map(move |x| (x, y)))
        .map(|(x, y)| env.humidity_at(x, y))
        .collect();

    // The RNG stream moved on, so the regenerated map differs.
    assert_ne!(before, after);
}

#[test]
fn test_ids_unique_and_monotonic_under_churn() {
    let mut settings = test_settings();
    // Push reproduction hard to force plenty of births and deaths.
    settings.reproduction.chance = 0.5;
    settings.reproduction.threshold = 3.0;
    let mut simulation = Simulation::new_with_seed(settings, 7);

    let mut seen: HashSet<OrcId> = simulation.orcs.keys().copied().collect();
    let mut highest: OrcId = seen.iter().copied().max().unwrap_or(0);

    for _ in 0..300 {
        simulation.step();
        for &id in simulation.orcs.keys() {
            if seen.insert(id) {
                assert!(id > highest, "id {} was reused or out of order", id);
            }
        }
        highest = highest.max(simulation.orcs.keys().copied().max().unwrap_or(0));
    }
}

#[test]
fn test_population_respects_cap_pressure() {
    let mut settings = test_settings();
    settings.population.max_population = 40;
    settings.reproduction.chance = 0.5;
    settings.reproduction.threshold = 3.0;
    let mut simulation = Simulation::new_with_seed(settings, 19);

    simulation.run(400);

    // The cull is probabilistic, so allow overshoot, but the population must
    // not run away from the cap.
    assert!(
        simulation.population() < 120,
        "cull failed to contain the population: {}",
        simulation.population()
    );
}

#[test]
fn test_kind_counts_partition_population() {
    let mut simulation = Simulation::new_with_seed(test_settings(), 3);
    simulation.run(150);

    let counts = simulation.counts_by_kind();
    assert_eq!(counts.iter().sum::<usize>(), simulation.population());

    let by_hand = simulation
        .orcs
        .values()
        .filter(|orc| orc.kind == Kind::Dustkin)
        .count();
    assert_eq!(counts[Kind::Dustkin.index()], by_hand);
}

#[test]
fn test_agents_stay_in_bounds() {
    let mut simulation = Simulation::new_with_seed(test_settings(), 55);
    simulation.run(200);

    for orc in simulation.orcs.values() {
        assert!(orc.x < simulation.environment.width());
        assert!(orc.y < simulation.environment.height());
        // Energy can dip to zero or below late in a tick (fights, moves,
        // poor foraging); such orcs die at their next death check. Age has
        // no such window: anyone past the limit was removed when processed.
        assert!(orc.age <= simulation.settings.population.max_age);
    }
}

#[test]
fn test_metrics_track_population() {
    let mut simulation = Simulation::new_with_seed(test_settings(), 88);
    simulation.run(100);

    let metrics = simulation.metrics();
    assert_eq!(metrics.tick, 100);
    assert_eq!(metrics.population, simulation.population());
    if metrics.population > 0 {
        assert!(metrics.average_strength > 0.0);
        assert!(metrics.average_agility > 0.0);
        assert!(metrics.average_resilience > 0.0);
    }
}

#[test]
fn test_two_cell_world_survives_stepping() {
    // Smallest interesting world: two cells, no room to move or reproduce.
    let mut settings = Settings::default();
    settings.world.grid_width = 2;
    settings.world.grid_height = 1;
    settings.world.initial_orc_ratio = 1.0;
    let mut simulation = Simulation::new_with_seed(settings, 6);

    assert_eq!(simulation.population(), 2);
    for _ in 0..50 {
        simulation.step();
        assert_grid_consistent(&simulation);
        if simulation.is_extinct() {
            break;
        }
    }
}
