//! Performance benchmarks for ORC AUTOMATA

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use orc_automata::{Settings, Simulation};

fn benchmark_simulation_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_step");

    for size in [32usize, 64, 96].iter() {
        let mut settings = Settings::default();
        settings.world.grid_width = *size;
        settings.world.grid_height = *size;

        let mut simulation = Simulation::new_with_seed(settings, 42);

        // Warm up
        simulation.run(10);

        group.bench_with_input(BenchmarkId::new("grid", size), size, |b, _| {
            b.iter(|| {
                simulation.step();
            });
        });
    }

    group.finish();
}

fn benchmark_environment_generation(c: &mut Criterion) {
    let mut settings = Settings::default();
    settings.world.grid_width = 128;
    settings.world.grid_height = 128;
    settings.world.initial_orc_ratio = 0.0;

    c.bench_function("environment_reset_128", |b| {
        let mut simulation = Simulation::new_with_seed(settings.clone(), 42);
        b.iter(|| {
            simulation.reset();
        });
    });
}

criterion_group!(
    benches,
    benchmark_simulation_step,
    benchmark_environment_generation
);
criterion_main!(benches);
