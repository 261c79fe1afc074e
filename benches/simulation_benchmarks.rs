//! Plant simulation benchmarks.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use waterplant::prelude::*;

/// One simulated day of the reference plant, from construction to summary.
fn bench_reference_day(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_plant");
    group.sample_size(20);

    let config = PlantConfig::reference();
    group.bench_function("one_day", |b| {
        b.iter(|| {
            let mut sim = Simulation::from_config(&config).unwrap_or_else(|e| panic!("{e}"));
            black_box(sim.run(1440).summary.energy_kwh)
        });
    });

    group.finish();
}

/// Cost of a single tick as the number of filters grows.
fn bench_tick_by_filter_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("treatment_tick");
    group.sample_size(50);

    for filters in [4_usize, 16, 64] {
        group.bench_with_input(BenchmarkId::new("filters", filters), &filters, |b, &n| {
            let config = PlantConfig::builder()
                .street(FilterStreetConfig {
                    filter_count: n,
                    ..FilterStreetConfig::default()
                })
                .demand(DemandConfig::Constant { flow: 230.0 })
                .build();
            b.iter(|| {
                let mut sim = Simulation::from_config(&config).unwrap_or_else(|e| panic!("{e}"));
                for _ in 0..60 {
                    if let Ok(record) = sim.step() {
                        black_box(record.total_power);
                    }
                }
            });
        });
    }

    group.finish();
}

/// Result-log fingerprinting over a day of records.
fn bench_fingerprint(c: &mut Criterion) {
    let mut sim =
        Simulation::from_config(&PlantConfig::reference()).unwrap_or_else(|e| panic!("{e}"));
    let _ = sim.run(1440);
    let log = sim.treatment().results();

    c.bench_function("fingerprint_one_day", |b| {
        b.iter(|| black_box(log.fingerprint().map(|f| f.len())));
    });
}

criterion_group!(
    benches,
    bench_reference_day,
    bench_tick_by_filter_count,
    bench_fingerprint
);
criterion_main!(benches);
