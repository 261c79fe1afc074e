//! Reference plant runs: completion, reproducibility and reporting.

use waterplant::prelude::*;

fn two_days() -> u64 {
    2 * waterplant::engine::MINUTES_PER_DAY
}

// H0: The reference plant cannot survive its own configured run
// Falsification: 48 hours of sinusoidal demand with production-group control
#[test]
fn reference_plant_completes_two_days() {
    let config = PlantConfig::reference();
    let mut sim = Simulation::from_config(&config).unwrap();
    let report = sim.run(config.run.minutes);

    assert!(report.is_ok(), "aborted: {:?}", report.error);
    assert_eq!(report.ticks, two_days());

    let summary = &report.summary;
    assert!(summary.backwash_count > 0);
    assert!(summary.min_reservoir_level > 0.0);
    assert!(summary.max_reservoir_level <= 1.0);
    assert!(summary.peak_backwash_buffer <= config.treatment.backwash_buffer_volume);
    assert!(summary.energy_kwh > 0.0);
    assert!(summary.peak_quarter_hour_power <= summary.peak_power);
}

// H0: Identical configurations produce different result logs
// Falsification: two runs of the reference plant must fingerprint the same
#[test]
fn reference_plant_is_reproducible() {
    let config = PlantConfig::reference();
    let a = Simulation::from_config(&config).unwrap().run(720);
    let b = Simulation::from_config(&config).unwrap().run(720);
    assert_eq!(a.summary.fingerprint, b.summary.fingerprint);
    assert_eq!(a.summary, b.summary);
}

// H0: Demand noise is ignored by the fingerprint
// Falsification: different noise seeds must produce different logs
#[test]
fn noise_seed_changes_fingerprint() {
    let noisy = |seed| {
        PlantConfig::builder()
            .demand(DemandConfig::Sinusoid(SinusoidDemand {
                noise: 20.0,
                seed,
                ..SinusoidDemand::default()
            }))
            .build()
    };
    let a = Simulation::from_config(&noisy(1)).unwrap().run(120);
    let b = Simulation::from_config(&noisy(2)).unwrap().run(120);
    assert!(a.is_ok() && b.is_ok());
    assert_ne!(a.summary.fingerprint, b.summary.fingerprint);
}

// H0: At most one filter plant-wide is ever offline
// Falsification: scan every street snapshot of the reference run
#[test]
fn reference_plant_backwashes_one_filter_at_a_time() {
    let mut sim = Simulation::from_config(&PlantConfig::reference()).unwrap();
    assert!(sim.run(two_days()).is_ok());

    let treatment = sim.treatment();
    let street = &treatment.filter_streets()[0];
    assert_eq!(street.results().len() as u64, two_days());
    for snapshot in street.results() {
        let offline = snapshot
            .filter_status
            .iter()
            .filter(|s| **s == FilterStatus::Backwashing)
            .count();
        assert!(offline <= 1);
    }

    let started = treatment
        .events()
        .iter()
        .filter(|e| matches!(e, PlantEvent::BackwashStarted { .. }))
        .count() as u64;
    assert_eq!(started, treatment.backwash_count());
    assert!(treatment
        .events()
        .iter()
        .any(|e| matches!(e, PlantEvent::WarmUpCompleted { step: 1440 })));
}

// H0: Restricting backwash to the night never hurts
// Falsification: four filters cannot wait for a five-hour nightly window and
// the run must stop on a filter overrun on the first tick after warm-up
#[test]
fn night_only_backwash_overruns_reference_filters() {
    let config = PlantConfig::builder()
        .controller(ControllerConfig::ProductionGroups(
            ProductionGroupConfig::night_backwash(),
        ))
        .build();
    let report = Simulation::from_config(&config).unwrap().run(two_days());

    let err = report.error.unwrap();
    assert!(
        matches!(err, SimError::FilterOverrun { step: 1441, .. }),
        "unexpected error: {err}"
    );
    assert!(err.is_invariant_violation());
    assert_eq!(report.ticks, 1440);
}

// H0: The tick log loses information on the way to disk
// Falsification: every JSON line parses back to its tick, time and state
#[test]
fn tick_log_json_lines_parse_back() {
    let mut sim = Simulation::from_config(&PlantConfig::reference()).unwrap();
    assert!(sim.run(90).is_ok());
    let log = sim.treatment().results();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ticks.jsonl");
    log.write_json_lines(std::fs::File::create(&path).unwrap())
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let parsed: Vec<TickRecord> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(parsed.len(), log.len());
    for (back, written) in parsed.iter().zip(log) {
        assert_eq!(back.step, written.step);
        assert_eq!(back.time, written.time);
        assert_eq!(back.backwash_filter, written.backwash_filter);
        assert!((back.reservoir_volume - written.reservoir_volume).abs() < 1e-9);
        assert!((back.total_power - written.total_power).abs() < 1e-9);
    }

    let quarters = log.quarter_hour_power();
    assert_eq!(quarters.iter().map(|q| q.samples).sum::<usize>(), 90);
}

// H0: The shipped demo file drifts from the built-in reference plant
// Falsification: load demos/reference_plant.yaml and compare section by section
#[test]
fn demo_file_matches_reference() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/reference_plant.yaml");
    let loaded = PlantConfig::load(path).unwrap();
    let reference = PlantConfig::reference();

    assert_eq!(loaded.treatment, reference.treatment);
    assert_eq!(loaded.filter_streets, reference.filter_streets);
    assert_eq!(loaded.controller, reference.controller);
    assert_eq!(loaded.demand, reference.demand);
    assert_eq!(loaded.run.minutes, reference.run.minutes);
}
