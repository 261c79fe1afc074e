//! End-to-end plant scenarios driven through the public API.

use waterplant::prelude::*;

fn street(filters: usize, programme: Vec<f64>) -> FilterStreet {
    FilterStreet::new(&FilterStreetConfig {
        name: "VF".to_string(),
        filter_count: filters,
        max_run_volume: 1000.0,
        soft_margin: 100.0,
        backwash_programme: programme,
    })
    .unwrap()
}

fn params() -> TreatmentConfig {
    TreatmentConfig {
        backwash_drain: 0.0,
        initialization_days: 0.0,
        ..TreatmentConfig::default()
    }
}

fn plant(params: TreatmentConfig, programme: Vec<f64>) -> Treatment {
    Treatment::new(params, vec![street(5, programme)]).unwrap()
}

// H0: Without a controller the reservoir drifts by something other than demand
// Falsification: 10 ticks at 230 m³/h; every tick must lose exactly 230/60 m³
#[test]
fn constant_demand_without_controller_drains_reservoir_linearly() {
    let mut t = plant(
        TreatmentConfig {
            backwash_drain: 100.0,
            ..params()
        },
        vec![600.0; 10],
    );

    for tick in 1..=10_u32 {
        let record = t.update(230.0).unwrap();
        assert_eq!(record.step, u64::from(tick));
        assert!(record.backwash_flow.abs() < f64::EPSILON);
        assert!(record.production_flow.abs() < f64::EPSILON);
        let expected = 800.0 - f64::from(tick) * 230.0 / 60.0;
        assert!(
            (record.reservoir_volume - expected).abs() < 1e-9,
            "tick {tick}: {} != {expected}",
            record.reservoir_volume
        );
    }

    assert_eq!(t.results().len(), 10);
    assert!(!t.backwash_active());
    assert!(t.filter_queue().is_empty());
}

// H0: Starting a backwash from an empty queue mutates the plant
// Falsification: the call fails and the plant looks exactly as before
#[test]
fn start_backwash_on_empty_queue_fails_without_mutation() {
    let mut t = plant(params(), vec![600.0; 3]);
    let volumes_before = t.filter_streets()[0].filter_volumes().to_vec();

    let err = t.start_backwash().unwrap_err();
    assert!(matches!(err, SimError::BackwashQueueEmpty));
    assert!(err.is_backwash_misuse());

    assert_eq!(t.backwash_state(), BackwashState::Idle);
    assert_eq!(t.backwash_street(), None);
    assert_eq!(t.backwash_filter(), None);
    assert_eq!(t.backwash_count(), 0);
    assert_eq!(t.filter_streets()[0].filter_volumes(), volumes_before.as_slice());
    assert!(t
        .filter_streets()[0]
        .filter_status()
        .iter()
        .all(|s| s.is_active()));
}

// H0: Two backwashes can run at once
// Falsification: the second start is refused with "already active"
#[test]
fn second_backwash_start_is_refused() {
    let mut t = plant(params(), vec![600.0; 3]);
    t.start_backwash_for(FilterId::new(0, 1)).unwrap();

    let err = t.start_backwash_for(FilterId::new(0, 2)).unwrap_err();
    assert!(matches!(
        err,
        SimError::BackwashAlreadyActive {
            street: 0,
            filter: 1
        }
    ));
    assert!(err.to_string().contains("already active"));

    // Only the first filter went offline.
    let status = t.filter_streets()[0].filter_status();
    assert_eq!(status.iter().filter(|s| !s.is_active()).count(), 1);
    assert_eq!(status[1], FilterStatus::Backwashing);
}

// H0: A backwash cycle leaves the wrong amount of water in the buffer
// Falsification: programme [600, 600, 600, 0, 0] with no drain reaches the
// buffer through the programme and the balance, 60 m³ in total, and the
// filter returns to service clean at step 5
#[test]
fn backwash_cycle_fills_buffer_and_restores_filter() {
    let mut t = plant(params(), vec![600.0, 600.0, 600.0, 0.0, 0.0]);
    let target = FilterId::new(0, 3);
    t.start_backwash_for(target).unwrap();

    for tick in 1..=4_u64 {
        let record = t.update(0.0).unwrap();
        assert!(record.backwash_active, "tick {tick}");
        assert_eq!(record.backwash_street, Some(0));
        assert_eq!(record.backwash_filter, Some(3));
    }

    let record = t.update(0.0).unwrap();
    assert_eq!(record.step, 5);
    assert!(!record.backwash_active);
    assert!((record.backwash_buffer - 60.0).abs() < 1e-9);
    assert!((t.backwash_buffer() - 60.0).abs() < 1e-9);

    let street = &t.filter_streets()[0];
    assert_eq!(street.filter_status()[3], FilterStatus::Active);
    assert!(street.filter_volumes()[3].abs() < f64::EPSILON);
    assert_eq!(t.backwash_state(), BackwashState::Idle);

    let events = t.take_events();
    assert!(events.contains(&PlantEvent::BackwashFinished {
        step: 5,
        filter: target
    }));
}

// H0: Warm-up suppresses checks forever, or not at all
// Falsification: with a two-tick warm-up an overfull buffer is tolerated on
// ticks 1 and 2 and fatal on tick 3
#[test]
fn warm_up_defers_buffer_overflow_until_it_ends() {
    let mut t = plant(
        TreatmentConfig {
            backwash_buffer_volume: 15.0,
            initialization_days: 2.0 / 1440.0,
            ..params()
        },
        vec![600.0; 5],
    );
    t.start_backwash_for(FilterId::new(0, 0)).unwrap();

    assert!(!t.initialization_time_reached());
    t.update(0.0).unwrap();
    let second = t.update(0.0).unwrap();
    assert!((second.backwash_buffer - 40.0).abs() < 1e-9);
    assert!(t.initialization_time_reached());

    let err = t.update(0.0).unwrap_err();
    assert!(matches!(err, SimError::BufferOverflow { step: 3, .. }));
    assert!(err.is_invariant_violation());
    assert_eq!(t.results().len(), 2);
}

// H0: A controller cannot steer the plant
// Falsification: a closure that starts every queued backwash drains the queue
#[test]
fn closure_controller_services_queue() {
    let mut t = Treatment::new(params(), vec![street(2, vec![600.0; 2])])
        .unwrap()
        .with_controller(Box::new(
            |plant: &mut ControlHandle<'_>| -> SimResult<f64> {
                if plant.queue_len() > 0 && !plant.backwash_active() {
                    plant.start_backwash()?;
                }
                Ok(120.0)
            },
        ));

    // Filter 1 starts at 500 m³ and crosses the 900 m³ soft cap after a few
    // hours at 1 m³ per minute.
    let mut started = false;
    for _ in 0..600 {
        t.update(60.0).unwrap();
        started |= t.backwash_active();
    }
    assert!(started);
    assert!(t.backwash_count() >= 1);
    assert!(t.filter_queue().len() <= 2);
}
