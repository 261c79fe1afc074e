//! Run driver and run-level reporting.
//!
//! [`Simulation`] wires a [`PlantConfig`] into a treatment, a controller and
//! a demand source, and calls `update` once per minute. The treatment's
//! result log survives an aborted run, so a failed run can still be charted
//! up to the tick that failed.

use serde::{Deserialize, Serialize};

use crate::config::PlantConfig;
use crate::controller;
use crate::demand::Demand;
use crate::engine::clock::MINUTES_PER_HOUR;
use crate::error::{SimError, SimResult};
use crate::plant::{EventSink, FilterStreet, ResultLog, TickRecord, Treatment};

/// A configured plant plus its demand source.
#[derive(Debug)]
pub struct Simulation {
    treatment: Treatment,
    demand: Demand,
    minute: u64,
}

impl Simulation {
    /// Build a simulation from configuration.
    ///
    /// # Errors
    ///
    /// Returns configuration or validation errors.
    pub fn from_config(config: &PlantConfig) -> SimResult<Self> {
        config.check()?;

        let streets = config
            .filter_streets
            .iter()
            .map(FilterStreet::new)
            .collect::<SimResult<Vec<_>>>()?;

        let mut treatment = Treatment::new(config.treatment.clone(), streets)?;
        treatment.set_controller(controller::from_config(&config.controller));

        Ok(Self {
            treatment,
            demand: Demand::from_config(&config.demand),
            minute: 0,
        })
    }

    /// Attach an event observer to the treatment.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.treatment = self.treatment.with_event_sink(sink);
        self
    }

    /// The simulated plant.
    #[must_use]
    pub const fn treatment(&self) -> &Treatment {
        &self.treatment
    }

    /// Give up the driver and keep the plant.
    #[must_use]
    pub fn into_treatment(self) -> Treatment {
        self.treatment
    }

    /// Simulate one minute.
    ///
    /// # Errors
    ///
    /// Any fatal plant condition.
    pub fn step(&mut self) -> SimResult<&TickRecord> {
        let flow = self.demand.flow(self.minute);
        self.minute += 1;
        self.treatment.update(flow)
    }

    /// Simulate up to `minutes` minutes, stopping at the first fatal error.
    pub fn run(&mut self, minutes: u64) -> RunReport {
        let mut error = None;
        for _ in 0..minutes {
            if let Err(e) = self.step() {
                tracing::warn!(step = self.treatment.step(), error = %e, "run aborted");
                error = Some(e);
                break;
            }
        }
        RunReport {
            ticks: self.treatment.results().len() as u64,
            summary: RunSummary::from_treatment(&self.treatment),
            error,
        }
    }
}

/// Outcome of [`Simulation::run`].
#[derive(Debug)]
pub struct RunReport {
    /// Ticks completed successfully.
    pub ticks: u64,
    /// Summary over the completed ticks.
    pub summary: RunSummary,
    /// The error that ended the run early, if any.
    pub error: Option<SimError>,
}

impl RunReport {
    /// Whether every requested tick completed.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Turn an aborted run into its error.
    ///
    /// # Errors
    ///
    /// The error that ended the run.
    pub fn into_result(self) -> SimResult<RunSummary> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.summary),
        }
    }
}

/// Aggregate figures over a result log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks in the log.
    pub ticks: u64,
    /// Lowest reservoir level seen.
    pub min_reservoir_level: f64,
    /// Highest reservoir level seen.
    pub max_reservoir_level: f64,
    /// Highest backwash buffer content (m³).
    pub peak_backwash_buffer: f64,
    /// Backwashes started.
    pub backwash_count: u64,
    /// Energy drawn (kWh).
    pub energy_kwh: f64,
    /// Highest instantaneous power (kW).
    pub peak_power: f64,
    /// Highest quarter-hour mean power (kW).
    pub peak_quarter_hour_power: f64,
    /// BLAKE3 fingerprint of the result log.
    pub fingerprint: String,
}

impl RunSummary {
    /// Summarize a treatment's result log.
    #[must_use]
    pub fn from_treatment(treatment: &Treatment) -> Self {
        Self::from_log(treatment.results(), treatment.backwash_count())
    }

    /// Summarize a result log.
    #[must_use]
    pub fn from_log(log: &ResultLog, backwash_count: u64) -> Self {
        let mut min_level = f64::INFINITY;
        let mut max_level = f64::NEG_INFINITY;
        let mut peak_buffer: f64 = 0.0;
        let mut peak_power: f64 = 0.0;
        let mut energy = 0.0;
        for r in log {
            min_level = min_level.min(r.reservoir_level);
            max_level = max_level.max(r.reservoir_level);
            peak_buffer = peak_buffer.max(r.backwash_buffer);
            peak_power = peak_power.max(r.total_power);
            energy += r.total_power / MINUTES_PER_HOUR;
        }
        if log.is_empty() {
            min_level = 0.0;
            max_level = 0.0;
        }

        let peak_quarter_hour_power = log
            .quarter_hour_power()
            .iter()
            .map(|q| q.mean_power)
            .fold(0.0, f64::max);

        Self {
            ticks: log.len() as u64,
            min_reservoir_level: min_level,
            max_reservoir_level: max_level,
            peak_backwash_buffer: peak_buffer,
            backwash_count,
            energy_kwh: energy,
            peak_power,
            peak_quarter_hour_power,
            // Records are plain numbers and timestamps; encoding cannot fail.
            fingerprint: log.fingerprint().unwrap_or_default(),
        }
    }
}
