//! Controller contract.
//!
//! A controller is consulted once per tick. It sees the plant through a
//! [`ControlHandle`]: a read-only projection of the treatment plus the single
//! mutating capability it is allowed, starting the next queued backwash. It
//! returns the production flow (m³/h) for the tick.
//!
//! Controllers must be deterministic given identical plant state; run
//! reproducibility depends on it.

pub mod groups;

use chrono::NaiveDateTime;

use crate::config::ControllerConfig;
use crate::error::SimResult;
use crate::plant::{FilterId, Treatment};

pub use groups::ProductionGroupController;

/// Production / backwash policy.
pub trait Controller: Send {
    /// Decide this tick's production flow (m³/h), optionally starting a
    /// backwash through `plant`.
    ///
    /// # Errors
    ///
    /// Errors from `start_backwash`, or policy-specific failures, abort the
    /// tick.
    fn decide(&mut self, plant: &mut ControlHandle<'_>) -> SimResult<f64>;

    /// Name for reports.
    fn name(&self) -> &str {
        "controller"
    }
}

impl<F> Controller for F
where
    F: FnMut(&mut ControlHandle<'_>) -> SimResult<f64> + Send,
{
    fn decide(&mut self, plant: &mut ControlHandle<'_>) -> SimResult<f64> {
        self(plant)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Build the controller described by `config`, if any.
#[must_use]
pub fn from_config(config: &ControllerConfig) -> Option<Box<dyn Controller>> {
    match config {
        ControllerConfig::None => None,
        ControllerConfig::ProductionGroups(groups) => {
            Some(Box::new(ProductionGroupController::new(groups.clone())))
        }
    }
}

/// What a controller may see and do during its tick.
pub struct ControlHandle<'a> {
    plant: &'a mut Treatment,
}

impl<'a> ControlHandle<'a> {
    pub(crate) fn new(plant: &'a mut Treatment) -> Self {
        Self { plant }
    }

    /// Reservoir content relative to capacity.
    #[must_use]
    pub fn reservoir_level(&self) -> f64 {
        self.plant.reservoir_level()
    }

    /// Reservoir content (m³).
    #[must_use]
    pub fn reservoir_volume(&self) -> f64 {
        self.plant.reservoir_volume()
    }

    /// Reservoir capacity (m³).
    #[must_use]
    pub fn reservoir_capacity(&self) -> f64 {
        self.plant.reservoir_capacity()
    }

    /// Number of filters waiting for a backwash.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.plant.filter_queue().len()
    }

    /// Waiting filters, oldest first.
    pub fn queued(&self) -> impl Iterator<Item = FilterId> + '_ {
        self.plant.filter_queue().iter()
    }

    /// Whether a backwash is running.
    #[must_use]
    pub fn backwash_active(&self) -> bool {
        self.plant.backwash_active()
    }

    /// Backwash buffer content (m³).
    #[must_use]
    pub fn backwash_buffer(&self) -> f64 {
        self.plant.backwash_buffer()
    }

    /// Backwash buffer capacity (m³).
    #[must_use]
    pub fn backwash_buffer_capacity(&self) -> f64 {
        self.plant.backwash_buffer_volume()
    }

    /// Free buffer space (m³).
    #[must_use]
    pub fn buffer_headroom(&self) -> f64 {
        self.plant.backwash_buffer_volume() - self.plant.backwash_buffer()
    }

    /// Current tick.
    #[must_use]
    pub fn step(&self) -> u64 {
        self.plant.step()
    }

    /// Minute of the simulated day (`step mod 1440`).
    #[must_use]
    pub fn minute_of_day(&self) -> u64 {
        self.plant.minute_of_day()
    }

    /// Current timestamp.
    #[must_use]
    pub fn time(&self) -> NaiveDateTime {
        self.plant.time()
    }

    /// Production flow decided on the previous tick (m³/h).
    #[must_use]
    pub fn production_flow(&self) -> f64 {
        self.plant.production_flow()
    }

    /// Start backwashing the oldest queued filter.
    ///
    /// # Errors
    ///
    /// `BackwashAlreadyActive` or `BackwashQueueEmpty`; the plant is left
    /// unchanged.
    pub fn start_backwash(&mut self) -> SimResult<FilterId> {
        self.plant.start_backwash()
    }
}

impl std::fmt::Debug for ControlHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlHandle")
            .field("step", &self.step())
            .field("reservoir_level", &self.reservoir_level())
            .field("queue_len", &self.queue_len())
            .field("backwash_active", &self.backwash_active())
            .finish()
    }
}
