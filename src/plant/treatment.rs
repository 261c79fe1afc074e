//! Treatment: reservoir, backwash buffer and the backwash installation.
//!
//! One call to [`Treatment::update`] is one simulated minute. The order of
//! work inside a tick is fixed:
//!
//! 1. advance the clock
//! 2. ask the controller for a production flow (kept from the previous tick
//!    when no controller is attached)
//! 3. feed the production flow to every street
//! 4. queue filters past their soft cap
//! 5. advance the running backwash
//! 6. update the reservoir
//! 7. balance the backwash buffer against its drain
//! 8. compute power draw
//! 9. close the warm-up window if its last tick has passed
//! 10. append the tick record
//!
//! Every street receives the full production flow; it is not divided across
//! streets.
//!
//! Backwash water reaches the buffer twice per minute: once when step 5
//! advances the programme and again in the step 7 balance
//! `buffer += (backwash_flow - drain) / 60`. The double count is part of the
//! plant model and buffer sizing is done against it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::TreatmentConfig;
use crate::controller::{ControlHandle, Controller};
use crate::engine::clock::{MinuteClock, MINUTES_PER_HOUR};
use crate::engine::jidoka::PlantGuard;
use crate::error::{SimError, SimResult};

use super::events::{EventSink, PlantEvent};
use super::filter_street::FilterStreet;
use super::queue::BackwashQueue;
use super::record::{PowerBreakdown, ResultLog, TickRecord};
use super::FilterId;

/// State of the backwash installation. At most one backwash runs plant-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackwashState {
    /// Nothing running.
    Idle,
    /// Servicing `filter`; `step` minutes of its programme have elapsed.
    Running {
        /// Filter being backwashed.
        filter: FilterId,
        /// Elapsed programme minutes.
        step: usize,
    },
}

/// A water treatment plant.
pub struct Treatment {
    params: TreatmentConfig,
    reservoir_volume: f64,
    backwash_buffer: f64,
    reservoir_clamped: bool,
    streets: Vec<FilterStreet>,
    backwash: BackwashState,
    queue: BackwashQueue,
    clock: MinuteClock,
    production_flow: f64,
    backwash_count: u64,
    guard: PlantGuard,
    controller: Option<Box<dyn Controller>>,
    sink: Option<Box<dyn EventSink>>,
    events: Vec<PlantEvent>,
    results: ResultLog,
}

impl Treatment {
    /// Create a treatment with the given filter streets.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a capacity is not positive, the initial volume lies
    /// outside `[0, capacity]`, or a rate is negative or non-finite.
    pub fn new(params: TreatmentConfig, streets: Vec<FilterStreet>) -> SimResult<Self> {
        let non_negative = [
            ("production_power", params.production_power),
            ("distribution_power", params.distribution_power),
            ("backwash_power", params.backwash_power),
            ("baseload_power", params.baseload_power),
            ("backwash_buffer_volume", params.backwash_buffer_volume),
            ("backwash_drain", params.backwash_drain),
            ("initialization_days", params.initialization_days),
        ];
        if let Some((name, value)) = non_negative
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v >= 0.0))
        {
            return Err(SimError::config(format!("{name} must be non-negative, got {value}")));
        }
        if !(params.reservoir_capacity.is_finite() && params.reservoir_capacity > 0.0) {
            return Err(SimError::config("reservoir_capacity must be positive"));
        }
        if !(0.0..=params.reservoir_capacity).contains(&params.reservoir_volume) {
            return Err(SimError::config(format!(
                "reservoir_volume {} outside [0, {}]",
                params.reservoir_volume, params.reservoir_capacity
            )));
        }

        Ok(Self {
            reservoir_volume: params.reservoir_volume,
            backwash_buffer: 0.0,
            reservoir_clamped: false,
            streets,
            backwash: BackwashState::Idle,
            queue: BackwashQueue::new(),
            clock: MinuteClock::new(params.start_time),
            production_flow: 0.0,
            backwash_count: 0,
            guard: PlantGuard::from_days(params.initialization_days),
            controller: None,
            sink: None,
            events: Vec::new(),
            results: ResultLog::new(),
            params,
        })
    }

    /// Attach a controller, replacing any previous one.
    #[must_use]
    pub fn with_controller(mut self, controller: Box<dyn Controller>) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Attach or detach a controller.
    pub fn set_controller(&mut self, controller: Option<Box<dyn Controller>>) {
        self.controller = controller;
    }

    /// Attach an event observer.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Append a filter street. Its index is the current street count.
    pub fn add_street(&mut self, street: FilterStreet) -> usize {
        self.streets.push(street);
        self.streets.len() - 1
    }

    // ===== Read access =====

    /// Construction parameters.
    #[must_use]
    pub const fn params(&self) -> &TreatmentConfig {
        &self.params
    }

    /// Reservoir content (m³).
    #[must_use]
    pub const fn reservoir_volume(&self) -> f64 {
        self.reservoir_volume
    }

    /// Reservoir capacity (m³).
    #[must_use]
    pub const fn reservoir_capacity(&self) -> f64 {
        self.params.reservoir_capacity
    }

    /// Reservoir content relative to capacity.
    #[must_use]
    pub fn reservoir_level(&self) -> f64 {
        self.reservoir_volume / self.params.reservoir_capacity
    }

    /// Backwash buffer content (m³).
    #[must_use]
    pub const fn backwash_buffer(&self) -> f64 {
        self.backwash_buffer
    }

    /// Backwash buffer capacity (m³).
    #[must_use]
    pub const fn backwash_buffer_volume(&self) -> f64 {
        self.params.backwash_buffer_volume
    }

    /// Continuous buffer drain (m³/h).
    #[must_use]
    pub const fn backwash_drain(&self) -> f64 {
        self.params.backwash_drain
    }

    /// State of the backwash installation.
    #[must_use]
    pub const fn backwash_state(&self) -> BackwashState {
        self.backwash
    }

    /// Whether a backwash is running.
    #[must_use]
    pub const fn backwash_active(&self) -> bool {
        matches!(self.backwash, BackwashState::Running { .. })
    }

    /// Filter being backwashed.
    #[must_use]
    pub const fn backwash_target(&self) -> Option<FilterId> {
        match self.backwash {
            BackwashState::Running { filter, .. } => Some(filter),
            BackwashState::Idle => None,
        }
    }

    /// Street of the running backwash.
    #[must_use]
    pub fn backwash_street(&self) -> Option<usize> {
        self.backwash_target().map(|id| id.street)
    }

    /// Filter index of the running backwash.
    #[must_use]
    pub fn backwash_filter(&self) -> Option<usize> {
        self.backwash_target().map(|id| id.filter)
    }

    /// Elapsed minutes of the running programme (0 when idle).
    #[must_use]
    pub const fn backwash_step(&self) -> usize {
        match self.backwash {
            BackwashState::Running { step, .. } => step,
            BackwashState::Idle => 0,
        }
    }

    /// Backwashes started since construction.
    #[must_use]
    pub const fn backwash_count(&self) -> u64 {
        self.backwash_count
    }

    /// Filters waiting for a backwash.
    #[must_use]
    pub const fn filter_queue(&self) -> &BackwashQueue {
        &self.queue
    }

    /// Filter streets, in index order.
    #[must_use]
    pub fn filter_streets(&self) -> &[FilterStreet] {
        &self.streets
    }

    /// Current tick.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.clock.step()
    }

    /// Minute of the simulated day.
    #[must_use]
    pub const fn minute_of_day(&self) -> u64 {
        self.clock.minute_of_day()
    }

    /// Current timestamp.
    #[must_use]
    pub fn time(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Most recent production flow (m³/h).
    #[must_use]
    pub const fn production_flow(&self) -> f64 {
        self.production_flow
    }

    /// Whether warm-up has completed.
    #[must_use]
    pub const fn initialization_time_reached(&self) -> bool {
        self.guard.initialization_time_reached()
    }

    /// Append-only result log.
    #[must_use]
    pub const fn results(&self) -> &ResultLog {
        &self.results
    }

    /// Transition events not yet taken.
    #[must_use]
    pub fn events(&self) -> &[PlantEvent] {
        &self.events
    }

    /// Take the transition events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<PlantEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Backwash installation =====

    /// Start backwashing the oldest queued filter.
    ///
    /// The filter's run volume is reset and it is taken offline.
    ///
    /// # Errors
    ///
    /// `BackwashAlreadyActive` if a backwash runs, `BackwashQueueEmpty` if
    /// nothing is queued. The plant is unchanged on error.
    pub fn start_backwash(&mut self) -> SimResult<FilterId> {
        self.ensure_idle()?;
        let id = self.queue.pop_front().ok_or(SimError::BackwashQueueEmpty)?;
        self.begin_backwash(id);
        Ok(id)
    }

    /// Start backwashing a specific filter, queued or not.
    ///
    /// # Errors
    ///
    /// `BackwashAlreadyActive` if a backwash runs, `UnknownFilter` if `id`
    /// does not exist. The plant is unchanged on error.
    pub fn start_backwash_for(&mut self, id: FilterId) -> SimResult<()> {
        self.ensure_idle()?;
        let exists = self
            .streets
            .get(id.street)
            .is_some_and(|s| id.filter < s.filter_count());
        if !exists {
            return Err(SimError::UnknownFilter {
                street: id.street,
                filter: id.filter,
            });
        }
        self.queue.remove(id);
        self.begin_backwash(id);
        Ok(())
    }

    fn ensure_idle(&self) -> SimResult<()> {
        match self.backwash {
            BackwashState::Running { filter, .. } => Err(SimError::BackwashAlreadyActive {
                street: filter.street,
                filter: filter.filter,
            }),
            BackwashState::Idle => Ok(()),
        }
    }

    fn begin_backwash(&mut self, id: FilterId) {
        self.streets[id.street].begin_backwash(id.filter);
        self.backwash = BackwashState::Running {
            filter: id,
            step: 0,
        };
        self.backwash_count += 1;
        self.emit(PlantEvent::BackwashStarted {
            step: self.clock.step(),
            filter: id,
        });
    }

    /// Queue every filter past its soft cap.
    ///
    /// # Errors
    ///
    /// `FilterOverrun` if a filter is past its hard maximum after warm-up.
    pub fn update_filter_queue(&mut self) -> SimResult<()> {
        let step = self.clock.step();
        let mut queued = Vec::new();
        for (s, street) in self.streets.iter().enumerate() {
            for (f, &volume) in street.filter_volumes().iter().enumerate() {
                let id = FilterId::new(s, f);
                self.guard
                    .check_filter(step, id, volume, street.max_run_volume())?;
                if volume > street.soft_cap_volume() && self.queue.enqueue(id) {
                    queued.push((id, volume));
                }
            }
        }
        for (filter, volume) in queued {
            self.emit(PlantEvent::FilterQueued {
                step,
                filter,
                volume,
            });
        }
        Ok(())
    }

    /// Advance the running backwash by one minute.
    ///
    /// Returns this minute's backwash flow (m³/h), already added to the
    /// buffer. Returns 0 when idle.
    pub fn update_backwash(&mut self) -> f64 {
        let BackwashState::Running { filter, step } = self.backwash else {
            return 0.0;
        };
        let programme = self.streets[filter.street].backwash_programme();
        let flow = programme.get(step).copied().unwrap_or(0.0);
        let finished = step + 1 >= programme.len();

        self.backwash_buffer += flow / MINUTES_PER_HOUR;

        if finished {
            self.backwash = BackwashState::Idle;
            self.streets[filter.street].end_backwash(filter.filter);
            self.emit(PlantEvent::BackwashFinished {
                step: self.clock.step(),
                filter,
            });
        } else {
            self.backwash = BackwashState::Running {
                filter,
                step: step + 1,
            };
        }
        flow
    }

    // ===== Tick =====

    /// Simulate one minute with the given demand (m³/h).
    ///
    /// Returns the record appended for this tick.
    ///
    /// # Errors
    ///
    /// Any fatal plant condition ends the run: reservoir underflow, filter
    /// overrun or buffer overflow (the latter two only after warm-up), a
    /// stalled street, an invalid flow, or a controller error.
    pub fn update(&mut self, distribution_flow: f64) -> SimResult<&TickRecord> {
        PlantGuard::check_flow("distribution", distribution_flow)?;

        let step = self.clock.tick();

        if let Some(mut controller) = self.controller.take() {
            let decision = controller.decide(&mut ControlHandle::new(self));
            self.controller = Some(controller);
            let flow = decision?;
            PlantGuard::check_flow("production", flow)?;
            self.production_flow = flow;
        }

        for street in &mut self.streets {
            street.update(self.production_flow)?;
        }

        self.update_filter_queue()?;

        let backwash_flow = self.update_backwash();

        self.update_reservoir(step, distribution_flow, backwash_flow)?;

        self.backwash_buffer = (self.backwash_buffer
            + (backwash_flow - self.params.backwash_drain) / MINUTES_PER_HOUR)
            .max(0.0);
        self.guard
            .check_buffer(step, self.backwash_buffer, self.params.backwash_buffer_volume)?;

        let power = PowerBreakdown {
            baseload_power: self.params.baseload_power,
            production_power: self.params.production_power * self.production_flow,
            distribution_power: self.params.distribution_power * distribution_flow,
            backwash_power: self.params.backwash_power * backwash_flow,
        };

        if self.guard.advance(step) {
            self.emit(PlantEvent::WarmUpCompleted { step });
        }

        let record = TickRecord {
            step,
            time: self.clock.now(),
            reservoir_volume: self.reservoir_volume,
            reservoir_level: self.reservoir_level(),
            backwash_buffer: self.backwash_buffer,
            backwash_active: self.backwash_active(),
            backwash_step: self.backwash_step(),
            backwash_street: self.backwash_street(),
            backwash_filter: self.backwash_filter(),
            queue_length: self.queue.len(),
            production_flow: self.production_flow,
            distribution_flow,
            backwash_flow,
            total_power: power.total(),
            power,
        };
        Ok(self.results.push(record))
    }

    /// Reservoir may not go negative; overfilling is clamped to capacity.
    /// `ReservoirClamped` is emitted on the first clamped tick of a stretch.
    fn update_reservoir(
        &mut self,
        step: u64,
        distribution_flow: f64,
        backwash_flow: f64,
    ) -> SimResult<()> {
        let net = self.production_flow - distribution_flow - backwash_flow;
        let next = self.reservoir_volume + net / MINUTES_PER_HOUR;
        PlantGuard::check_reservoir(step, next)?;

        let capacity = self.params.reservoir_capacity;
        if next > capacity {
            self.reservoir_volume = capacity;
            if !self.reservoir_clamped {
                self.emit(PlantEvent::ReservoirClamped {
                    step,
                    excess: next - capacity,
                });
            }
            self.reservoir_clamped = true;
        } else {
            self.reservoir_volume = next;
            self.reservoir_clamped = false;
        }
        Ok(())
    }

    fn emit(&mut self, event: PlantEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink.on_event(&event);
        }
        self.events.push(event);
    }
}

impl std::fmt::Debug for Treatment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Treatment")
            .field("step", &self.clock.step())
            .field("reservoir_volume", &self.reservoir_volume)
            .field("backwash_buffer", &self.backwash_buffer)
            .field("backwash", &self.backwash)
            .field("queue", &self.queue)
            .field("production_flow", &self.production_flow)
            .field("streets", &self.streets.len())
            .field(
                "controller",
                &self.controller.as_ref().map(|c| c.name().to_string()),
            )
            .finish_non_exhaustive()
    }
}
