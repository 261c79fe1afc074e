//! Plant transition events.
//!
//! The treatment never prints. Every state transition becomes a
//! [`PlantEvent`] that is appended to the treatment's transition log and
//! handed to an optional [`EventSink`]; the caller decides how to surface it.

use serde::{Deserialize, Serialize};

use super::FilterId;

/// A state transition inside the plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlantEvent {
    /// A filter crossed its soft cap and entered the backwash queue.
    FilterQueued {
        /// Tick.
        step: u64,
        /// Queued filter.
        filter: FilterId,
        /// Run volume at the moment of queueing (m³).
        volume: f64,
    },
    /// A backwash cycle started.
    BackwashStarted {
        /// Tick (the start happens during this tick's controller call).
        step: u64,
        /// Serviced filter.
        filter: FilterId,
    },
    /// A backwash cycle completed and the filter is back in production.
    BackwashFinished {
        /// Tick.
        step: u64,
        /// Serviced filter.
        filter: FilterId,
    },
    /// Reservoir would have exceeded capacity and was clamped. Emitted on the
    /// first tick of a clamped stretch only.
    ReservoirClamped {
        /// Tick.
        step: u64,
        /// Volume discarded by the clamp (m³).
        excess: f64,
    },
    /// Warm-up ended; all invariants are enforced from the next tick.
    WarmUpCompleted {
        /// Tick.
        step: u64,
    },
}

impl PlantEvent {
    /// Tick at which the event happened.
    #[must_use]
    pub const fn step(&self) -> u64 {
        match self {
            Self::FilterQueued { step, .. }
            | Self::BackwashStarted { step, .. }
            | Self::BackwashFinished { step, .. }
            | Self::ReservoirClamped { step, .. }
            | Self::WarmUpCompleted { step } => *step,
        }
    }
}

/// Observer for plant transitions.
pub trait EventSink: Send {
    /// Called once per event, in the order events happen.
    fn on_event(&mut self, event: &PlantEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&PlantEvent) + Send,
{
    fn on_event(&mut self, event: &PlantEvent) {
        self(event);
    }
}

/// Forwards plant events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&mut self, event: &PlantEvent) {
        match event {
            PlantEvent::FilterQueued {
                step,
                filter,
                volume,
            } => {
                tracing::debug!(
                    step,
                    street = filter.street,
                    filter = filter.filter,
                    volume,
                    "filter queued for backwash"
                );
            }
            PlantEvent::BackwashStarted { step, filter } => {
                tracing::info!(
                    step,
                    street = filter.street,
                    filter = filter.filter,
                    "backwash started"
                );
            }
            PlantEvent::BackwashFinished { step, filter } => {
                tracing::info!(
                    step,
                    street = filter.street,
                    filter = filter.filter,
                    "backwash finished"
                );
            }
            PlantEvent::ReservoirClamped { step, excess } => {
                tracing::trace!(step, excess, "reservoir clamped at capacity");
            }
            PlantEvent::WarmUpCompleted { step } => {
                tracing::info!(step, "warm-up completed, enforcing all invariants");
            }
        }
    }
}
