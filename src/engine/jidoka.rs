//! Jidoka (自働化) - stop the plant on impossible states.
//!
//! The guard owns the warm-up window and every hard check the treatment
//! runs per tick. Checks come in two groups:
//!
//! - **Always enforced**: non-finite values and a negative reservoir. These
//!   cannot be explained away by a rough initial condition.
//! - **Enforced after warm-up**: filter run-volume ceilings and backwash
//!   buffer capacity. The starting state (staggered filter wear, an empty
//!   buffer) is a guess, so these only count once the plant has settled.
//!
//! Crossing the warm-up boundary is one-way: once reached it stays reached.

use serde::{Deserialize, Serialize};

use crate::engine::clock::MinuteClock;
use crate::error::{SimError, SimResult};
use crate::plant::FilterId;

/// Which checks the guard currently enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardPhase {
    /// Inside the warm-up window: only unconditional checks apply.
    WarmingUp,
    /// Warm-up complete: every check applies.
    Enforcing,
}

/// Invariant guard for a treatment plant.
///
/// # Example
///
/// ```rust
/// use waterplant::engine::jidoka::PlantGuard;
///
/// let mut guard = PlantGuard::new(2);
/// assert!(!guard.initialization_time_reached());
/// assert!(!guard.advance(1));
/// assert!(guard.advance(2));
/// assert!(guard.initialization_time_reached());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantGuard {
    /// Tick at which warm-up ends.
    warm_up_steps: u64,
    /// Set once `warm_up_steps` has been reached.
    reached: bool,
}

impl PlantGuard {
    /// Create a guard whose warm-up ends at tick `warm_up_steps`.
    ///
    /// A zero-length warm-up enforces everything from the first tick.
    #[must_use]
    pub const fn new(warm_up_steps: u64) -> Self {
        Self {
            warm_up_steps,
            reached: warm_up_steps == 0,
        }
    }

    /// Create a guard with a warm-up of `days` simulated days.
    #[must_use]
    pub fn from_days(days: f64) -> Self {
        Self::new(MinuteClock::steps_for_days(days))
    }

    /// Tick at which warm-up ends.
    #[must_use]
    pub const fn warm_up_steps(&self) -> u64 {
        self.warm_up_steps
    }

    /// Whether warm-up has completed.
    #[must_use]
    pub const fn initialization_time_reached(&self) -> bool {
        self.reached
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GuardPhase {
        if self.reached {
            GuardPhase::Enforcing
        } else {
            GuardPhase::WarmingUp
        }
    }

    /// Record that tick `step` has completed.
    ///
    /// Returns `true` exactly once, on the tick that ends warm-up.
    pub fn advance(&mut self, step: u64) -> bool {
        if !self.reached && step == self.warm_up_steps {
            self.reached = true;
            return true;
        }
        false
    }

    /// Reject NaN and infinity.
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteValue` naming `location`.
    pub fn check_finite(location: &str, value: f64) -> SimResult<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(SimError::NonFiniteValue {
                location: location.to_string(),
            })
        }
    }

    /// Reject a flow that is negative or not finite.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFlow`.
    pub fn check_flow(name: &'static str, value: f64) -> SimResult<()> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(SimError::InvalidFlow { name, value })
        }
    }

    /// Reservoir may never go negative, warm-up or not.
    ///
    /// # Errors
    ///
    /// Returns `ReservoirUnderflow`.
    pub fn check_reservoir(step: u64, volume: f64) -> SimResult<()> {
        Self::check_finite("reservoir_volume", volume)?;
        if volume < 0.0 {
            return Err(SimError::ReservoirUnderflow { step, volume });
        }
        Ok(())
    }

    /// Filter run volume must stay at or below its hard maximum after warm-up.
    ///
    /// # Errors
    ///
    /// Returns `FilterOverrun`.
    pub fn check_filter(&self, step: u64, id: FilterId, volume: f64, max: f64) -> SimResult<()> {
        if self.reached && volume > max {
            return Err(SimError::FilterOverrun {
                step,
                street: id.street,
                filter: id.filter,
                volume,
                max,
            });
        }
        Ok(())
    }

    /// Backwash buffer must stay within capacity after warm-up.
    ///
    /// # Errors
    ///
    /// Returns `BufferOverflow`.
    pub fn check_buffer(&self, step: u64, buffer: f64, capacity: f64) -> SimResult<()> {
        Self::check_finite("backwash_buffer", buffer)?;
        if self.reached && buffer > capacity {
            return Err(SimError::BufferOverflow {
                step,
                buffer,
                capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_warm_up_enforces_immediately() {
        let guard = PlantGuard::new(0);
        assert!(guard.initialization_time_reached());
        assert_eq!(guard.phase(), GuardPhase::Enforcing);
    }

    #[test]
    fn test_advance_flips_once() {
        let mut guard = PlantGuard::new(3);
        assert_eq!(guard.phase(), GuardPhase::WarmingUp);
        assert!(!guard.advance(1));
        assert!(!guard.advance(2));
        assert!(guard.advance(3));
        assert!(!guard.advance(3));
        assert!(!guard.advance(4));
        assert!(guard.initialization_time_reached());
    }

    #[test]
    fn test_from_days() {
        assert_eq!(PlantGuard::from_days(1.0).warm_up_steps(), 1440);
        assert_eq!(PlantGuard::from_days(0.0).warm_up_steps(), 0);
    }

    #[test]
    fn test_buffer_check_suppressed_during_warm_up() {
        let mut guard = PlantGuard::new(2);
        assert!(guard.check_buffer(1, 600.0, 500.0).is_ok());
        guard.advance(2);
        let err = guard.check_buffer(3, 600.0, 500.0);
        assert!(matches!(err, Err(SimError::BufferOverflow { step: 3, .. })));
        assert!(guard.check_buffer(3, 500.0, 500.0).is_ok());
    }

    #[test]
    fn test_filter_check_suppressed_during_warm_up() {
        let id = FilterId::new(0, 1);
        let mut guard = PlantGuard::new(1);
        assert!(guard.check_filter(1, id, 1200.0, 1000.0).is_ok());
        guard.advance(1);
        assert!(matches!(
            guard.check_filter(2, id, 1200.0, 1000.0),
            Err(SimError::FilterOverrun {
                street: 0,
                filter: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_reservoir_check_always_enforced() {
        assert!(PlantGuard::check_reservoir(1, 0.0).is_ok());
        assert!(matches!(
            PlantGuard::check_reservoir(1, -0.01),
            Err(SimError::ReservoirUnderflow { .. })
        ));
        assert!(matches!(
            PlantGuard::check_reservoir(1, f64::NAN),
            Err(SimError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn test_check_flow() {
        assert!(PlantGuard::check_flow("distribution", 0.0).is_ok());
        assert!(PlantGuard::check_flow("distribution", 230.0).is_ok());
        assert!(PlantGuard::check_flow("distribution", -1.0).is_err());
        assert!(PlantGuard::check_flow("distribution", f64::INFINITY).is_err());
    }
}
