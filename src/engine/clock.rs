//! Simulation clock management.
//!
//! The plant advances in fixed one-minute ticks. The clock keeps the tick
//! counter and the wall-clock timestamp in lockstep; time of day is derived
//! from the tick counter so that controllers stay independent of the chosen
//! start timestamp.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Number of one-minute ticks in a simulated day.
pub const MINUTES_PER_DAY: u64 = 24 * 60;

/// Ticks per hour; flows are in m³/h, volumes change per minute.
pub const MINUTES_PER_HOUR: f64 = 60.0;

/// Fixed-step simulation clock with one-minute resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteClock {
    /// Timestamp of step 0.
    start: NaiveDateTime,
    /// Number of ticks taken.
    step: u64,
}

impl MinuteClock {
    /// Create a clock starting at `start`.
    #[must_use]
    pub const fn new(start: NaiveDateTime) -> Self {
        Self { start, step: 0 }
    }

    /// Timestamp of step 0.
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Number of ticks taken.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Current timestamp (`start + step` minutes).
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        // Saturates instead of overflowing for absurd run lengths.
        i64::try_from(self.step)
            .ok()
            .and_then(|minutes| self.start.checked_add_signed(Duration::minutes(minutes)))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Minute within the simulated day, `step mod 1440`.
    #[must_use]
    pub const fn minute_of_day(&self) -> u64 {
        self.step % MINUTES_PER_DAY
    }

    /// Advance clock by one minute.
    ///
    /// Returns the new step.
    pub fn tick(&mut self) -> u64 {
        self.step += 1;
        self.step
    }

    /// Number of ticks needed to cover `days` simulated days.
    #[must_use]
    pub fn steps_for_days(days: f64) -> u64 {
        if !days.is_finite() || days <= 0.0 {
            return 0;
        }
        (days * MINUTES_PER_DAY as f64).round() as u64
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_year() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_clock_creation() {
        let clock = MinuteClock::new(new_year());
        assert_eq!(clock.step(), 0);
        assert_eq!(clock.now(), new_year());
        assert_eq!(clock.start(), new_year());
    }

    #[test]
    fn test_clock_tick() {
        let mut clock = MinuteClock::new(new_year());

        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.now(), new_year() + Duration::minutes(1));

        clock.tick();
        assert_eq!(clock.step(), 2);
        assert_eq!(clock.now(), new_year() + Duration::minutes(2));
    }

    #[test]
    fn test_clock_minute_of_day_wraps() {
        let mut clock = MinuteClock::new(new_year());
        for _ in 0..MINUTES_PER_DAY + 5 {
            clock.tick();
        }
        assert_eq!(clock.minute_of_day(), 5);
        assert_eq!(clock.now(), new_year() + Duration::days(1) + Duration::minutes(5));
    }

    #[test]
    fn test_steps_for_days() {
        assert_eq!(MinuteClock::steps_for_days(1.0), 1440);
        assert_eq!(MinuteClock::steps_for_days(0.5), 720);
        assert_eq!(MinuteClock::steps_for_days(2.0 / 1440.0), 2);
        assert_eq!(MinuteClock::steps_for_days(0.0), 0);
        assert_eq!(MinuteClock::steps_for_days(-3.0), 0);
        assert_eq!(MinuteClock::steps_for_days(f64::NAN), 0);
    }
}
