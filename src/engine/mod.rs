//! Simulation engine primitives.
//!
//! Shared by every plant component:
//! - Minute clock (tick counter + timestamp)
//! - Jidoka guard for stop-on-error with a warm-up window
//! - Deterministic RNG for demand noise

pub mod clock;
pub mod jidoka;
pub mod rng;

pub use clock::{MinuteClock, MINUTES_PER_DAY, MINUTES_PER_HOUR};
pub use jidoka::{GuardPhase, PlantGuard};
pub use rng::SimRng;
