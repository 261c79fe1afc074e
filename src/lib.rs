//! # waterplant
//!
//! Minute-by-minute simulation of a drinking-water treatment plant.
//!
//! The plant is a clean-water reservoir fed by one or more filter streets.
//! Filters wear as water passes through them and are restored by backwash
//! cycles that run one at a time and drain into a finite backwash buffer.
//! A pluggable controller decides the production flow each minute and when
//! the next backwash may start.
//!
//! Mistake-proofing follows the stop-on-error rule: a physically impossible
//! state (negative reservoir, filter past its run volume, overflowing
//! buffer) ends the run with a typed error instead of being clamped away.
//!
//! ## Example
//!
//! ```rust
//! use waterplant::prelude::*;
//!
//! let config = PlantConfig::builder()
//!     .demand(DemandConfig::Constant { flow: 230.0 })
//!     .build();
//!
//! let mut sim = Simulation::from_config(&config).unwrap();
//! let report = sim.run(60);
//! assert!(report.is_ok());
//! assert_eq!(report.ticks, 60);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
)]

pub mod cli;
pub mod config;
pub mod controller;
pub mod demand;
pub mod engine;
pub mod error;
pub mod plant;
pub mod simulation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{
        BackwashWindow, ControllerConfig, DemandConfig, FilterStreetConfig, PlantConfig,
        PlantConfigBuilder, ProductionGroupConfig, SinusoidDemand, TreatmentConfig,
    };
    pub use crate::controller::{ControlHandle, Controller, ProductionGroupController};
    pub use crate::demand::Demand;
    pub use crate::engine::{MinuteClock, PlantGuard, SimRng};
    pub use crate::error::{SimError, SimResult};
    pub use crate::plant::{
        BackwashQueue, BackwashState, EventSink, FilterId, FilterStatus, FilterStreet,
        PlantEvent, ResultLog, TickRecord, TracingSink, Treatment,
    };
    pub use crate::simulation::{RunReport, RunSummary, Simulation};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
