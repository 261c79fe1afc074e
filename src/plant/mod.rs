//! Plant model: filter streets, the backwash installation and the treatment
//! that ties them to the reservoir.

pub mod events;
pub mod filter_street;
pub mod queue;
pub mod record;
pub mod treatment;

use serde::{Deserialize, Serialize};

pub use events::{EventSink, PlantEvent, TracingSink};
pub use filter_street::{FilterStatus, FilterStreet, StreetSnapshot};
pub use queue::BackwashQueue;
pub use record::{PowerBreakdown, QuarterHourPower, ResultLog, TickRecord};
pub use treatment::{BackwashState, Treatment};

/// A filter, addressed by street and position within the street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterId {
    /// Street index.
    pub street: usize,
    /// Filter index within the street.
    pub filter: usize,
}

impl FilterId {
    /// Address filter `filter` of street `street`.
    #[must_use]
    pub const fn new(street: usize, filter: usize) -> Self {
        Self { street, filter }
    }
}

impl std::fmt::Display for FilterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.street, self.filter)
    }
}
