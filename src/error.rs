//! Error types for waterplant.
//!
//! Every fatal plant condition is its own variant so callers can tell a
//! policy failure (controller let a filter overrun) from a configuration
//! mistake. Nothing in the library panics; all operations return
//! `Result<T, SimError>`.

use thiserror::Error;

/// Result type alias for waterplant operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all waterplant operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Plant invariant violations =====
    /// Demand exceeded everything the reservoir could supply.
    #[error("Jidoka: reservoir volume went negative ({volume:.3} m³) at step {step}")]
    ReservoirUnderflow {
        /// Tick at which the underflow happened.
        step: u64,
        /// Volume the reservoir would have reached.
        volume: f64,
    },

    /// A filter ran past its hard run-volume ceiling.
    #[error(
        "Jidoka: filter {street}/{filter} reached {volume:.3} m³, above its maximum of {max:.3} m³ at step {step}"
    )]
    FilterOverrun {
        /// Tick at which the overrun was detected.
        step: u64,
        /// Street index.
        street: usize,
        /// Filter index within the street.
        filter: usize,
        /// Accumulated run volume.
        volume: f64,
        /// Hard maximum run volume.
        max: f64,
    },

    /// Backwash buffer holds more than its capacity.
    #[error("Jidoka: backwash buffer at {buffer:.3} m³ exceeds capacity {capacity:.3} m³ at step {step}")]
    BufferOverflow {
        /// Tick at which the overflow was detected.
        step: u64,
        /// Buffer content.
        buffer: f64,
        /// Buffer capacity.
        capacity: f64,
    },

    /// A backwash was requested while another one is running.
    #[error("Backwash is already active (filter {street}/{filter})")]
    BackwashAlreadyActive {
        /// Street of the running backwash.
        street: usize,
        /// Filter of the running backwash.
        filter: usize,
    },

    /// A backwash was requested with nothing queued.
    #[error("Backwash queue is empty")]
    BackwashQueueEmpty,

    /// Every filter of a street is backwashing, so inflow cannot be split.
    #[error("Filter street '{street}' has no active filters to take its inflow")]
    StreetStalled {
        /// Street name.
        street: String,
    },

    /// An explicit backwash target does not exist.
    #[error("Unknown filter {street}/{filter}")]
    UnknownFilter {
        /// Street index.
        street: usize,
        /// Filter index within the street.
        filter: usize,
    },

    /// NaN or infinity reached the plant state.
    #[error("Jidoka: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Where the value was found.
        location: String,
    },

    /// A flow outside its physical range (negative or non-finite).
    #[error("Invalid {name} flow: {value} m³/h")]
    InvalidFlow {
        /// Which flow.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error is a plant invariant violation (the run must stop
    /// and the configuration or controller needs changing).
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::ReservoirUnderflow { .. }
                | Self::FilterOverrun { .. }
                | Self::BufferOverflow { .. }
                | Self::StreetStalled { .. }
                | Self::NonFiniteValue { .. }
        )
    }

    /// Check if this error is a misuse of the backwash installation.
    #[must_use]
    pub const fn is_backwash_misuse(&self) -> bool {
        matches!(
            self,
            Self::BackwashAlreadyActive { .. }
                | Self::BackwashQueueEmpty
                | Self::UnknownFilter { .. }
        )
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_violation_detection() {
        let underflow = SimError::ReservoirUnderflow {
            step: 12,
            volume: -0.5,
        };
        assert!(underflow.is_invariant_violation());

        let overrun = SimError::FilterOverrun {
            step: 3,
            street: 0,
            filter: 1,
            volume: 1001.0,
            max: 1000.0,
        };
        assert!(overrun.is_invariant_violation());

        let overflow = SimError::BufferOverflow {
            step: 3,
            buffer: 510.0,
            capacity: 500.0,
        };
        assert!(overflow.is_invariant_violation());

        assert!(!SimError::BackwashQueueEmpty.is_invariant_violation());
        assert!(!SimError::config("bad").is_invariant_violation());
    }

    #[test]
    fn test_backwash_misuse_detection() {
        assert!(SimError::BackwashQueueEmpty.is_backwash_misuse());
        assert!(SimError::BackwashAlreadyActive {
            street: 0,
            filter: 2
        }
        .is_backwash_misuse());
        assert!(!SimError::StreetStalled {
            street: "VF".to_string()
        }
        .is_backwash_misuse());
    }

    #[test]
    fn test_error_display_underflow() {
        let err = SimError::ReservoirUnderflow {
            step: 7,
            volume: -1.25,
        };
        let msg = err.to_string();
        assert!(msg.contains("reservoir volume went negative"));
        assert!(msg.contains("-1.250"));
        assert!(msg.contains("step 7"));
    }

    #[test]
    fn test_error_display_overrun() {
        let err = SimError::FilterOverrun {
            step: 99,
            street: 1,
            filter: 3,
            volume: 1000.5,
            max: 1000.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("filter 1/3"));
        assert!(msg.contains("1000.500"));
    }

    #[test]
    fn test_error_display_backwash() {
        let err = SimError::BackwashAlreadyActive {
            street: 0,
            filter: 4,
        };
        assert!(err.to_string().contains("already active"));
        assert!(SimError::BackwashQueueEmpty
            .to_string()
            .contains("queue is empty"));
    }

    #[test]
    fn test_error_config() {
        let err = SimError::config("invalid parameter");
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("invalid parameter"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<f64>("not json").unwrap_err();
        let err: SimError = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_error_invalid_flow_display() {
        let err = SimError::InvalidFlow {
            name: "production",
            value: -3.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("production"));
        assert!(msg.contains("-3"));
    }
}
