//! Per-minute demand sources.
//!
//! Demand is an external input to the plant; these sources only produce the
//! `distribution_flow` handed to [`Treatment::update`](crate::plant::Treatment::update)
//! each minute.

use std::f64::consts::TAU;

use crate::config::{DemandConfig, SinusoidDemand};
use crate::engine::clock::MINUTES_PER_DAY;
use crate::engine::rng::SimRng;

/// A demand source built from a [`DemandConfig`].
#[derive(Debug, Clone)]
pub enum Demand {
    /// The same flow every minute.
    Constant(f64),
    /// Daily double sinusoid with optional seeded noise.
    Sinusoid {
        /// Shape parameters.
        shape: SinusoidDemand,
        /// Noise stream.
        rng: SimRng,
    },
    /// Recorded series, repeated when exhausted.
    Series(Vec<f64>),
}

impl Demand {
    /// Build a demand source.
    #[must_use]
    pub fn from_config(config: &DemandConfig) -> Self {
        match config {
            DemandConfig::Constant { flow } => Self::Constant(*flow),
            DemandConfig::Sinusoid(shape) => Self::Sinusoid {
                rng: SimRng::new(shape.seed),
                shape: shape.clone(),
            },
            DemandConfig::Series { flows } => Self::Series(flows.clone()),
        }
    }

    /// Demand (m³/h) for minute `t`, counted from 0.
    ///
    /// Sources with noise must be queried once per minute, in order.
    pub fn flow(&mut self, t: u64) -> f64 {
        match self {
            Self::Constant(flow) => *flow,
            Self::Sinusoid { shape, rng } => {
                let x = t as f64 / MINUTES_PER_DAY as f64 * TAU;
                let clean = shape.amplitude.mul_add(
                    shape.harmonic.mul_add((2.0 * x).sin(), x.sin()),
                    shape.base,
                );
                (clean + rng.gen_symmetric(shape.noise)).max(0.0)
            }
            Self::Series(flows) => {
                if flows.is_empty() {
                    return 0.0;
                }
                flows[(t % flows.len() as u64) as usize]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let mut d = Demand::from_config(&DemandConfig::Constant { flow: 230.0 });
        assert!((d.flow(0) - 230.0).abs() < f64::EPSILON);
        assert!((d.flow(9999) - 230.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sinusoid_shape() {
        let mut d = Demand::from_config(&DemandConfig::Sinusoid(SinusoidDemand::default()));
        // sin(0) = 0: flow equals base at midnight.
        assert!((d.flow(0) - 230.0).abs() < 1e-9);
        // Quarter day: sin(π/2) = 1, sin(π) = 0.
        assert!((d.flow(360) - 330.0).abs() < 1e-9);
        // Daily period.
        assert!((d.flow(1440 + 360) - 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_sinusoid_never_negative() {
        let shape = SinusoidDemand {
            base: 10.0,
            amplitude: 100.0,
            ..SinusoidDemand::default()
        };
        let mut d = Demand::from_config(&DemandConfig::Sinusoid(shape));
        assert!((0..1440).all(|t| d.flow(t) >= 0.0));
    }

    #[test]
    fn test_noise_is_seeded() {
        let shape = SinusoidDemand {
            noise: 20.0,
            seed: 7,
            ..SinusoidDemand::default()
        };
        let mut a = Demand::from_config(&DemandConfig::Sinusoid(shape.clone()));
        let mut b = Demand::from_config(&DemandConfig::Sinusoid(shape));
        for t in 0..100 {
            assert_eq!(a.flow(t).to_bits(), b.flow(t).to_bits());
        }
    }

    #[test]
    fn test_series_repeats() {
        let mut d = Demand::from_config(&DemandConfig::Series {
            flows: vec![1.0, 2.0, 3.0],
        });
        let got: Vec<f64> = (0..5).map(|t| d.flow(t)).collect();
        assert_eq!(got, vec![1.0, 2.0, 3.0, 1.0, 2.0]);
    }
}
