//! Filter street: a bank of parallel filters sharing one inflow.
//!
//! A street only accumulates wear. Deciding when a filter is due and running
//! the backwash programme belong to the treatment; the street exposes the
//! two hooks the treatment needs (`begin_backwash` / `end_backwash`).

use serde::{Deserialize, Serialize};

use crate::config::FilterStreetConfig;
use crate::engine::clock::MINUTES_PER_HOUR;
use crate::error::{SimError, SimResult};

/// Operating state of a single filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStatus {
    /// In production, taking its share of the inflow.
    Active,
    /// Offline for a backwash; run volume frozen.
    Backwashing,
}

impl FilterStatus {
    /// Whether the filter takes inflow.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Per-tick snapshot of a street, kept for external reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetSnapshot {
    /// Run volume per filter (m³).
    pub filter_volumes: Vec<f64>,
    /// Status per filter.
    pub filter_status: Vec<FilterStatus>,
}

/// Independent wear accumulator for a bank of parallel filters.
#[derive(Debug, Clone)]
pub struct FilterStreet {
    name: String,
    max_run_volume: f64,
    soft_cap_volume: f64,
    filter_volumes: Vec<f64>,
    filter_status: Vec<FilterStatus>,
    backwash_programme: Vec<f64>,
    results: Vec<StreetSnapshot>,
}

impl FilterStreet {
    /// Create a street from its configuration.
    ///
    /// Initial run volumes are staggered (`i * max / n`) so the filters do
    /// not all come due at once.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the street has no filters, an empty backwash
    /// programme, a non-positive run volume, or a soft margin outside
    /// `[0, max_run_volume]`.
    pub fn new(config: &FilterStreetConfig) -> SimResult<Self> {
        if config.filter_count == 0 {
            return Err(SimError::config(format!(
                "filter street '{}' needs at least one filter",
                config.name
            )));
        }
        if !(config.max_run_volume.is_finite() && config.max_run_volume > 0.0) {
            return Err(SimError::config(format!(
                "filter street '{}' max_run_volume must be positive",
                config.name
            )));
        }
        if !(0.0..=config.max_run_volume).contains(&config.soft_margin) {
            return Err(SimError::config(format!(
                "filter street '{}' soft_margin {} outside [0, {}]",
                config.name, config.soft_margin, config.max_run_volume
            )));
        }
        if config.backwash_programme.is_empty() {
            return Err(SimError::config(format!(
                "filter street '{}' has an empty backwash programme",
                config.name
            )));
        }
        if let Some(bad) = config
            .backwash_programme
            .iter()
            .find(|flow| !(flow.is_finite() && **flow >= 0.0))
        {
            return Err(SimError::config(format!(
                "filter street '{}' backwash programme contains invalid flow {bad}",
                config.name
            )));
        }

        let n = config.filter_count;
        let filter_volumes = (0..n)
            .map(|i| i as f64 * config.max_run_volume / n as f64)
            .collect();

        Ok(Self {
            name: config.name.clone(),
            max_run_volume: config.max_run_volume,
            soft_cap_volume: config.max_run_volume - config.soft_margin,
            filter_volumes,
            filter_status: vec![FilterStatus::Active; n],
            backwash_programme: config.backwash_programme.clone(),
            results: Vec::new(),
        })
    }

    /// Street name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of filters.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.filter_volumes.len()
    }

    /// Hard run-volume ceiling (m³).
    #[must_use]
    pub const fn max_run_volume(&self) -> f64 {
        self.max_run_volume
    }

    /// Queue-admission threshold (m³).
    #[must_use]
    pub const fn soft_cap_volume(&self) -> f64 {
        self.soft_cap_volume
    }

    /// Run volume per filter (m³).
    #[must_use]
    pub fn filter_volumes(&self) -> &[f64] {
        &self.filter_volumes
    }

    /// Status per filter.
    #[must_use]
    pub fn filter_status(&self) -> &[FilterStatus] {
        &self.filter_status
    }

    /// Backwash flow (m³/h) for each minute of a cycle.
    #[must_use]
    pub fn backwash_programme(&self) -> &[f64] {
        &self.backwash_programme
    }

    /// Number of filters currently in production.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.filter_status.iter().filter(|s| s.is_active()).count()
    }

    /// Snapshot log, one entry per `update`.
    #[must_use]
    pub fn results(&self) -> &[StreetSnapshot] {
        &self.results
    }

    /// Take one minute of `total_flow` (m³/h), split evenly over the active
    /// filters.
    ///
    /// # Errors
    ///
    /// Returns `StreetStalled` if no filter is active.
    pub fn update(&mut self, total_flow: f64) -> SimResult<()> {
        let active = self.active_count();
        if active == 0 {
            return Err(SimError::StreetStalled {
                street: self.name.clone(),
            });
        }

        let volume_per_filter = total_flow / active as f64;
        let per_minute = volume_per_filter / MINUTES_PER_HOUR;
        for (volume, status) in self.filter_volumes.iter_mut().zip(&self.filter_status) {
            if status.is_active() {
                *volume += per_minute;
            }
        }

        self.results.push(StreetSnapshot {
            filter_volumes: self.filter_volumes.clone(),
            filter_status: self.filter_status.clone(),
        });
        Ok(())
    }

    /// Take `filter` offline and reset its run volume.
    pub(crate) fn begin_backwash(&mut self, filter: usize) {
        self.filter_volumes[filter] = 0.0;
        self.filter_status[filter] = FilterStatus::Backwashing;
    }

    /// Return `filter` to production. Its run volume stays where the
    /// backwash left it (zero).
    pub(crate) fn end_backwash(&mut self, filter: usize) {
        self.filter_status[filter] = FilterStatus::Active;
    }
}
