//! Production-group controller.
//!
//! Production is split into equal groups. Each group has its own switch-off
//! and switch-on reservoir level, which gives staged hysteresis: as the
//! reservoir fills groups drop out one by one, and they come back one by one
//! as it drains. Backwashes are started whenever the plant can absorb one.

use crate::config::ProductionGroupConfig;
use crate::error::SimResult;

use super::{ControlHandle, Controller};

/// Staged hysteresis over production groups.
#[derive(Debug, Clone)]
pub struct ProductionGroupController {
    config: ProductionGroupConfig,
    running: Vec<bool>,
}

impl ProductionGroupController {
    /// Create a controller with every group running.
    #[must_use]
    pub fn new(config: ProductionGroupConfig) -> Self {
        let running = vec![true; config.level_off.len()];
        Self { config, running }
    }

    /// Parameters.
    #[must_use]
    pub const fn config(&self) -> &ProductionGroupConfig {
        &self.config
    }

    /// Which groups are running.
    #[must_use]
    pub fn running(&self) -> &[bool] {
        &self.running
    }

    /// Flow of one group (m³/h).
    #[must_use]
    pub fn flow_per_group(&self) -> f64 {
        if self.running.is_empty() {
            return 0.0;
        }
        self.config.max_production_flow / self.running.len() as f64
    }

    /// Apply the hysteresis for one reservoir level reading.
    fn switch_groups(&mut self, level: f64) {
        let levels = self.config.level_on.iter().zip(&self.config.level_off);
        for (running, (&on, &off)) in self.running.iter_mut().zip(levels) {
            if *running && level >= off {
                *running = false;
            } else if !*running && level <= on {
                *running = true;
            }
        }
    }

    /// Whether a backwash may start now.
    fn backwash_allowed(&self, plant: &ControlHandle<'_>) -> bool {
        let in_window = self
            .config
            .backwash_window
            .map_or(true, |w| w.contains(plant.minute_of_day()));

        plant.reservoir_level() > self.config.min_reservoir_level
            && plant.queue_len() > 0
            && !plant.backwash_active()
            && plant.buffer_headroom() > self.config.min_buffer_headroom
            && in_window
    }
}

impl Controller for ProductionGroupController {
    fn decide(&mut self, plant: &mut ControlHandle<'_>) -> SimResult<f64> {
        self.switch_groups(plant.reservoir_level());

        if self.backwash_allowed(plant) {
            plant.start_backwash()?;
        }

        let running = self.running.iter().filter(|r| **r).count();
        Ok(running as f64 * self.flow_per_group())
    }

    fn name(&self) -> &str {
        if self.config.backwash_window.is_some() {
            "production-groups (windowed backwash)"
        } else {
            "production-groups"
        }
    }
}
