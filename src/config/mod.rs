//! Plant configuration with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs (`deny_unknown_fields`)
//! - Field-level validation via `validator`
//! - A semantic pass for cross-field constraints

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{SimError, SimResult};

/// Top-level plant configuration.
///
/// Loaded from YAML files with full schema validation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PlantConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Simulation metadata.
    #[serde(default)]
    pub simulation: SimulationMeta,

    /// Reservoir, buffer and power parameters.
    #[validate(nested)]
    pub treatment: TreatmentConfig,

    /// Filter streets, in index order.
    #[validate(length(min = 1), nested)]
    pub filter_streets: Vec<FilterStreetConfig>,

    /// Production / backwash controller.
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Demand source.
    pub demand: DemandConfig,

    /// Run length for the CLI driver.
    #[validate(nested)]
    #[serde(default)]
    pub run: RunConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl PlantConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns `YamlParse` if serialization fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Run field-level and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns `Validation` or `Config` errors.
    pub fn check(&self) -> SimResult<()> {
        // Poka-Yoke: validate all constraints
        self.validate()?;
        self.validate_semantic()
    }

    /// Create a builder starting from the reference plant.
    #[must_use]
    pub fn builder() -> PlantConfigBuilder {
        PlantConfigBuilder::default()
    }

    /// The reference plant: one street of four filters behind a 1000 m³
    /// reservoir, fed by a two-day sinusoidal demand.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            schema_version: default_schema_version(),
            simulation: SimulationMeta {
                name: "reference".to_string(),
                description: "Single-street plant with production-group control".to_string(),
            },
            treatment: TreatmentConfig::default(),
            filter_streets: vec![FilterStreetConfig::default()],
            controller: ControllerConfig::default(),
            demand: DemandConfig::Sinusoid(SinusoidDemand::default()),
            run: RunConfig::default(),
        }
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        let t = &self.treatment;
        if t.reservoir_volume > t.reservoir_capacity {
            return Err(SimError::config(format!(
                "reservoir_volume {} exceeds reservoir_capacity {}",
                t.reservoir_volume, t.reservoir_capacity
            )));
        }

        for street in &self.filter_streets {
            if street.soft_margin > street.max_run_volume {
                return Err(SimError::config(format!(
                    "filter street '{}': soft_margin {} exceeds max_run_volume {}",
                    street.name, street.soft_margin, street.max_run_volume
                )));
            }
            if street.backwash_programme.iter().any(|f| !f.is_finite() || *f < 0.0) {
                return Err(SimError::config(format!(
                    "filter street '{}': backwash programme flows must be non-negative",
                    street.name
                )));
            }
        }

        if let ControllerConfig::ProductionGroups(groups) = &self.controller {
            groups.validate_semantic()?;
        }

        self.demand.validate_semantic()
    }
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Configuration builder for programmatic construction.
///
/// Starts from [`PlantConfig::reference`]; every setter overrides one part.
#[derive(Debug, Default)]
pub struct PlantConfigBuilder {
    treatment: Option<TreatmentConfig>,
    streets: Vec<FilterStreetConfig>,
    controller: Option<ControllerConfig>,
    demand: Option<DemandConfig>,
    minutes: Option<u64>,
}

impl PlantConfigBuilder {
    /// Set the treatment parameters.
    #[must_use]
    pub fn treatment(mut self, treatment: TreatmentConfig) -> Self {
        self.treatment = Some(treatment);
        self
    }

    /// Add a filter street. The first call replaces the reference street.
    #[must_use]
    pub fn street(mut self, street: FilterStreetConfig) -> Self {
        self.streets.push(street);
        self
    }

    /// Set the controller.
    #[must_use]
    pub fn controller(mut self, controller: ControllerConfig) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Set the demand source.
    #[must_use]
    pub fn demand(mut self, demand: DemandConfig) -> Self {
        self.demand = Some(demand);
        self
    }

    /// Set the run length in minutes.
    #[must_use]
    pub const fn minutes(mut self, minutes: u64) -> Self {
        self.minutes = Some(minutes);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PlantConfig {
        let mut config = PlantConfig::reference();

        if let Some(treatment) = self.treatment {
            config.treatment = treatment;
        }
        if !self.streets.is_empty() {
            config.filter_streets = self.streets;
        }
        if let Some(controller) = self.controller {
            config.controller = controller;
        }
        if let Some(demand) = self.demand {
            config.demand = demand;
        }
        if let Some(minutes) = self.minutes {
            config.run.minutes = minutes;
        }

        config
    }
}

/// Simulation metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationMeta {
    /// Simulation name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// Reservoir, backwash buffer and power parameters of a treatment.
///
/// Every field is required in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TreatmentConfig {
    /// Power per m³/h produced (kW per m³/h).
    #[validate(range(min = 0.0))]
    pub production_power: f64,
    /// Power per m³/h distributed (kW per m³/h).
    #[validate(range(min = 0.0))]
    pub distribution_power: f64,
    /// Power per m³/h of backwash flow (kW per m³/h).
    #[validate(range(min = 0.0))]
    pub backwash_power: f64,
    /// Constant baseload (kW).
    #[validate(range(min = 0.0))]
    pub baseload_power: f64,
    /// Reservoir capacity (m³).
    #[validate(range(exclusive_min = 0.0))]
    pub reservoir_capacity: f64,
    /// Initial reservoir content (m³).
    #[validate(range(min = 0.0))]
    pub reservoir_volume: f64,
    /// Backwash buffer capacity (m³).
    #[validate(range(min = 0.0))]
    pub backwash_buffer_volume: f64,
    /// Continuous buffer drain (m³/h).
    #[validate(range(min = 0.0))]
    pub backwash_drain: f64,
    /// Timestamp of step 0.
    pub start_time: NaiveDateTime,
    /// Warm-up length in days; fractional values are allowed.
    #[validate(range(min = 0.0))]
    pub initialization_days: f64,
}

/// 2025-01-01 00:00:00.
#[must_use]
pub fn default_start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl Default for TreatmentConfig {
    fn default() -> Self {
        Self {
            production_power: 0.2,
            distribution_power: 0.2,
            backwash_power: 0.3,
            baseload_power: 50.0,
            reservoir_capacity: 1000.0,
            reservoir_volume: 800.0,
            backwash_buffer_volume: 1500.0,
            backwash_drain: 100.0,
            start_time: default_start_time(),
            initialization_days: 1.0,
        }
    }
}

/// One filter street.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct FilterStreetConfig {
    /// Street name (reporting only).
    #[validate(length(min = 1))]
    pub name: String,
    /// Number of parallel filters.
    #[validate(range(min = 1))]
    pub filter_count: usize,
    /// Hard run-volume ceiling (m³).
    #[validate(range(exclusive_min = 0.0))]
    pub max_run_volume: f64,
    /// Distance below the ceiling at which a filter is queued (m³).
    #[validate(range(min = 0.0))]
    pub soft_margin: f64,
    /// Backwash flow (m³/h) for each minute of the cycle.
    #[validate(length(min = 1))]
    pub backwash_programme: Vec<f64>,
}

impl Default for FilterStreetConfig {
    fn default() -> Self {
        Self {
            name: "VF".to_string(),
            filter_count: 4,
            max_run_volume: 1000.0,
            soft_margin: 300.0,
            backwash_programme: vec![600.0; 10],
        }
    }
}

/// Controller selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerConfig {
    /// No controller: production flow stays at its initial value (0).
    None,
    /// Production groups with level hysteresis.
    ProductionGroups(ProductionGroupConfig),
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::ProductionGroups(ProductionGroupConfig::default())
    }
}

/// Minute-of-day window, exclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackwashWindow {
    /// Backwash allowed strictly after this minute of the day.
    pub after_minute: u64,
    /// Backwash allowed strictly before this minute of the day.
    pub before_minute: u64,
}

impl BackwashWindow {
    /// Whether `minute_of_day` lies strictly inside the window.
    #[must_use]
    pub const fn contains(&self, minute_of_day: u64) -> bool {
        minute_of_day > self.after_minute && minute_of_day < self.before_minute
    }
}

/// Production-group controller parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductionGroupConfig {
    /// Flow with every group running (m³/h).
    pub max_production_flow: f64,
    /// Level at or below which each group switches on.
    pub level_on: Vec<f64>,
    /// Level at or above which each group switches off.
    pub level_off: Vec<f64>,
    /// No backwash at or below this reservoir level.
    pub min_reservoir_level: f64,
    /// Buffer headroom (m³) that must be exceeded to start a backwash.
    pub min_buffer_headroom: f64,
    /// Optional time-of-day restriction on backwash starts.
    #[serde(default)]
    pub backwash_window: Option<BackwashWindow>,
}

impl ProductionGroupConfig {
    /// Backwash whenever possible, 600 m³ buffer headroom.
    #[must_use]
    pub fn simple() -> Self {
        Self {
            max_production_flow: 900.0,
            level_on: vec![0.0, 0.15, 0.3, 0.4, 0.2],
            level_off: vec![1.0, 0.8, 0.7, 0.75, 0.9],
            min_reservoir_level: 0.1,
            min_buffer_headroom: 600.0,
            backwash_window: None,
        }
    }

    /// Backwash only between 02:00 and 07:00, 1200 m³ buffer headroom.
    #[must_use]
    pub fn night_backwash() -> Self {
        Self {
            min_buffer_headroom: 1200.0,
            backwash_window: Some(BackwashWindow {
                after_minute: 2 * 60,
                before_minute: 7 * 60,
            }),
            ..Self::simple()
        }
    }

    fn validate_semantic(&self) -> SimResult<()> {
        if !(self.max_production_flow.is_finite() && self.max_production_flow >= 0.0) {
            return Err(SimError::config("max_production_flow must be non-negative"));
        }
        if self.level_on.is_empty() {
            return Err(SimError::config("at least one production group is required"));
        }
        if self.level_on.len() != self.level_off.len() {
            return Err(SimError::config(format!(
                "level_on has {} groups but level_off has {}",
                self.level_on.len(),
                self.level_off.len()
            )));
        }
        let in_unit = |v: &f64| (0.0..=1.0).contains(v);
        if !self.level_on.iter().chain(&self.level_off).all(in_unit) {
            return Err(SimError::config("group levels must lie in [0, 1]"));
        }
        if !in_unit(&self.min_reservoir_level) {
            return Err(SimError::config("min_reservoir_level must lie in [0, 1]"));
        }
        if !(self.min_buffer_headroom.is_finite() && self.min_buffer_headroom >= 0.0) {
            return Err(SimError::config("min_buffer_headroom must be non-negative"));
        }
        Ok(())
    }
}

impl Default for ProductionGroupConfig {
    fn default() -> Self {
        Self::simple()
    }
}

/// Demand source selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemandConfig {
    /// The same flow every minute.
    Constant {
        /// Flow (m³/h).
        flow: f64,
    },
    /// Daily double sinusoid with optional noise.
    Sinusoid(SinusoidDemand),
    /// Recorded one-minute series, repeated when exhausted.
    Series {
        /// Flow per minute (m³/h).
        flows: Vec<f64>,
    },
}

impl DemandConfig {
    fn validate_semantic(&self) -> SimResult<()> {
        let finite_non_negative = |v: f64| v.is_finite() && v >= 0.0;
        match self {
            Self::Constant { flow } if !finite_non_negative(*flow) => {
                Err(SimError::config(format!("constant demand {flow} must be non-negative")))
            }
            Self::Sinusoid(s) if !(finite_non_negative(s.base)
                && s.amplitude.is_finite()
                && s.harmonic.is_finite()
                && finite_non_negative(s.noise)) =>
            {
                Err(SimError::config("sinusoid demand parameters must be finite"))
            }
            Self::Series { flows } if flows.is_empty() => {
                Err(SimError::config("demand series is empty"))
            }
            Self::Series { flows } if !flows.iter().all(|f| finite_non_negative(*f)) => {
                Err(SimError::config("demand series flows must be non-negative"))
            }
            _ => Ok(()),
        }
    }
}

/// `base + amplitude * (sin x + harmonic * sin 2x)` with `x = 2π t / 1440`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinusoidDemand {
    /// Mean flow (m³/h).
    pub base: f64,
    /// Daily amplitude (m³/h).
    pub amplitude: f64,
    /// Relative weight of the twice-daily component.
    pub harmonic: f64,
    /// Uniform noise half-width (m³/h).
    #[serde(default)]
    pub noise: f64,
    /// Noise seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

const fn default_seed() -> u64 {
    42
}

impl Default for SinusoidDemand {
    fn default() -> Self {
        Self {
            base: 230.0,
            amplitude: 100.0,
            harmonic: 1.3,
            noise: 0.0,
            seed: default_seed(),
        }
    }
}

/// CLI run settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Number of one-minute ticks.
    #[validate(range(min = 1))]
    #[serde(default = "default_minutes")]
    pub minutes: u64,
}

const fn default_minutes() -> u64 {
    48 * 60
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            minutes: default_minutes(),
        }
    }
}
