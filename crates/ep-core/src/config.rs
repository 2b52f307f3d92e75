//! Run configuration.
//!
//! Typically loaded from a JSON file by the application and passed to the
//! simulation builder.  Every field has a default, so a file only needs to
//! name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activity::{ActivityDictionary, InfectionParams, TRANSIT};
use crate::{DayOfWeek, EpiError, EpiResult};

// ── EpiConfig ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpiConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Seconds added to every corrected timestamp.
    pub start_offset: f64,

    /// Weekday of iteration 1.
    pub start_day: DayOfWeek,

    /// Fraction of the real population represented.  Container statistics
    /// are divided by it.
    pub sample_size: f64,

    /// Upper bound of contacts evaluated per leave event.
    pub max_contacts: u32,

    /// Scales every transmission probability.
    pub calibration_parameter: f64,

    /// First iteration on which contacts are recorded for tracing.
    pub tracking_after_day: u32,

    /// Shorter contacts are not recorded for tracing.
    pub tracking_min_duration: f64,

    /// Record pairs involving a susceptible person for tracing (pairwise model).
    pub trace_susceptible: bool,

    /// Traceable contacts older than this many days are dropped.
    pub tracing_retention_days: u32,

    /// Probability that a person carries a tracing device.
    pub equipment_rate: f64,

    /// Capacity assumed for vehicles with unknown capacity.
    pub default_vehicle_capacity: u32,

    pub household_susceptibility: HouseholdSusceptibilityConfig,

    /// Total number of imported cases.
    pub initial_infections: u32,

    /// Imported cases per iteration until `initial_infections` are used up.
    pub infections_per_day: u32,

    /// First iteration receiving imported cases.
    pub initial_start_iteration: u32,

    pub progression: ProgressionConfig,

    /// Activity groups in dictionary order.
    pub infection_params: Vec<InfectionParams>,
}

impl Default for EpiConfig {
    fn default() -> Self {
        EpiConfig {
            seed: 4711,
            start_offset: 0.0,
            start_day: DayOfWeek::Monday,
            sample_size: 1.0,
            max_contacts: 3,
            calibration_parameter: 1.0e-5,
            tracking_after_day: u32::MAX,
            tracking_min_duration: 0.0,
            trace_susceptible: true,
            tracing_retention_days: 14,
            equipment_rate: 1.0,
            default_vehicle_capacity: 150,
            household_susceptibility: HouseholdSusceptibilityConfig::default(),
            initial_infections: 10,
            infections_per_day: 10,
            initial_start_iteration: 1,
            progression: ProgressionConfig::default(),
            infection_params: Vec::new(),
        }
    }
}

impl EpiConfig {
    pub fn from_json_str(json: &str) -> EpiResult<Self> {
        let config: EpiConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> EpiResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> EpiResult<()> {
        if !(self.sample_size > 0.0) {
            return Err(EpiError::Config(format!("sample_size must be > 0, got {}", self.sample_size)));
        }
        if !(0.0..=1.0).contains(&self.equipment_rate) {
            return Err(EpiError::Config(format!(
                "equipment_rate must be in [0, 1], got {}",
                self.equipment_rate
            )));
        }
        let p = self.household_susceptibility.p_households;
        if !(0.0..=1.0).contains(&p) {
            return Err(EpiError::Config(format!("p_households must be in [0, 1], got {p}")));
        }
        if self.max_contacts == 0 {
            return Err(EpiError::Config("max_contacts must be > 0".into()));
        }
        if self.infection_params.is_empty() {
            return Err(EpiError::Config("no infection params configured".into()));
        }
        if !self.infection_params.iter().any(|p| p.container_name == TRANSIT) {
            return Err(EpiError::Config(format!("missing '{TRANSIT}' infection params")));
        }
        // Duplicate names are rejected by the dictionary itself.
        self.dictionary().map(|_| ())
    }

    /// Activity dictionary in configured order.
    pub fn dictionary(&self) -> EpiResult<ActivityDictionary> {
        ActivityDictionary::new(self.infection_params.clone())
    }

    /// Builder-style helper used heavily by tests and demos.
    pub fn with_params(mut self, params: Vec<InfectionParams>) -> Self {
        self.infection_params = params;
        self
    }
}

// ── HouseholdSusceptibilityConfig ─────────────────────────────────────────────

/// Whole households drawn with probability `p_households` receive the
/// susceptibility multiplier `susceptibility`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdSusceptibilityConfig {
    pub p_households: f64,
    pub susceptibility: f64,
}

impl Default for HouseholdSusceptibilityConfig {
    fn default() -> Self {
        HouseholdSusceptibilityConfig { p_households: 0.0, susceptibility: 1.0 }
    }
}

// ── ProgressionConfig ─────────────────────────────────────────────────────────

/// Stage lengths (days) and branch probabilities of the default progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub days_infected_to_contagious: u32,
    pub days_contagious_to_symptoms: u32,
    pub p_symptoms: f64,
    pub days_symptoms_to_next: u32,
    pub p_seriously_sick: f64,
    pub days_seriously_sick_to_next: u32,
    pub p_critical: f64,
    pub days_critical: u32,
    pub days_after_critical: u32,
    /// Quarantine length for traced contacts.
    pub quarantine_days: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        ProgressionConfig {
            days_infected_to_contagious: 4,
            days_contagious_to_symptoms: 2,
            p_symptoms: 0.8,
            days_symptoms_to_next: 4,
            p_seriously_sick: 0.05,
            days_seriously_sick_to_next: 5,
            p_critical: 0.25,
            days_critical: 10,
            days_after_critical: 5,
            quarantine_days: 14,
        }
    }
}
