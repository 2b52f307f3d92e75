//! Transmission probability of a single contact.

use ep_core::{EpiConfig, InfectionParams};
use ep_population::PersonState;

use crate::Restrictions;

/// Pluggable transmission probability.
///
/// `target` is the susceptible person and `infector` the contagious one.
/// The parameters are those of the activity each of them performed.
pub trait InfectionModel: Send + Sync {
    fn infection_probability(
        &self,
        target:          &PersonState,
        infector:        &PersonState,
        restrictions:    &Restrictions,
        target_params:   &InfectionParams,
        infector_params: &InfectionParams,
        joint_time:      f64,
    ) -> f64;
}

/// Exponential dose-response over the joint time.
///
/// `p = 1 - exp(-calibration * susceptibility * max(ci_target, ci_infector)
///  * joint_time * ci_correction)`, with the contact-intensity correction
/// taken from the restriction of the infector's activity.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DefaultInfectionModel {
    calibration: f64,
}

impl DefaultInfectionModel {
    pub fn new(calibration: f64) -> Self {
        DefaultInfectionModel { calibration }
    }

    pub fn from_config(config: &EpiConfig) -> Self {
        Self::new(config.calibration_parameter)
    }
}

impl InfectionModel for DefaultInfectionModel {
    fn infection_probability(
        &self,
        target:          &PersonState,
        _infector:       &PersonState,
        restrictions:    &Restrictions,
        target_params:   &InfectionParams,
        infector_params: &InfectionParams,
        joint_time:      f64,
    ) -> f64 {
        let intensity = target_params.contact_intensity.max(infector_params.contact_intensity);
        let correction = restrictions.ci_correction(&infector_params.container_name);
        1.0 - (-self.calibration * target.susceptibility() * intensity * joint_time * correction).exp()
    }
}

/// Same probability for every contact.  Handy for what-if runs and tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedInfectionModel {
    pub probability: f64,
}

impl InfectionModel for FixedInfectionModel {
    fn infection_probability(
        &self,
        _target:          &PersonState,
        _infector:        &PersonState,
        _restrictions:    &Restrictions,
        _target_params:   &InfectionParams,
        _infector_params: &InfectionParams,
        _joint_time:      f64,
    ) -> f64 {
        self.probability
    }
}
