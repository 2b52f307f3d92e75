//! Disease and quarantine status enums shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a person in the disease state machine.
///
/// ```text
/// susceptible → infectedButNotContagious → contagious → showingSymptoms
///     → seriouslySick → critical → seriouslySickAfterCritical → recovered
/// ```
///
/// Every state from `contagious` onward may also branch straight to
/// `recovered`; transitions never move backwards.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiseaseStatus {
    #[default]
    Susceptible,
    InfectedButNotContagious,
    Contagious,
    ShowingSymptoms,
    SeriouslySick,
    Critical,
    SeriouslySickAfterCritical,
    Recovered,
}

impl DiseaseStatus {
    pub const COUNT: usize = 8;

    pub const ALL: [DiseaseStatus; Self::COUNT] = [
        DiseaseStatus::Susceptible,
        DiseaseStatus::InfectedButNotContagious,
        DiseaseStatus::Contagious,
        DiseaseStatus::ShowingSymptoms,
        DiseaseStatus::SeriouslySick,
        DiseaseStatus::Critical,
        DiseaseStatus::SeriouslySickAfterCritical,
        DiseaseStatus::Recovered,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Susceptible, contagious or showing symptoms: the only states that take
    /// part in transmission, as either party.
    #[inline]
    pub fn is_relevant_for_transmission(self) -> bool {
        matches!(
            self,
            DiseaseStatus::Susceptible | DiseaseStatus::Contagious | DiseaseStatus::ShowingSymptoms
        )
    }

    /// Contagious or showing symptoms.
    #[inline]
    pub fn can_infect(self) -> bool {
        matches!(self, DiseaseStatus::Contagious | DiseaseStatus::ShowingSymptoms)
    }

    /// Infected but not yet recovered.
    #[inline]
    pub fn is_active_infection(self) -> bool {
        !matches!(self, DiseaseStatus::Susceptible | DiseaseStatus::Recovered)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiseaseStatus::Susceptible                => "susceptible",
            DiseaseStatus::InfectedButNotContagious   => "infectedButNotContagious",
            DiseaseStatus::Contagious                 => "contagious",
            DiseaseStatus::ShowingSymptoms            => "showingSymptoms",
            DiseaseStatus::SeriouslySick              => "seriouslySick",
            DiseaseStatus::Critical                   => "critical",
            DiseaseStatus::SeriouslySickAfterCritical => "seriouslySickAfterCritical",
            DiseaseStatus::Recovered                  => "recovered",
        }
    }
}

impl fmt::Display for DiseaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quarantine axis, orthogonal to the disease state.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuarantineStatus {
    #[default]
    No,
    /// Only home activities remain relevant.
    AtHome,
    /// Excluded from every contact evaluation.
    Full,
}

impl QuarantineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuarantineStatus::No     => "no",
            QuarantineStatus::AtHome => "atHome",
            QuarantineStatus::Full   => "full",
        }
    }
}

impl fmt::Display for QuarantineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
