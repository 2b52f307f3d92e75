//! Population-wide tallies used by progression and restriction policies.

use ep_core::{DiseaseStatus, QuarantineStatus};
use ep_population::PersonState;

/// Number of persons per disease and quarantine status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub by_status: [usize; DiseaseStatus::COUNT],
    pub quarantined_at_home: usize,
    pub quarantined_full: usize,
}

impl StatusCounts {
    pub fn from_persons(persons: &[PersonState]) -> Self {
        let mut counts = StatusCounts::default();
        for p in persons {
            counts.by_status[p.disease_status().index()] += 1;
            match p.quarantine_status() {
                QuarantineStatus::No => {}
                QuarantineStatus::AtHome => counts.quarantined_at_home += 1,
                QuarantineStatus::Full => counts.quarantined_full += 1,
            }
        }
        counts
    }

    #[inline]
    pub fn count(&self, status: DiseaseStatus) -> usize {
        self.by_status[status.index()]
    }

    pub fn total(&self) -> usize {
        self.by_status.iter().sum()
    }

    /// Persons that are infected and not yet recovered.
    pub fn active_infections(&self) -> usize {
        DiseaseStatus::ALL
            .iter()
            .filter(|s| s.is_active_infection())
            .map(|&s| self.count(s))
            .sum()
    }

    /// Persons that were ever infected.
    pub fn cumulative_infected(&self) -> usize {
        self.total() - self.count(DiseaseStatus::Susceptible)
    }

    pub fn quarantined(&self) -> usize {
        self.quarantined_at_home + self.quarantined_full
    }
}
