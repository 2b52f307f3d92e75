//! The daily summary handed to observers.

use std::fmt;

use ep_core::{DayOfWeek, DiseaseStatus};
use ep_model::StatusCounts;

/// State of the population for one iteration.
///
/// Built by [`InfectionEventHandler::reset`][crate::InfectionEventHandler::reset]
/// from the start-of-day state, then completed by
/// [`finish_day`][crate::InfectionEventHandler::finish_day] with the
/// end-of-day counts and the day's infections and contacts.
#[derive(Clone, Debug, PartialEq)]
pub struct InfectionReport {
    pub iteration: u32,
    pub day: DayOfWeek,
    pub counts: StatusCounts,
    /// Infections of the day, imported cases included.
    pub infections: usize,
    /// Imported cases of the day.
    pub imported: usize,
    /// Facility contacts evaluated during the day.
    pub contacts: u64,
}

impl InfectionReport {
    pub fn new(iteration: u32, day: DayOfWeek, counts: StatusCounts) -> Self {
        InfectionReport { iteration, day, counts, infections: 0, imported: 0, contacts: 0 }
    }

    #[inline]
    pub fn count(&self, status: DiseaseStatus) -> usize {
        self.counts.count(status)
    }

    pub fn cumulative_infected(&self) -> usize {
        self.counts.cumulative_infected()
    }

    pub fn active_infections(&self) -> usize {
        self.counts.active_infections()
    }

    pub fn quarantined_at_home(&self) -> usize {
        self.counts.quarantined_at_home
    }

    pub fn quarantined_full(&self) -> usize {
        self.counts.quarantined_full
    }
}

impl fmt::Display for InfectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day {} ({}): {} new ({} imported), {} active, {} cumulative, {} quarantined, {} contacts",
            self.iteration,
            self.day,
            self.infections,
            self.imported,
            self.active_infections(),
            self.cumulative_infected(),
            self.counts.quarantined(),
            self.contacts,
        )
    }
}
