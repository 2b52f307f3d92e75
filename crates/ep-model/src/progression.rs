//! Daily disease progression and the quarantine decisions tied to it.

use ep_core::{
    DiseaseStatus, EpiConfig, EpiResult, PersonId, ProgressionConfig, QuarantineStatus, SimRng, SimTime,
};
use ep_population::PersonState;

use crate::StatusCounts;

/// Advances every person's disease state once per day, independent of the
/// contacts of that day.
///
/// The handler calls, in order: [`set_iteration`][Self::set_iteration],
/// [`before_state_updates`][Self::before_state_updates] once with all
/// persons, then [`update_state`][Self::update_state] for each person in id
/// order.
pub trait ProgressionModel: Send {
    fn set_iteration(&mut self, _iteration: u32) {}

    /// Population-wide decisions taken before any individual update, such as
    /// quarantining traced contacts.
    fn before_state_updates(&mut self, _persons: &mut [PersonState], _day: u32, _config: &EpiConfig) {}

    /// Advance one person.  `now` is the start of the current day.
    fn update_state(&mut self, person: &mut PersonState, now: SimTime, rng: &mut SimRng) -> EpiResult<()>;

    /// `false` once no further transition can happen anywhere.
    fn can_progress(&self, counts: &StatusCounts) -> bool;
}

/// Fixed stage lengths with probabilistic branches to recovery.
///
/// ```text
/// infectedButNotContagious ─► contagious ─┬─► showingSymptoms ─┬─► seriouslySick ─┬─► critical ─► seriouslySickAfterCritical ─► recovered
///                                         └─► recovered        └─► recovered      └─► recovered
/// ```
#[derive(Clone, Debug, Default)]
pub struct DefaultProgressionModel {
    config: ProgressionConfig,
}

impl DefaultProgressionModel {
    pub fn new(config: ProgressionConfig) -> Self {
        DefaultProgressionModel { config }
    }

    pub fn from_config(config: &EpiConfig) -> Self {
        Self::new(config.progression.clone())
    }

    fn next_status(&self, person: &PersonState, day: u32, rng: &mut SimRng) -> Option<DiseaseStatus> {
        use DiseaseStatus::*;

        let c = &self.config;
        let status = person.disease_status();
        let elapsed = person.days_since(status, day)?;
        let branch = |rng: &mut SimRng, p: f64, hit: DiseaseStatus| if rng.bernoulli(p) { hit } else { Recovered };

        match status {
            InfectedButNotContagious if elapsed >= c.days_infected_to_contagious => Some(Contagious),
            Contagious if elapsed >= c.days_contagious_to_symptoms => Some(branch(rng, c.p_symptoms, ShowingSymptoms)),
            ShowingSymptoms if elapsed >= c.days_symptoms_to_next => Some(branch(rng, c.p_seriously_sick, SeriouslySick)),
            SeriouslySick if elapsed >= c.days_seriously_sick_to_next => Some(branch(rng, c.p_critical, Critical)),
            Critical if elapsed >= c.days_critical => Some(SeriouslySickAfterCritical),
            SeriouslySickAfterCritical if elapsed >= c.days_after_critical => Some(Recovered),
            _ => None,
        }
    }

    fn update_quarantine(&self, person: &mut PersonState, day: u32) {
        let current = person.quarantine_status();
        let next = match person.disease_status() {
            DiseaseStatus::ShowingSymptoms
                if current == QuarantineStatus::No
                    && person.days_since(DiseaseStatus::ShowingSymptoms, day).is_some_and(|d| d >= 1) =>
            {
                QuarantineStatus::AtHome
            }
            DiseaseStatus::SeriouslySick | DiseaseStatus::Critical => QuarantineStatus::Full,
            DiseaseStatus::Recovered => QuarantineStatus::No,
            DiseaseStatus::Susceptible
                if current == QuarantineStatus::AtHome
                    && person.days_since_quarantine(day).is_some_and(|d| d >= self.config.quarantine_days) =>
            {
                QuarantineStatus::No
            }
            _ => current,
        };
        if next != current {
            person.set_quarantine_status(next, day);
        }
    }
}

impl ProgressionModel for DefaultProgressionModel {
    /// Quarantine the traced contacts of everyone who goes into home
    /// quarantine because of symptoms today.
    fn before_state_updates(&mut self, persons: &mut [PersonState], day: u32, config: &EpiConfig) {
        let since = SimTime::corrected(config.start_offset, 0.0, day.saturating_sub(config.tracing_retention_days));
        let traced: Vec<PersonId> = persons
            .iter()
            .filter(|p| {
                p.disease_status() == DiseaseStatus::ShowingSymptoms
                    && p.quarantine_status() == QuarantineStatus::No
                    && p.days_since(DiseaseStatus::ShowingSymptoms, day) == Some(1)
            })
            .flat_map(|p| p.traceable_contacts(since.seconds))
            .collect();

        let mut quarantined = 0usize;
        for id in traced {
            if let Some(contact) = persons.get_mut(id.index()) {
                if contact.quarantine_status() == QuarantineStatus::No
                    && contact.disease_status() != DiseaseStatus::Recovered
                {
                    contact.set_quarantine_status(QuarantineStatus::AtHome, day);
                    quarantined += 1;
                }
            }
        }
        if quarantined > 0 {
            log::debug!("day {day}: {quarantined} traced contacts quarantined");
        }
    }

    fn update_state(&mut self, person: &mut PersonState, now: SimTime, rng: &mut SimRng) -> EpiResult<()> {
        if let Some(next) = self.next_status(person, now.day, rng) {
            person.set_disease_status(now, next)?;
        }
        self.update_quarantine(person, now.day);
        Ok(())
    }

    fn can_progress(&self, counts: &StatusCounts) -> bool {
        counts.active_infections() > 0 || counts.quarantined() > 0
    }
}
