use std::sync::Arc;

use ep_core::{ActivityDictionary, ContainerId, DiseaseStatus, EpiConfig, EpiResult, PersonId, SimRng, SimTime};
use ep_graph::{EnterEvent, LeaveEvent};
use ep_population::Population;
use rustc_hash::FxHashMap;

use super::{ContactCore, ContactModel, InfectionLabel, Site, group_name};
use crate::{InfectionModel, InfectionRecord, Restrictions};

/// Two persons who have been together since `formed_at`.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Group {
    a: PersonId,
    b: PersonId,
    formed_at: f64,
}

impl Group {
    fn contains(&self, person: PersonId) -> bool {
        self.a == person || self.b == person
    }

    fn partner_of(&self, person: PersonId) -> PersonId {
        if self.a == person { self.b } else { self.a }
    }
}

/// Pairwise contact model.
///
/// Persons entering a facility are paired off as they arrive: the first
/// waits as the container's single, the next one forms a group with them.
/// When a group member leaves, the remaining partner pairs with the current
/// single or becomes the single.  Joint time is the lifetime of the group.
/// Vehicles form no groups.
pub struct DirectContactModel {
    core: ContactCore,
    singles: FxHashMap<ContainerId, PersonId>,
    groups: FxHashMap<ContainerId, Vec<Group>>,
}

impl DirectContactModel {
    pub fn new(config: &EpiConfig, dict: Arc<ActivityDictionary>, infection_model: Box<dyn InfectionModel>) -> Self {
        DirectContactModel {
            core: ContactCore::new(config, dict, infection_model),
            singles: FxHashMap::default(),
            groups: FxHashMap::default(),
        }
    }

    pub fn core(&self) -> &ContactCore {
        &self.core
    }

    /// The person waiting for a partner in `container`.
    pub fn single(&self, container: ContainerId) -> Option<PersonId> {
        self.singles.get(&container).copied()
    }

    /// Partner of `person` in `container`, if grouped.
    pub fn partner(&self, container: ContainerId, person: PersonId) -> Option<PersonId> {
        self.groups.get(&container)?.iter().find(|g| g.contains(person)).map(|g| g.partner_of(person))
    }

    /// Take `person` out of the pairing of `container`.
    ///
    /// Returns the former partner and when the group was formed.  The
    /// partner is paired with the waiting single (as of `now`) or becomes
    /// the single.
    fn release(&mut self, container: ContainerId, person: PersonId, now: f64) -> Option<(PersonId, f64)> {
        if self.singles.get(&container) == Some(&person) {
            self.singles.remove(&container);
            return None;
        }
        let groups = self.groups.get_mut(&container)?;
        let pos = groups.iter().position(|g| g.contains(person))?;
        let group = groups.swap_remove(pos);
        let partner = group.partner_of(person);
        match self.singles.remove(&container) {
            Some(single) => groups.push(Group { a: partner, b: single, formed_at: now }),
            None => {
                self.singles.insert(container, partner);
            }
        }
        Some((partner, group.formed_at))
    }
}

impl ContactModel for DirectContactModel {
    fn set_iteration(&mut self, iteration: u32, restrictions: Arc<Restrictions>) {
        self.core.set_iteration(iteration, restrictions);
    }

    fn notify_enter(
        &mut self,
        event:      &EnterEvent,
        now:        SimTime,
        population: &mut Population,
        _rng:       &mut SimRng,
    ) -> EpiResult<()> {
        if population.container(event.container)?.is_vehicle() {
            return Ok(());
        }
        let groups = self.groups.entry(event.container).or_default();
        if groups.iter().any(|g| g.contains(event.person)) {
            return Ok(());
        }
        match self.singles.get(&event.container).copied() {
            Some(single) if single != event.person => {
                groups.push(Group { a: event.person, b: single, formed_at: now.seconds });
                self.singles.remove(&event.container);
            }
            Some(_) => {}
            None => {
                self.singles.insert(event.container, event.person);
            }
        }
        Ok(())
    }

    fn infection_dynamics(
        &mut self,
        event:      &dyn LeaveEvent,
        now:        SimTime,
        population: &mut Population,
        rng:        &mut SimRng,
    ) -> EpiResult<()> {
        let container = event.container();
        let leaving_id = event.person();
        let num_contacts = event.num_contacts();

        if self.core.iteration() == 0 || num_contacts == 0 {
            self.release(container, leaving_id, now.seconds);
            return Ok(());
        }
        if self.singles.get(&container) == Some(&leaving_id) {
            self.singles.remove(&container);
            return Ok(());
        }

        let site = Site::of(population.container(container)?);
        if !self.core.is_relevant(population.person(leaving_id)?, &site, event, rng)? {
            self.release(container, leaving_id, now.seconds);
            return Ok(());
        }
        let Some((partner, formed_at)) = self.release(container, leaving_id, now.seconds) else {
            return Ok(());
        };

        let (leaving, other) = population.pair_mut(leaving_id, partner)?;
        if !self.core.is_relevant(other, &site, event, rng)? {
            return Ok(());
        }

        let (ls, os) = (leaving.disease_status(), other.disease_status());
        if !self.core.tracking_enabled() {
            if ls == DiseaseStatus::InfectedButNotContagious || os == DiseaseStatus::InfectedButNotContagious || ls == os {
                return Ok(());
            }
        } else if !self.core.trace_susceptible() && ls == DiseaseStatus::Susceptible && os == DiseaseStatus::Susceptible {
            return Ok(());
        }

        // Groups carry no activity of their own; both sides use the event's.
        let activity = event.activity();
        let joint_time = now.seconds - formed_at;
        if joint_time == 0.0 {
            return Ok(());
        }

        let dict = Arc::clone(self.core.dictionary());
        let name = group_name(&dict, activity)?;
        let label = InfectionLabel::new(site.is_vehicle, name, name);

        if site.is_facility() {
            if !label.cross_activity_allowed() {
                return Ok(());
            }
            if self.core.tracking_enabled() {
                self.core.track(leaving, other, now, joint_time, &label);
            }
            self.core.report_contact();
        }

        self.core.transmit(leaving, other, &site, activity, activity, joint_time, now, &label, num_contacts, rng)
    }

    fn drain_infections(&mut self) -> Vec<InfectionRecord> {
        self.core.drain_infections()
    }

    fn drain_contacts(&mut self) -> u64 {
        self.core.drain_contacts()
    }
}
