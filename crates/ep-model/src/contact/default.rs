use std::sync::Arc;

use ep_core::{ActivityDictionary, DiseaseStatus, EpiConfig, EpiResult, SimRng, SimTime};
use ep_graph::LeaveEvent;
use ep_population::Population;

use super::{ContactCore, ContactModel, InfectionLabel, Site, group_name};
use crate::{InfectionModel, InfectionRecord, Restrictions};

/// Samples up to `max_contacts` of a leave event's contacts without
/// replacement and evaluates each pair.
///
/// Contacts rejected at any step are not retried.  Per-event cost is bounded
/// by `max_contacts` independent of the container's occupancy.
pub struct DefaultContactModel {
    core: ContactCore,
    /// Reused sampling buffer of contact indices.
    indices: Vec<usize>,
}

impl DefaultContactModel {
    pub fn new(config: &EpiConfig, dict: Arc<ActivityDictionary>, infection_model: Box<dyn InfectionModel>) -> Self {
        DefaultContactModel { core: ContactCore::new(config, dict, infection_model), indices: Vec::new() }
    }

    pub fn core(&self) -> &ContactCore {
        &self.core
    }
}

impl ContactModel for DefaultContactModel {
    fn set_iteration(&mut self, iteration: u32, restrictions: Arc<Restrictions>) {
        self.core.set_iteration(iteration, restrictions);
    }

    fn infection_dynamics(
        &mut self,
        event:      &dyn LeaveEvent,
        now:        SimTime,
        population: &mut Population,
        rng:        &mut SimRng,
    ) -> EpiResult<()> {
        let num_contacts = event.num_contacts();
        if self.core.iteration() == 0 || num_contacts == 0 {
            return Ok(());
        }

        let site = Site::of(population.container(event.container())?);
        let leaving_id = event.person();
        if !self.core.is_relevant(population.person(leaving_id)?, &site, event, rng)? {
            return Ok(());
        }

        let tracking = self.core.tracking_enabled();
        let dict = Arc::clone(self.core.dictionary());
        let leaving_activity = event.activity();
        let leaving_name = group_name(&dict, leaving_activity)?;

        self.indices.clear();
        self.indices.extend(0..num_contacts);
        let contact_with = num_contacts.min(self.core.max_contacts());

        for drawn in 0..contact_with {
            // Partial Fisher-Yates: one draw per sampled contact.
            let pick = drawn + rng.index(num_contacts - drawn);
            self.indices.swap(drawn, pick);
            let contact = event.contact(self.indices[drawn]);
            if contact.person == leaving_id {
                continue;
            }

            let (leaving, other) = population.pair_mut(leaving_id, contact.person)?;
            if !self.core.is_relevant(other, &site, event, rng)? {
                continue;
            }

            // Past the eligibility draws, pairs that can neither transmit nor
            // be traced are dropped early.
            if !tracking {
                let (ls, os) = (leaving.disease_status(), other.disease_status());
                if ls == DiseaseStatus::InfectedButNotContagious
                    || os == DiseaseStatus::InfectedButNotContagious
                    || ls == os
                {
                    continue;
                }
            }

            let other_name = group_name(&dict, contact.activity)?;
            let label = InfectionLabel::new(site.is_vehicle, leaving_name, other_name);
            let joint_time = f64::from(contact.duration);

            if site.is_facility() {
                if !label.cross_activity_allowed() {
                    continue;
                }
                if tracking {
                    self.core.track(leaving, other, now, joint_time, &label);
                }
                self.core.report_contact();
            }

            self.core.transmit(
                leaving,
                other,
                &site,
                leaving_activity,
                contact.activity,
                joint_time,
                now,
                &label,
                num_contacts,
                rng,
            )?;
        }
        Ok(())
    }

    fn drain_infections(&mut self) -> Vec<InfectionRecord> {
        self.core.drain_infections()
    }

    fn drain_contacts(&mut self) -> u64 {
        self.core.drain_contacts()
    }
}
