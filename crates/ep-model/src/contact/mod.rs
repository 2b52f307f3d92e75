//! Contact models: who meets whom when a person leaves a container, and
//! whether that meeting transmits the disease.
//!
//! Both models share [`ContactCore`], which holds the daily restriction
//! snapshot and implements eligibility, labelling, tracking and the
//! infection step itself.  The models differ only in how they pick the
//! partners of a leaving person and how long they were together:
//!
//! * [`DefaultContactModel`] samples up to `max_contacts` of the event's
//!   precomputed contacts and uses their overlap durations.
//! * [`DirectContactModel`] pairs persons as they enter and uses the
//!   lifetime of the pair.

mod default;
mod direct;

use std::fmt;
use std::sync::Arc;

use ep_core::{
    ActivityDictionary, ActivityId, ContainerId, ContainerStats, DiseaseStatus, EpiConfig, EpiError, EpiResult,
    InfectionParams, MAX_JOINT_TIME, QuarantineStatus, SECONDS_PER_DAY, SimRng, SimTime,
};
use ep_graph::{EnterEvent, LeaveEvent};
use ep_population::{ContainerState, InfectionSource, PersonState, Population};

use crate::{InfectionModel, InfectionRecord, Restrictions};

pub use default::DefaultContactModel;
pub use direct::DirectContactModel;

/// A person that had contagious status for longer than this many days no
/// longer transmits.
pub const CONTAGIOUS_DAYS: u32 = 4;

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Consumes the day's container events and decides on infections.
///
/// Randomness comes from the run stream passed into every call; a model
/// keeps no generator of its own.
pub trait ContactModel: Send {
    /// Start a new iteration with the restrictions of that day.
    fn set_iteration(&mut self, iteration: u32, restrictions: Arc<Restrictions>);

    /// A person entered a container.
    ///
    /// Default: ignored.
    fn notify_enter(
        &mut self,
        _event:      &EnterEvent,
        _now:        SimTime,
        _population: &mut Population,
        _rng:        &mut SimRng,
    ) -> EpiResult<()> {
        Ok(())
    }

    /// A person left a container.  Infections are applied to `population`
    /// immediately and recorded for [`drain_infections`][Self::drain_infections].
    fn infection_dynamics(
        &mut self,
        event:      &dyn LeaveEvent,
        now:        SimTime,
        population: &mut Population,
        rng:        &mut SimRng,
    ) -> EpiResult<()>;

    /// Infections since the last call.
    fn drain_infections(&mut self) -> Vec<InfectionRecord>;

    /// Number of contacts reported since the last call.
    fn drain_contacts(&mut self) -> u64;
}

// ── Site ──────────────────────────────────────────────────────────────────────

/// The parts of a container the contact rules look at, copied out so the
/// population can be borrowed mutably afterwards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Site {
    pub id: ContainerId,
    pub is_vehicle: bool,
    pub stats: ContainerStats,
}

impl Site {
    pub fn of(container: &ContainerState) -> Self {
        Site { id: container.id(), is_vehicle: container.is_vehicle(), stats: container.stats() }
    }

    #[inline]
    pub fn is_facility(&self) -> bool {
        !self.is_vehicle
    }
}

// ── InfectionLabel ────────────────────────────────────────────────────────────

/// Infection type of a contact: `"pt"` in vehicles, `"{leaving}_{other}"`
/// in facilities.  Only turned into a `String` when it is recorded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InfectionLabel<'a> {
    Transit,
    Facility { leaving: &'a str, other: &'a str },
}

impl<'a> InfectionLabel<'a> {
    pub fn new(is_vehicle: bool, leaving: &'a str, other: &'a str) -> Self {
        if is_vehicle { InfectionLabel::Transit } else { InfectionLabel::Facility { leaving, other } }
    }

    /// Substring test against the rendered label.  `needle` must not contain
    /// `'_'`.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            InfectionLabel::Transit => "pt".contains(needle),
            InfectionLabel::Facility { leaving, other } => leaving.contains(needle) || other.contains(needle),
        }
    }

    /// Home may only meet home, leisure or work; education may only meet
    /// education or work.  Pairs of the same category always pass.
    pub fn cross_activity_allowed(&self) -> bool {
        let InfectionLabel::Facility { leaving, other } = *self else {
            return true;
        };
        let both = |prefix: &str| leaving.starts_with(prefix) && other.starts_with(prefix);
        if self.contains("home") && !self.contains("leis") && !self.contains("work") && !both("home") {
            return false;
        }
        if self.contains("edu") && !self.contains("work") && !both("edu") {
            return false;
        }
        true
    }
}

impl fmt::Display for InfectionLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfectionLabel::Transit => f.write_str("pt"),
            InfectionLabel::Facility { leaving, other } => write!(f, "{leaving}_{other}"),
        }
    }
}

// ── Free rules ────────────────────────────────────────────────────────────────

/// Different statuses, one of them susceptible, both relevant for
/// transmission.
pub fn persons_can_infect_each_other(a: &PersonState, b: &PersonState) -> bool {
    let (sa, sb) = (a.disease_status(), b.disease_status());
    sa != sb
        && (sa == DiseaseStatus::Susceptible || sb == DiseaseStatus::Susceptible)
        && sa.is_relevant_for_transmission()
        && sb.is_relevant_for_transmission()
}

/// `true` if `person` turned contagious more than [`CONTAGIOUS_DAYS`] ago.
pub fn past_contagious_period(person: &PersonState, iteration: u32) -> bool {
    person.days_since(DiseaseStatus::Contagious, iteration).is_some_and(|d| d > CONTAGIOUS_DAYS)
}

fn lookup(dict: &ActivityDictionary, activity: ActivityId) -> EpiResult<&InfectionParams> {
    dict.get(activity).ok_or_else(|| EpiError::UnknownActivity(format!("activity id {activity}")))
}

/// Container name of `activity`.
pub(crate) fn group_name(dict: &ActivityDictionary, activity: ActivityId) -> EpiResult<&str> {
    lookup(dict, activity).map(|p| p.container_name.as_str())
}

// ── ContactCore ───────────────────────────────────────────────────────────────

/// State and rules shared by every contact model.
pub struct ContactCore {
    dict: Arc<ActivityDictionary>,
    infection_model: Box<dyn InfectionModel>,
    restrictions: Arc<Restrictions>,
    iteration: u32,
    start_offset: f64,
    max_contacts: usize,
    tracking_after_day: u32,
    tracking_min_duration: f64,
    trace_susceptible: bool,
    infections: Vec<InfectionRecord>,
    contacts: u64,
}

impl ContactCore {
    pub fn new(config: &EpiConfig, dict: Arc<ActivityDictionary>, infection_model: Box<dyn InfectionModel>) -> Self {
        ContactCore {
            dict,
            infection_model,
            restrictions: Arc::new(Restrictions::for_config(config)),
            iteration: 0,
            start_offset: config.start_offset,
            max_contacts: config.max_contacts as usize,
            tracking_after_day: config.tracking_after_day,
            tracking_min_duration: config.tracking_min_duration,
            trace_susceptible: config.trace_susceptible,
            infections: Vec::new(),
            contacts: 0,
        }
    }

    pub fn set_iteration(&mut self, iteration: u32, restrictions: Arc<Restrictions>) {
        self.iteration = iteration;
        self.restrictions = restrictions;
    }

    #[inline]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    #[inline]
    pub fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }

    #[inline]
    pub fn dictionary(&self) -> &Arc<ActivityDictionary> {
        &self.dict
    }

    #[inline]
    pub fn max_contacts(&self) -> usize {
        self.max_contacts
    }

    #[inline]
    pub fn trace_susceptible(&self) -> bool {
        self.trace_susceptible
    }

    /// Contacts are recorded for tracing from `tracking_after_day` on.
    #[inline]
    pub fn tracking_enabled(&self) -> bool {
        self.iteration >= self.tracking_after_day
    }

    pub fn params(&self, activity: ActivityId) -> EpiResult<&InfectionParams> {
        lookup(&self.dict, activity)
    }

    // ── Eligibility ───────────────────────────────────────────────────────

    /// Whether `person` takes part in the contacts of `event` today.
    ///
    /// Checks run cheapest first.  Random draws happen only where a
    /// remaining fraction strictly between 0 and 1 has to be tested.
    pub fn is_relevant(
        &self,
        person: &PersonState,
        site:   &Site,
        event:  &dyn LeaveEvent,
        rng:    &mut SimRng,
    ) -> EpiResult<bool> {
        let status = person.disease_status();
        if !status.is_relevant_for_transmission() && status != DiseaseStatus::InfectedButNotContagious {
            return Ok(false);
        }
        let quarantine = person.quarantine_status();
        if quarantine == QuarantineStatus::Full {
            return Ok(false);
        }

        if site.is_facility() {
            let name = self.params(event.activity())?.container_name.as_str();
            if quarantine == QuarantineStatus::AtHome && !name.starts_with("home") {
                return Ok(false);
            }
            if let Some(r) = self.restrictions.get(name) {
                if r.exceeds_group_size(site.stats.max_group_size) || r.is_closed(site.id) {
                    return Ok(false);
                }
            }
            return Ok(self.restrictions.is_relevant(name, rng));
        }

        if quarantine != QuarantineStatus::No {
            return Ok(false);
        }
        let transit = &self.dict[self.dict.transit()].container_name;
        if !self.restrictions.is_relevant(transit, rng) {
            return Ok(false);
        }
        // Between facilities k-1 and k the cursor stands at k.
        let next = event.next_activity().or_else(|| person.current_activity());
        let prev = event.prev_activity().or_else(|| person.previous_activity());
        for adjacent in [next, prev].into_iter().flatten() {
            let name = &self.params(adjacent)?.container_name;
            if !self.restrictions.is_relevant(name, rng) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Params governing `person` while performing `activity` in `site`.
    ///
    /// Vehicles always use the transit params.  A person quarantined at home
    /// uses the home-quarantine params in a `home` container when present.
    pub fn infection_params(&self, site: &Site, person: &PersonState, activity: ActivityId) -> EpiResult<&InfectionParams> {
        if site.is_vehicle {
            return Ok(&self.dict[self.dict.transit()]);
        }
        let params = self.params(activity)?;
        if person.quarantine_status() == QuarantineStatus::AtHome && params.container_name == "home" {
            if let Some(q) = self.dict.home_quarantine() {
                return Ok(&self.dict[q]);
            }
        }
        Ok(params)
    }

    // ── Tracking ──────────────────────────────────────────────────────────

    /// Log the contact on both sides unless it happened in transit or while
    /// shopping, or was too short.
    pub fn track(&self, a: &mut PersonState, b: &mut PersonState, now: SimTime, joint_time: f64, label: &InfectionLabel<'_>) {
        if label.contains("pt") || label.contains("shop") || joint_time < self.tracking_min_duration {
            return;
        }
        let (a_traceable, b_traceable) = (a.is_traceable(), b.is_traceable());
        a.add_traceable_contact(b.id(), b_traceable, now.seconds);
        b.add_traceable_contact(a.id(), a_traceable, now.seconds);
    }

    #[inline]
    pub fn report_contact(&mut self) {
        self.contacts += 1;
    }

    // ── Transmission ──────────────────────────────────────────────────────

    /// Final stage shared by both models: status and contagious-period
    /// checks, the joint time bound, one draw against the probability, and
    /// the infection itself.
    #[allow(clippy::too_many_arguments)]
    pub fn transmit(
        &mut self,
        leaving:          &mut PersonState,
        other:            &mut PersonState,
        site:             &Site,
        leaving_activity: ActivityId,
        other_activity:   ActivityId,
        joint_time:       f64,
        now:              SimTime,
        label:            &InfectionLabel<'_>,
        group_size:       usize,
        rng:              &mut SimRng,
    ) -> EpiResult<()> {
        if !persons_can_infect_each_other(leaving, other) {
            return Ok(());
        }
        if past_contagious_period(leaving, self.iteration) || past_contagious_period(other, self.iteration) {
            return Ok(());
        }
        if !(0.0..=f64::from(MAX_JOINT_TIME)).contains(&joint_time) {
            log::warn!("implausible joint time at {}", now.seconds);
            return Err(EpiError::invariant(format!(
                "joint time {joint_time} of {} and {} in {} is outside [0, {MAX_JOINT_TIME}]",
                leaving.id(),
                other.id(),
                site.id
            )));
        }

        let leaving_is_target = leaving.disease_status() == DiseaseStatus::Susceptible;
        let probability = {
            let leaving_params = self.infection_params(site, leaving, leaving_activity)?;
            let other_params = self.infection_params(site, other, other_activity)?;
            if leaving_is_target {
                self.infection_model.infection_probability(
                    leaving, other, &self.restrictions, leaving_params, other_params, joint_time,
                )
            } else {
                self.infection_model.infection_probability(
                    other, leaving, &self.restrictions, other_params, leaving_params, joint_time,
                )
            }
        };
        if rng.uniform() < probability {
            if leaving_is_target {
                self.infect_person(leaving, other, now, label, site.id, group_size)?;
            } else {
                self.infect_person(other, leaving, now, label, site.id, group_size)?;
            }
        }
        Ok(())
    }

    /// Infect `target` through `infector`.
    ///
    /// Infection times at or after the end of the current day are moved to
    /// its last second.
    pub fn infect_person(
        &mut self,
        target:     &mut PersonState,
        infector:   &PersonState,
        now:        SimTime,
        label:      &InfectionLabel<'_>,
        container:  ContainerId,
        group_size: usize,
    ) -> EpiResult<()> {
        if target.disease_status() != DiseaseStatus::Susceptible {
            return Err(EpiError::invariant(format!(
                "{} cannot be infected, status is {}",
                target.id(),
                target.disease_status()
            )));
        }
        if !infector.disease_status().can_infect() {
            return Err(EpiError::invariant(format!(
                "{} cannot infect, status is {}",
                infector.id(),
                infector.disease_status()
            )));
        }
        if target.quarantine_status() == QuarantineStatus::Full || infector.quarantine_status() == QuarantineStatus::Full {
            return Err(EpiError::invariant(format!(
                "infection of {} by {} during full quarantine",
                target.id(),
                infector.id()
            )));
        }

        let day_length = f64::from(SECONDS_PER_DAY);
        let end_of_day = SimTime::corrected(self.start_offset, day_length, self.iteration);
        let now = if now.seconds >= end_of_day.seconds {
            SimTime::corrected(self.start_offset, day_length - 1.0, self.iteration)
        } else {
            now
        };

        let infection_type = label.to_string();
        target.set_disease_status(now, DiseaseStatus::InfectedButNotContagious)?;
        target.record_infection(InfectionSource { container, infection_type: infection_type.clone(), time: now })?;
        self.infections.push(InfectionRecord {
            time: now.seconds,
            day: now.day,
            infector: Some(infector.id()),
            infected: target.id(),
            container: Some(container),
            infection_type,
            group_size,
            infector_status: Some(infector.disease_status()),
        });
        Ok(())
    }

    pub fn drain_infections(&mut self) -> Vec<InfectionRecord> {
        std::mem::take(&mut self.infections)
    }

    pub fn drain_contacts(&mut self) -> u64 {
        std::mem::take(&mut self.contacts)
    }
}
