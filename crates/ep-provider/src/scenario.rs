//! Day events built from raw movements.
//!
//! [`ScenarioProvider::init`] replays every weekday's movements through live
//! [`ContainerState`]s.  Each leave is read off the container at that moment
//! through an [`OccupancyLeave`] view and stored as an owned
//! [`LeaveRecord`], so later replays cost no bookkeeping.
//!
//! Per weekday:
//!
//! 1. Movements are sorted by time; at equal times leaves come before
//!    enters, otherwise input order is kept.  Stays that end the second
//!    they begin are dropped first: they have no contacts.
//! 2. A person whose first movement of the day is a leave starts the day in
//!    that container: an Enter at time 0 is emitted before everything else.
//!    Stationary persons start the day at home the same way.
//! 3. Whoever is still inside after the last movement leaves at 86400,
//!    container by container, in entry order.
//! 4. Each person's trajectory is the facility activities in leave order.
//!    Facility leave *k* gets prev *k-1* and next *k+1*; a vehicle leg
//!    between facility leaves *k-1* and *k* gets prev *k-1* and next *k*.
//!
//! Weekdays without movements replay the nearest earlier weekday that has
//! some.

use std::sync::Arc;

use ep_core::{
    ActivityDictionary, ActivityId, ContainerId, ContainerInfo, ContainerStats, DayOfWeek, EpiConfig, EpiError,
    EpiResult, PersonId, SECONDS_PER_DAY,
};
use ep_graph::{Contact, EnterEvent, EpisimEvent, LeaveEvent, LeaveRecord};
use ep_population::{ContainerState, PersonState, Population};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::provider::HOME;
use crate::{DayEvents, EventProvider, Movement, MovementKind, ProviderError, ProviderResult};

// ── OccupancyLeave ────────────────────────────────────────────────────────────

/// A leave event read straight off a container's current occupants.
///
/// Contacts are the other occupants in entry order.  A contact's offset is
/// how long after the leaving person the other one entered (zero if
/// earlier); its duration is the overlap up to the leave time.
///
/// The view has no trajectory, so prev and next activities are `None`.
pub struct OccupancyLeave<'a> {
    container: &'a ContainerState,
    person: PersonId,
    /// Current activity of every person, indexed by `PersonId`.
    activities: &'a [ActivityId],
    time: u32,
    enter_time: u32,
    position: usize,
}

impl<'a> OccupancyLeave<'a> {
    pub fn new(
        container:  &'a ContainerState,
        person:     PersonId,
        activities: &'a [ActivityId],
        time:       u32,
    ) -> EpiResult<Self> {
        let position = container.occupants().iter().position(|&p| p == person).ok_or_else(|| {
            EpiError::invariant(format!("{person} leaves {} without being inside", container.id()))
        })?;
        let enter_time = whole_seconds(container.entering_time(person));
        if time < enter_time {
            return Err(EpiError::invariant(format!(
                "{person} leaves {} at {time}s before entering at {enter_time}s",
                container.id()
            )));
        }
        Ok(OccupancyLeave { container, person, activities, time, enter_time, position })
    }
}

impl LeaveEvent for OccupancyLeave<'_> {
    fn person(&self) -> PersonId { self.person }
    fn container(&self) -> ContainerId { self.container.id() }
    fn activity(&self) -> ActivityId { self.activities[self.person.index()] }
    fn prev_activity(&self) -> Option<ActivityId> { None }
    fn next_activity(&self) -> Option<ActivityId> { None }
    fn time(&self) -> u32 { self.time }
    fn enter_time(&self) -> u32 { self.enter_time }
    fn num_contacts(&self) -> usize { self.container.len() - 1 }

    fn contact(&self, index: usize) -> Contact {
        let slot = if index < self.position { index } else { index + 1 };
        let other = self.container.occupants()[slot];
        let entered = whole_seconds(self.container.entering_time(other));
        Contact {
            person: other,
            activity: self.activities[other.index()],
            offset: entered.saturating_sub(self.enter_time),
            duration: self.time.saturating_sub(entered.max(self.enter_time)),
        }
    }
}

/// Entry times are recorded from `u32` seconds, so the cast is exact.
fn whole_seconds(t: f64) -> u32 {
    t as u32
}

// ── ScenarioProvider ──────────────────────────────────────────────────────────

/// Builds a week of events from [`Movement`]s.
pub struct ScenarioProvider {
    movements: Vec<Movement>,
    /// Persons without movements, as (person, home container).
    stationary: Vec<(String, String)>,
    capacities: FxHashMap<String, u32>,
    sample_size: f64,
    default_vehicle_capacity: u32,
    dictionary: Arc<ActivityDictionary>,

    persons: Vec<String>,
    containers: Vec<ContainerInfo>,
    /// Events of every weekday that is its own source; empty otherwise.
    days: [Vec<EpisimEvent>; 7],
    sources: [DayOfWeek; 7],
    initialized: bool,
}

impl ScenarioProvider {
    pub fn new(movements: Vec<Movement>, config: &EpiConfig) -> ProviderResult<Self> {
        Ok(ScenarioProvider {
            movements,
            stationary: Vec::new(),
            capacities: FxHashMap::default(),
            sample_size: config.sample_size,
            default_vehicle_capacity: config.default_vehicle_capacity,
            dictionary: Arc::new(config.dictionary()?),
            persons: Vec::new(),
            containers: Vec::new(),
            days: Default::default(),
            sources: DayOfWeek::ALL,
            initialized: false,
        })
    }

    /// Add a person who stays at `home` all week.
    pub fn with_stationary(mut self, person: &str, home: &str) -> Self {
        self.stationary.push((person.to_string(), home.to_string()));
        self
    }

    /// Seats plus standing room of vehicles, by vehicle id.
    pub fn with_capacities(mut self, capacities: impl IntoIterator<Item = (String, u32)>) -> Self {
        self.capacities.extend(capacities);
        self
    }

    /// The weekday whose events are replayed on `day`.
    pub fn source_day(&self, day: DayOfWeek) -> DayOfWeek {
        self.sources[day.index()]
    }
}

impl EventProvider for ScenarioProvider {
    fn init(&mut self) -> ProviderResult<()> {
        if self.initialized {
            return Ok(());
        }

        let mut index = Index::default();
        let mut steps: [Vec<Step>; 7] = Default::default();
        for m in &self.movements {
            let person = index.person(&m.person);
            let container = index.container(&m.container, m.vehicle)?;
            let activity =
                if m.vehicle { self.dictionary.transit() } else { self.dictionary.select(&m.activity_type)? };
            steps[m.day.index()].push(Step { person, container, activity, time: m.time, kind: m.kind });
        }
        for day in steps.iter_mut() {
            drop_empty_stays(day);
            day.sort_by_key(|s| (s.time, s.kind == MovementKind::Enter));
        }

        let mut stationary = Vec::with_capacity(self.stationary.len());
        if !self.stationary.is_empty() {
            let home = self
                .dictionary
                .id_of(HOME)
                .ok_or_else(|| EpiError::UnknownActivity(HOME.to_string()))?;
            for (person, container) in &self.stationary {
                let (person, container) = (index.person(person), index.container(container, false)?);
                stationary.push(Step { person, container, activity: home, time: 0, kind: MovementKind::Leave });
            }
        }

        let num_persons = index.persons.len();
        let mut usage = vec![ContainerUsage::default(); index.containers.len()];
        let mut days: [Vec<EpisimEvent>; 7] = Default::default();
        let sources = DayOfWeek::ALL.map(|day| source_of(&steps, day));

        for day in DayOfWeek::ALL {
            let source = sources[day.index()];
            if source != day {
                info!("{day}: no movements, replaying {source}");
                continue;
            }
            let mut replay = DayReplay::new(&self.dictionary, num_persons, &index.containers, &mut usage)?;
            replay.run(&steps[day.index()], &stationary)?;
            let events = replay.finish();
            info!("{day}: {} events", events.len());
            days[day.index()] = events;
        }

        self.containers = self.finish_stats(index.containers, &usage);
        self.persons = index.persons;
        self.days = days;
        self.sources = sources;
        self.initialized = true;
        info!(
            "scenario provider: {} persons, {} containers",
            self.persons.len(),
            self.containers.len()
        );
        Ok(())
    }

    fn persons(&self) -> &[String] {
        &self.persons
    }

    fn containers(&self) -> &[ContainerInfo] {
        &self.containers
    }

    fn dictionary(&self) -> &Arc<ActivityDictionary> {
        &self.dictionary
    }

    fn for_day(&self, day: DayOfWeek) -> ProviderResult<DayEvents<'_>> {
        if !self.initialized {
            return Err(ProviderError::NotInitialized);
        }
        Ok(DayEvents::Owned(self.days[self.sources[day.index()].index()].iter()))
    }
}

impl ScenarioProvider {
    /// Turn accumulated usage into scaled statistics.
    fn finish_stats(&self, mut containers: Vec<ContainerInfo>, usage: &[ContainerUsage]) -> Vec<ContainerInfo> {
        let mut missing_capacity = 0usize;
        let mut missing_usage = 0usize;

        for (info, usage) in containers.iter_mut().zip(usage) {
            let capacity = info.is_vehicle.then(|| match self.capacities.get(&info.name) {
                Some(&c) => c,
                None => {
                    missing_capacity += 1;
                    self.default_vehicle_capacity
                }
            });
            let num_spaces = match usage.most_used() {
                Some(activity) => self.dictionary[activity].spaces_per_facility,
                None => {
                    missing_usage += 1;
                    1.0
                }
            };
            info.stats =
                ContainerStats::scaled(usage.max_group, usage.users, capacity, num_spaces, self.sample_size);
        }

        if missing_capacity > 0 {
            warn!(
                "{missing_capacity} vehicles without known capacity; using {}",
                self.default_vehicle_capacity
            );
        }
        if missing_usage > 0 {
            warn!("{missing_usage} containers without activity usage; assuming 1 space");
        }
        containers
    }
}

/// The weekday whose movements are replayed on `day`: `day` itself, or the
/// nearest earlier weekday with movements.  Monday if there are none at all.
fn source_of(steps: &[Vec<Step>; 7], day: DayOfWeek) -> DayOfWeek {
    let mut d = day;
    for _ in 0..7 {
        if !steps[d.index()].is_empty() {
            return d;
        }
        d = d.previous();
    }
    DayOfWeek::Monday
}

// ── Interning ─────────────────────────────────────────────────────────────────

/// A movement with resolved ids.
#[derive(Copy, Clone, Debug)]
struct Step {
    person: PersonId,
    container: ContainerId,
    activity: ActivityId,
    time: u32,
    kind: MovementKind,
}

/// Removes an enter and the leave that directly follows it for the same
/// person when both name the same container and second.
fn drop_empty_stays(day: &mut Vec<Step>) {
    let mut last: FxHashMap<PersonId, usize> = FxHashMap::default();
    let mut keep = vec![true; day.len()];
    for (i, step) in day.iter().enumerate() {
        if let (MovementKind::Leave, Some(&j)) = (step.kind, last.get(&step.person)) {
            let enter = &day[j];
            if enter.kind == MovementKind::Enter && enter.container == step.container && enter.time == step.time {
                keep[i] = false;
                keep[j] = false;
            }
        }
        last.insert(step.person, i);
    }
    let mut keep = keep.into_iter();
    day.retain(|_| keep.next().unwrap_or(true));
}

/// External ids to dense indices, in first-seen order.
#[derive(Default)]
struct Index {
    persons: Vec<String>,
    person_ids: FxHashMap<String, PersonId>,
    containers: Vec<ContainerInfo>,
    container_ids: FxHashMap<String, ContainerId>,
}

impl Index {
    fn person(&mut self, name: &str) -> PersonId {
        if let Some(&id) = self.person_ids.get(name) {
            return id;
        }
        let id = PersonId(self.persons.len() as u32);
        self.persons.push(name.to_string());
        self.person_ids.insert(name.to_string(), id);
        id
    }

    fn container(&mut self, name: &str, vehicle: bool) -> ProviderResult<ContainerId> {
        if let Some(&id) = self.container_ids.get(name) {
            if self.containers[id.index()].is_vehicle != vehicle {
                return Err(ProviderError::Inconsistent(format!(
                    "container {name} is used both as a vehicle and as a facility"
                )));
            }
            return Ok(id);
        }
        let id = ContainerId(self.containers.len() as u32);
        let info = if vehicle { ContainerInfo::vehicle(name) } else { ContainerInfo::facility(name) };
        self.containers.push(info);
        self.container_ids.insert(name.to_string(), id);
        Ok(id)
    }
}

// ── Replay ────────────────────────────────────────────────────────────────────

/// Raw usage of one container, summed over the distinct days.
#[derive(Clone, Debug, Default)]
struct ContainerUsage {
    max_group: u32,
    users: u32,
    leaves_by_activity: FxHashMap<ActivityId, u32>,
}

impl ContainerUsage {
    /// Activity with the most leaves; ties go to the lower id.
    fn most_used(&self) -> Option<ActivityId> {
        self.leaves_by_activity
            .iter()
            .max_by(|(a, n), (b, m)| n.cmp(m).then(b.cmp(a)))
            .map(|(&a, _)| a)
    }
}

/// A leave whose prev/next activities are filled in once the day's
/// trajectories are known.
struct Pending {
    event: usize,
    person: PersonId,
    /// Facility leaves of `person` before this one.
    slot: usize,
    vehicle: bool,
}

/// Bookkeeping while one weekday is replayed.
struct DayReplay<'d> {
    population: Population,
    activities: Vec<ActivityId>,
    events: Vec<EpisimEvent>,
    trajectories: Vec<Vec<ActivityId>>,
    pending: Vec<Pending>,
    usage: &'d mut [ContainerUsage],
}

impl<'d> DayReplay<'d> {
    fn new(
        dict:        &ActivityDictionary,
        num_persons: usize,
        containers:  &[ContainerInfo],
        usage:       &'d mut [ContainerUsage],
    ) -> EpiResult<Self> {
        let persons = (0..num_persons).map(|i| PersonState::new(PersonId(i as u32))).collect();
        let states = containers
            .iter()
            .enumerate()
            .map(|(i, c)| ContainerState::new(ContainerId(i as u32), c.is_vehicle))
            .collect();
        Ok(DayReplay {
            population: Population::new(persons, states)?,
            activities: vec![dict.transit(); num_persons],
            events: Vec::new(),
            trajectories: vec![Vec::new(); num_persons],
            pending: Vec::new(),
            usage,
        })
    }

    fn run(&mut self, steps: &[Step], stationary: &[Step]) -> EpiResult<()> {
        // Start-of-day placement: persons first seen leaving, then stationary
        // persons.
        let mut seen = vec![false; self.activities.len()];
        let mut initial = Vec::new();
        for s in steps {
            if !std::mem::replace(&mut seen[s.person.index()], true) && s.kind == MovementKind::Leave {
                initial.push(*s);
            }
        }
        initial.extend(stationary.iter().filter(|s| !seen[s.person.index()]));
        for s in &initial {
            self.enter(s.person, s.container, s.activity, 0)?;
        }
        debug!("{} persons start the day inside a container", initial.len());

        for s in steps {
            match s.kind {
                MovementKind::Enter => self.enter(s.person, s.container, s.activity, s.time)?,
                MovementKind::Leave => self.leave(s.person, s.container, s.time)?,
            }
        }

        // End of day.
        for c in 0..self.population.num_containers() {
            let container = ContainerId(c as u32);
            let remaining = self.population.container(container)?.occupants().to_vec();
            for person in remaining {
                let entered = whole_seconds(self.population.container(container)?.entering_time(person));
                self.leave(person, container, SECONDS_PER_DAY.max(entered))?;
            }
        }
        Ok(())
    }

    fn enter(&mut self, person: PersonId, container: ContainerId, activity: ActivityId, time: u32) -> EpiResult<()> {
        self.population.enter(person, container, f64::from(time))?;
        self.activities[person.index()] = activity;
        let occupancy = self.population.container(container)?.len() as u32;
        let usage = &mut self.usage[container.index()];
        usage.users += 1;
        usage.max_group = usage.max_group.max(occupancy);
        self.events.push(EpisimEvent::Enter(EnterEvent { person, container, activity, time }));
        Ok(())
    }

    fn leave(&mut self, person: PersonId, container: ContainerId, time: u32) -> EpiResult<()> {
        let state = self.population.container(container)?;
        let vehicle = state.is_vehicle();
        let record = LeaveRecord::from_view(&OccupancyLeave::new(state, person, &self.activities, time)?);
        self.population.leave(person, container)?;

        let trajectory = &mut self.trajectories[person.index()];
        let slot = trajectory.len();
        if !vehicle {
            trajectory.push(record.activity);
        }
        *self.usage[container.index()].leaves_by_activity.entry(record.activity).or_default() += 1;
        self.pending.push(Pending { event: self.events.len(), person, slot, vehicle });
        self.events.push(EpisimEvent::Leave(record));
        Ok(())
    }

    /// Fill in prev/next activities and hand back the day's events.
    fn finish(mut self) -> Vec<EpisimEvent> {
        for p in &self.pending {
            let trajectory = &self.trajectories[p.person.index()];
            let prev = p.slot.checked_sub(1).and_then(|k| trajectory.get(k).copied());
            let next = if p.vehicle { trajectory.get(p.slot) } else { trajectory.get(p.slot + 1) }.copied();
            if let Some(EpisimEvent::Leave(record)) = self.events.get_mut(p.event) {
                record.prev_activity = prev;
                record.next_activity = next;
            }
        }
        self.events
    }
}
