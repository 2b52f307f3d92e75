//! The per-run owner of the population and the models.

use std::sync::Arc;

use ep_core::{ActivityId, ContainerId, DayOfWeek, DiseaseStatus, EpiConfig, PersonId, SimRng, SimTime};
use ep_graph::{EventView, LeaveEvent};
use ep_model::{
    ContactModel, IMPORT, InfectionRecord, ProgressionModel, RestrictionPolicy, Restrictions, StatusCounts,
    apply_household_susceptibility,
};
use ep_population::{InfectionSource, Population, PopulationBuilder};
use ep_provider::EventProvider;
use log::{debug, info, warn};

use crate::{InfectionReport, SimError, SimResult};

/// Applies one run's days to its population.
///
/// The call order per iteration is fixed:
///
/// ```text
/// init(provider)                      once
/// reset(i)                            i = 1, 2, 3, ...
///   process_event(e)                  for every event of the day
/// finish_day()
/// ```
///
/// Everything random draws from the run stream of `config.seed`, except
/// population setup which uses the separate init stream.
pub struct InfectionEventHandler {
    config:        EpiConfig,
    contact_model: Box<dyn ContactModel>,
    progression:   Box<dyn ProgressionModel>,
    policy:        Box<dyn RestrictionPolicy>,
    restrictions:  Restrictions,
    population:    Option<Population>,
    homes:         Vec<Option<ContainerId>>,
    rng:           SimRng,
    iteration:     u32,
    /// Imported cases applied so far.
    imported:      u32,
    /// Imported cases of the current day, reported by `finish_day`.
    imports:       Vec<InfectionRecord>,
    report:        Option<InfectionReport>,
}

impl InfectionEventHandler {
    pub fn new(
        config:        EpiConfig,
        contact_model: Box<dyn ContactModel>,
        progression:   Box<dyn ProgressionModel>,
        policy:        Box<dyn RestrictionPolicy>,
    ) -> Self {
        InfectionEventHandler {
            rng: SimRng::for_run(config.seed),
            restrictions: Restrictions::for_config(&config),
            config,
            contact_model,
            progression,
            policy,
            population: None,
            homes: Vec::new(),
            iteration: 0,
            imported: 0,
            imports: Vec::new(),
            report: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EpiConfig {
        &self.config
    }

    /// Iteration of the last `reset`, 0 before the first one.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn is_initialized(&self) -> bool {
        self.population.is_some()
    }

    pub fn population(&self) -> SimResult<&Population> {
        self.population.as_ref().ok_or(SimError::NotInitialized)
    }

    /// Direct access for seeding scenarios and tests.
    pub fn population_mut(&mut self) -> SimResult<&mut Population> {
        self.population.as_mut().ok_or(SimError::NotInitialized)
    }

    pub fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }

    /// Report of the current iteration, if any.
    pub fn report(&self) -> Option<&InfectionReport> {
        self.report.as_ref()
    }

    pub fn imported(&self) -> u32 {
        self.imported
    }

    /// Draws taken from the run stream so far.
    pub fn draws(&self) -> u64 {
        self.rng.draws()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Create persons and containers from `provider`.  A second call is a
    /// no-op.
    pub fn init(&mut self, provider: &dyn EventProvider) -> SimResult<()> {
        if self.population.is_some() {
            return Ok(());
        }

        let mut init_rng = SimRng::for_init(self.config.seed);
        let mut population = PopulationBuilder::new(provider.persons().len())
            .containers(provider.containers())
            .equipment_rate(self.config.equipment_rate)
            .build(&mut init_rng)?;

        let homes = provider.homes()?;
        let changed = apply_household_susceptibility(
            population.persons_mut(),
            &homes,
            &self.config.household_susceptibility,
            &mut init_rng,
        );
        if changed > 0 {
            debug!("household sampling changed the susceptibility of {changed} persons");
        }

        self.policy.init(&mut self.restrictions);
        info!(
            "handler initialized: {} persons, {} containers",
            population.num_persons(),
            population.num_containers()
        );
        self.homes = homes;
        self.population = Some(population);
        Ok(())
    }

    /// Prepare `iteration`.  Must be called once per iteration, in order,
    /// starting at 1, before any event of that day.
    pub fn reset(&mut self, iteration: u32) -> SimResult<()> {
        if self.population.is_none() {
            return Err(SimError::NotInitialized);
        }
        let expected = self.iteration + 1;
        if iteration != expected {
            return Err(SimError::IterationOrder { expected, got: iteration });
        }
        self.iteration = iteration;
        let to_import = self.imports_due(iteration);
        let population = self.population.as_mut().ok_or(SimError::NotInitialized)?;
        population.clear_occupancy();

        // ── Progression ───────────────────────────────────────────────────
        let start = SimTime::corrected(self.config.start_offset, 0.0, iteration);
        self.progression.set_iteration(iteration);
        self.progression.before_state_updates(population.persons_mut(), iteration, &self.config);
        for person in population.persons_mut() {
            self.progression.update_state(person, start, &mut self.rng)?;
        }

        // ── Tracing retention ─────────────────────────────────────────────
        let retained_from = SimTime::corrected(
            self.config.start_offset,
            0.0,
            iteration.saturating_sub(self.config.tracing_retention_days),
        );
        for person in population.persons_mut() {
            person.clear_traceable_contacts_before(retained_from.seconds);
        }

        // ── Imported cases ────────────────────────────────────────────────
        self.imports.clear();
        if to_import > 0 {
            self.imports = import_cases(population, &self.homes, to_import, start, &mut self.rng)?;
            self.imported += self.imports.len() as u32;
            debug!("day {iteration}: {} imported cases", self.imports.len());
        }

        // ── Report and restrictions ───────────────────────────────────────
        let counts = StatusCounts::from_persons(population.persons());
        let day = DayOfWeek::for_iteration(self.config.start_day, iteration);
        self.policy.update_restrictions(iteration, &counts, &mut self.restrictions);
        debug!("day {iteration}: restrictions {:?}", self.restrictions);
        self.contact_model.set_iteration(iteration, Arc::new(self.restrictions.clone()));
        self.report = Some(InfectionReport::new(iteration, day, counts));
        Ok(())
    }

    /// Load the day's facility trajectories, one per person, and rewind
    /// every cursor.  Persons without an entry get an empty trajectory.
    pub fn set_trajectories(&mut self, mut trajectories: Vec<Vec<ActivityId>>) -> SimResult<()> {
        let population = self.population.as_mut().ok_or(SimError::NotInitialized)?;
        for (i, person) in population.persons_mut().iter_mut().enumerate() {
            person.set_trajectory(trajectories.get_mut(i).map(std::mem::take).unwrap_or_default());
        }
        Ok(())
    }

    /// Apply one event of the current day.
    pub fn process_event(&mut self, event: &EventView<'_>) -> SimResult<()> {
        let population = self.population.as_mut().ok_or(SimError::NotInitialized)?;
        let now = SimTime::corrected(self.config.start_offset, f64::from(event.time()), self.iteration);
        match event {
            EventView::Enter(enter) => {
                population.enter(enter.person, enter.container, now.seconds)?;
                self.contact_model.notify_enter(enter, now, population, &mut self.rng)?;
            }
            EventView::Leave(leave) => {
                self.contact_model.infection_dynamics(leave, now, population, &mut self.rng)?;
                population.leave(leave.person(), leave.container())?;
                if !population.container(leave.container())?.is_vehicle() {
                    population.person_mut(leave.person())?.advance_cursor();
                }
            }
        }
        Ok(())
    }

    /// Close the current day: complete its report and return its
    /// infections, imported cases first.
    pub fn finish_day(&mut self) -> SimResult<Vec<InfectionRecord>> {
        let population = self.population.as_ref().ok_or(SimError::NotInitialized)?;
        let report = self.report.as_mut().ok_or(SimError::NotInitialized)?;

        let mut infections = std::mem::take(&mut self.imports);
        report.imported = infections.len();
        infections.extend(self.contact_model.drain_infections());
        report.infections = infections.len();
        report.contacts = self.contact_model.drain_contacts();
        report.counts = StatusCounts::from_persons(population.persons());
        Ok(infections)
    }

    /// `true` once no disease transition is possible any more and every
    /// imported case has been applied.
    pub fn is_finished(&self) -> bool {
        let Some(population) = self.population.as_ref() else {
            return false;
        };
        if self.iteration == 0 {
            return false;
        }
        let counts = StatusCounts::from_persons(population.persons());
        let imports_exhausted = self.imported >= self.config.initial_infections
            || counts.count(DiseaseStatus::Susceptible) == 0;
        !self.progression.can_progress(&counts) && imports_exhausted
    }

    fn imports_due(&self, iteration: u32) -> usize {
        if iteration < self.config.initial_start_iteration {
            return 0;
        }
        let remaining = self.config.initial_infections.saturating_sub(self.imported);
        remaining.min(self.config.infections_per_day) as usize
    }
}

/// Infect up to `n` random susceptible persons from outside.
fn import_cases(
    population: &mut Population,
    homes:      &[Option<ContainerId>],
    n:          usize,
    now:        SimTime,
    rng:        &mut SimRng,
) -> SimResult<Vec<InfectionRecord>> {
    let mut candidates: Vec<PersonId> = population
        .persons()
        .iter()
        .filter(|p| p.disease_status() == DiseaseStatus::Susceptible)
        .map(|p| p.id())
        .collect();
    if candidates.len() < n {
        warn!("{n} imported cases due but only {} susceptible persons left", candidates.len());
    }

    let take = n.min(candidates.len());
    let mut records = Vec::with_capacity(take);
    for drawn in 0..take {
        let pick = drawn + rng.index(candidates.len() - drawn);
        candidates.swap(drawn, pick);
        let id = candidates[drawn];

        let person = population.person_mut(id)?;
        person.set_disease_status(now, DiseaseStatus::InfectedButNotContagious)?;
        person.record_infection(InfectionSource {
            container: homes.get(id.index()).copied().flatten().unwrap_or(ContainerId::INVALID),
            infection_type: IMPORT.to_string(),
            time: now,
        })?;
        records.push(InfectionRecord {
            time: now.seconds,
            day: now.day,
            infector: None,
            infected: id,
            container: None,
            infection_type: IMPORT.to_string(),
            group_size: 0,
            infector_status: None,
        });
    }
    Ok(records)
}
