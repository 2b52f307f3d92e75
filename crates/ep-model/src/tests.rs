//! Unit tests for ep-model.

use std::sync::Arc;

use ep_core::{
    ActivityDictionary, ActivityId, ContainerId, ContainerInfo, ContainerStats, DiseaseStatus, EpiConfig,
    InfectionParams, PersonId, QuarantineStatus, SimRng, SimTime,
};
use ep_graph::{Contact, LeaveRecord};
use ep_population::{Population, PopulationBuilder};

use crate::{ContactModel, DefaultContactModel, FixedInfectionModel, Restriction, Restrictions};

// ── Helpers ───────────────────────────────────────────────────────────────────

const HOME: ActivityId = ActivityId(0);
const WORK: ActivityId = ActivityId(1);
const LEISURE: ActivityId = ActivityId(2);
const EDU: ActivityId = ActivityId(3);
const SHOP: ActivityId = ActivityId(4);
const TR: ActivityId = ActivityId(5);

const HOME_1: u32 = 0;
const WORK_1: u32 = 1;
const BUS_1: u32 = 2;

fn params() -> Vec<InfectionParams> {
    vec![
        InfectionParams::new("home", 1.0),
        InfectionParams::new("work", 1.0),
        InfectionParams::new("leisure", 5.0),
        InfectionParams::new("edu", 10.0),
        InfectionParams::new("shop", 0.5),
        InfectionParams::new("tr", 1.0),
        InfectionParams::new("quarantine_home", 0.3),
    ]
}

fn config() -> EpiConfig {
    EpiConfig { max_contacts: 10, ..EpiConfig::default() }.with_params(params())
}

fn dict() -> Arc<ActivityDictionary> {
    Arc::new(ActivityDictionary::new(params()).unwrap())
}

fn work_stats(max_group_size: i32) -> ContainerStats {
    ContainerStats { max_group_size, total_users: 100, typical_capacity: max_group_size, num_spaces: 1.0 }
}

fn population(persons: usize) -> Population {
    let containers = vec![
        ContainerInfo::facility("home_1"),
        ContainerInfo::facility("work_1").with_stats(work_stats(30)),
        ContainerInfo::vehicle("bus_1"),
    ];
    PopulationBuilder::new(persons)
        .containers(&containers)
        .build(&mut SimRng::for_init(1))
        .unwrap()
}

fn at(time_of_day: f64, iteration: u32) -> SimTime {
    SimTime::corrected(0.0, time_of_day, iteration)
}

fn set_status(pop: &mut Population, person: u32, status: DiseaseStatus, day: u32) {
    pop.person_mut(PersonId(person)).unwrap().set_disease_status(at(0.0, day), status).unwrap();
}

fn status(pop: &Population, person: u32) -> DiseaseStatus {
    pop.person(PersonId(person)).unwrap().disease_status()
}

/// Leave event of `person` with contacts `(person, activity, duration)`.
fn leave(person: u32, container: u32, activity: ActivityId, contacts: &[(u32, ActivityId, u32)]) -> LeaveRecord {
    LeaveRecord {
        person: PersonId(person),
        container: ContainerId(container),
        activity,
        prev_activity: None,
        next_activity: None,
        time: 7200,
        enter_time: 0,
        contacts: contacts
            .iter()
            .map(|&(p, activity, duration)| Contact { person: PersonId(p), activity, offset: 0, duration })
            .collect(),
    }
}

fn model(config: &EpiConfig, probability: f64, iteration: u32, restrictions: Restrictions) -> DefaultContactModel {
    let mut m = DefaultContactModel::new(config, dict(), Box::new(FixedInfectionModel { probability }));
    m.set_iteration(iteration, Arc::new(restrictions));
    m
}

fn open_model(probability: f64, iteration: u32) -> DefaultContactModel {
    let config = config();
    let restrictions = Restrictions::for_config(&config);
    model(&config, probability, iteration, restrictions)
}

// ── Default contact model ─────────────────────────────────────────────────────

#[cfg(test)]
mod default_model {
    use super::*;

    #[test]
    fn susceptible_leaving_person_is_infected() {
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let mut m = open_model(1.0, 2);
        let mut rng = SimRng::for_run(1);

        m.infection_dynamics(&leave(0, HOME_1, HOME, &[(1, HOME, 3600)]), at(7200.0, 2), &mut pop, &mut rng)
            .unwrap();

        assert_eq!(status(&pop, 0), DiseaseStatus::InfectedButNotContagious);
        let records = m.drain_infections();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.infected, PersonId(0));
        assert_eq!(r.infector, Some(PersonId(1)));
        assert_eq!(r.container, Some(ContainerId(HOME_1)));
        assert_eq!(r.infection_type, "home_home");
        assert_eq!(r.infector_status, Some(DiseaseStatus::Contagious));
        assert_eq!(r.day, 2);
        assert_eq!(m.drain_contacts(), 1);
        assert!(m.drain_infections().is_empty());

        let source = pop.person(PersonId(0)).unwrap().infection().unwrap();
        assert_eq!(source.infection_type, "home_home");
    }

    #[test]
    fn contagious_leaving_person_infects_contact() {
        let mut pop = population(2);
        set_status(&mut pop, 0, DiseaseStatus::ShowingSymptoms, 1);
        let mut m = open_model(1.0, 2);
        let mut rng = SimRng::for_run(1);

        m.infection_dynamics(&leave(0, HOME_1, HOME, &[(1, HOME, 3600)]), at(7200.0, 2), &mut pop, &mut rng)
            .unwrap();
        assert_eq!(status(&pop, 1), DiseaseStatus::InfectedButNotContagious);
        assert_eq!(m.drain_infections()[0].infector, Some(PersonId(0)));
    }

    #[test]
    fn no_transmission_on_day_zero() {
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 0);
        let mut m = open_model(1.0, 0);
        let mut rng = SimRng::for_run(1);

        m.infection_dynamics(&leave(0, HOME_1, HOME, &[(1, HOME, 3600)]), at(7200.0, 0), &mut pop, &mut rng)
            .unwrap();
        assert_eq!(status(&pop, 0), DiseaseStatus::Susceptible);
        assert_eq!(rng.draws(), 0);
    }

    /// Equal statuses never transmit, whatever the duration or tracking.
    #[test]
    fn equal_statuses_never_infect() {
        let mut durations = SimRng::for_run(99);
        for trial in 0..1000u32 {
            let s = DiseaseStatus::ALL[trial as usize % DiseaseStatus::COUNT];
            let mut pop = population(2);
            if s != DiseaseStatus::Susceptible {
                set_status(&mut pop, 0, s, 1);
                set_status(&mut pop, 1, s, 1);
            }
            let mut config = config();
            if trial % 2 == 1 {
                config.tracking_after_day = 0;
            }
            let mut m = model(&config, 1.0, 2, Restrictions::for_config(&config));
            let duration = durations.index(86_400) as u32;
            let mut rng = SimRng::for_run(u64::from(trial));

            m.infection_dynamics(&leave(0, HOME_1, HOME, &[(1, HOME, duration)]), at(7200.0, 2), &mut pop, &mut rng)
                .unwrap();
            assert!(m.drain_infections().is_empty(), "trial {trial} with {s}");
            assert_eq!(status(&pop, 0), s);
        }
    }

    #[test]
    fn infector_past_contagious_period_does_not_transmit() {
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let event = leave(0, HOME_1, HOME, &[(1, HOME, 3600)]);

        // 5 days after turning contagious.
        let mut m = open_model(1.0, 6);
        m.infection_dynamics(&event, at(7200.0, 6), &mut pop, &mut SimRng::for_run(1)).unwrap();
        assert_eq!(status(&pop, 0), DiseaseStatus::Susceptible);

        // 4 days is still inside the period.
        let mut m = open_model(1.0, 5);
        m.infection_dynamics(&event, at(7200.0, 5), &mut pop, &mut SimRng::for_run(1)).unwrap();
        assert_eq!(status(&pop, 0), DiseaseStatus::InfectedButNotContagious);
    }

    #[test]
    fn zero_fraction_draws_nothing() {
        let config = config();
        let restrictions = Restrictions::for_config(&config).with("work", Restriction::fraction(0.0));
        let mut m = model(&config, 1.0, 2, restrictions);
        let mut pop = population(6);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let contacts: Vec<_> = (1..6).map(|p| (p, WORK, 3600)).collect();
        let mut rng = SimRng::for_run(5);

        m.infection_dynamics(&leave(0, WORK_1, WORK, &contacts), at(7200.0, 2), &mut pop, &mut rng).unwrap();

        assert_eq!(rng.draws(), 0);
        assert_eq!(m.drain_contacts(), 0);
        assert!(m.drain_infections().is_empty());
    }

    #[test]
    fn at_most_max_contacts_are_sampled() {
        let config = EpiConfig { max_contacts: 3, ..config() };
        let mut m = model(&config, 1.0, 2, Restrictions::for_config(&config));
        let mut pop = population(11);
        let contacts: Vec<_> = (1..11).map(|p| (p, HOME, 3600)).collect();
        let mut rng = SimRng::for_run(5);

        m.infection_dynamics(&leave(0, HOME_1, HOME, &contacts), at(7200.0, 2), &mut pop, &mut rng).unwrap();

        // Everyone is susceptible, so no pair gets past the status filter.
        assert_eq!(rng.draws(), 3);
        assert_eq!(m.drain_contacts(), 0);
    }

    #[test]
    fn leaving_person_is_never_its_own_contact() {
        let mut pop = population(1);
        set_status(&mut pop, 0, DiseaseStatus::Contagious, 1);
        let mut m = open_model(1.0, 2);
        let mut rng = SimRng::for_run(1);

        m.infection_dynamics(&leave(0, HOME_1, HOME, &[(0, HOME, 3600)]), at(7200.0, 2), &mut pop, &mut rng)
            .unwrap();
        assert_eq!(rng.draws(), 1);
        assert_eq!(m.drain_contacts(), 0);
        assert!(m.drain_infections().is_empty());
    }

    fn infections_between(leaving_activity: ActivityId, other_activity: ActivityId) -> usize {
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let mut m = open_model(1.0, 2);
        let event = leave(0, HOME_1, leaving_activity, &[(1, other_activity, 3600)]);
        m.infection_dynamics(&event, at(7200.0, 2), &mut pop, &mut SimRng::for_run(1)).unwrap();
        m.drain_infections().len()
    }

    #[test]
    fn cross_activity_rules() {
        assert_eq!(infections_between(HOME, HOME), 1);
        assert_eq!(infections_between(HOME, LEISURE), 1);
        assert_eq!(infections_between(HOME, WORK), 1);
        assert_eq!(infections_between(HOME, EDU), 0);
        assert_eq!(infections_between(HOME, SHOP), 0);
        assert_eq!(infections_between(EDU, EDU), 1);
        assert_eq!(infections_between(EDU, WORK), 1);
        assert_eq!(infections_between(EDU, LEISURE), 0);
        assert_eq!(infections_between(SHOP, LEISURE), 1);
    }

    #[test]
    fn vehicles_use_pt_label_and_skip_cross_rules() {
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let mut m = open_model(1.0, 2);
        let event = leave(0, BUS_1, TR, &[(1, TR, 600)]);

        m.infection_dynamics(&event, at(7200.0, 2), &mut pop, &mut SimRng::for_run(1)).unwrap();
        assert_eq!(m.drain_infections()[0].infection_type, "pt");
        // Vehicle contacts are not reported.
        assert_eq!(m.drain_contacts(), 0);
    }

    #[test]
    fn adjacent_activity_restrictions_apply_to_vehicles() {
        let config = config();
        let restrictions = Restrictions::for_config(&config).with("work", Restriction::fraction(0.0));
        let mut m = model(&config, 1.0, 2, restrictions);
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let mut event = leave(0, BUS_1, TR, &[(1, TR, 600)]);
        event.next_activity = Some(WORK);
        let mut rng = SimRng::for_run(1);

        m.infection_dynamics(&event, at(7200.0, 2), &mut pop, &mut rng).unwrap();
        assert!(m.drain_infections().is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn vehicle_events_without_neighbours_use_the_trajectory() {
        let config = config();
        let restrictions = Restrictions::for_config(&config).with("work", Restriction::fraction(0.0));
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let event = leave(0, BUS_1, TR, &[(1, TR, 600)]);

        // Home done, riding to work: the closed next activity excludes the ride.
        pop.person_mut(PersonId(0)).unwrap().set_trajectory(vec![HOME, WORK, HOME]);
        pop.person_mut(PersonId(0)).unwrap().advance_cursor();
        let mut m = model(&config, 1.0, 2, restrictions.clone());
        m.infection_dynamics(&event, at(7200.0, 2), &mut pop, &mut SimRng::for_run(1)).unwrap();
        assert!(m.drain_infections().is_empty());

        // Without a trajectory there is nothing to restrict.
        pop.person_mut(PersonId(0)).unwrap().set_trajectory(Vec::new());
        let mut m = model(&config, 1.0, 2, restrictions);
        m.infection_dynamics(&event, at(7200.0, 2), &mut pop, &mut SimRng::for_run(1)).unwrap();
        assert_eq!(m.drain_infections().len(), 1);
    }

    #[test]
    fn quarantine_limits_participation() {
        // Full quarantine excludes the leaving person before any draw.
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        pop.person_mut(PersonId(0)).unwrap().set_quarantine_status(QuarantineStatus::Full, 1);
        let mut m = open_model(1.0, 2);
        let mut rng = SimRng::for_run(1);
        m.infection_dynamics(&leave(0, HOME_1, HOME, &[(1, HOME, 3600)]), at(7200.0, 2), &mut pop, &mut rng)
            .unwrap();
        assert_eq!(rng.draws(), 0);

        // Home quarantine allows home activities only.
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        pop.person_mut(PersonId(0)).unwrap().set_quarantine_status(QuarantineStatus::AtHome, 1);
        m.infection_dynamics(&leave(0, WORK_1, WORK, &[(1, WORK, 3600)]), at(7200.0, 2), &mut pop, &mut rng)
            .unwrap();
        assert_eq!(status(&pop, 0), DiseaseStatus::Susceptible);
        m.infection_dynamics(&leave(0, BUS_1, TR, &[(1, TR, 3600)]), at(7200.0, 2), &mut pop, &mut rng).unwrap();
        assert_eq!(status(&pop, 0), DiseaseStatus::Susceptible);
        m.infection_dynamics(&leave(0, HOME_1, HOME, &[(1, HOME, 3600)]), at(7200.0, 2), &mut pop, &mut rng)
            .unwrap();
        assert_eq!(status(&pop, 0), DiseaseStatus::InfectedButNotContagious);
    }

    #[test]
    fn group_size_limit_and_closure() {
        let config = config();
        let event = leave(0, WORK_1, WORK, &[(1, WORK, 3600)]);

        let cases = [
            (Restriction::open().with_max_group_size(10), 0),
            (Restriction::open().with_max_group_size(50), 1),
            (Restriction::open().with_max_group_size(-1), 1),
            (Restriction::open().close(ContainerId(WORK_1)), 0),
            (Restriction::open().close(ContainerId(HOME_1)), 1),
        ];
        for (restriction, expected) in cases {
            let mut pop = population(2);
            set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
            let restrictions = Restrictions::for_config(&config).with("work", restriction.clone());
            let mut m = model(&config, 1.0, 2, restrictions);
            m.infection_dynamics(&event, at(7200.0, 2), &mut pop, &mut SimRng::for_run(1)).unwrap();
            assert_eq!(m.drain_infections().len(), expected, "{restriction:?}");
        }
    }

    #[test]
    fn tracking_logs_contacts_in_both_directions() {
        let config = EpiConfig { tracking_after_day: 2, tracking_min_duration: 900.0, ..config() };
        let mut m = model(&config, 0.0, 2, Restrictions::for_config(&config));
        let mut pop = population(4);
        let event = leave(0, HOME_1, HOME, &[(1, HOME, 3600), (2, SHOP, 3600), (3, HOME, 600)]);

        m.infection_dynamics(&event, at(7200.0, 2), &mut pop, &mut SimRng::for_run(1)).unwrap();

        let p0 = pop.person(PersonId(0)).unwrap();
        assert_eq!(p0.traceable_contacts(0.0).collect::<Vec<_>>(), vec![PersonId(1)]);
        let p1 = pop.person(PersonId(1)).unwrap();
        assert_eq!(p1.traceable_contacts(0.0).collect::<Vec<_>>(), vec![PersonId(0)]);
        // home_shop is cut by the cross rules; the short contact is still reported.
        assert_eq!(m.drain_contacts(), 2);
    }

    #[test]
    fn implausible_joint_time_is_fatal() {
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let mut m = open_model(1.0, 2);
        let event = leave(0, HOME_1, HOME, &[(1, HOME, 700_000)]);
        let err = m.infection_dynamics(&event, at(7200.0, 2), &mut pop, &mut SimRng::for_run(1)).unwrap_err();
        assert!(matches!(err, ep_core::EpiError::Invariant(_)));
    }
}

// ── ContactCore ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod contact_core {
    use super::*;
    use crate::{ContactCore, InfectionLabel, Site};

    fn core(iteration: u32) -> ContactCore {
        let config = config();
        let mut core = ContactCore::new(&config, dict(), Box::new(FixedInfectionModel { probability: 1.0 }));
        core.set_iteration(iteration, Arc::new(Restrictions::for_config(&config)));
        core
    }

    #[test]
    fn infection_time_is_clamped_to_end_of_day() {
        let mut core = core(2);
        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let label = InfectionLabel::new(false, "home", "home");
        let (target, infector) = pop.pair_mut(PersonId(0), PersonId(1)).unwrap();

        core.infect_person(target, infector, at(90_000.0, 2), &label, ContainerId(0), 3).unwrap();

        let records = core.drain_infections();
        let record = &records[0];
        assert_eq!(record.time, at(86_399.0, 2).seconds);
        assert_eq!(record.day, 2);
        assert_eq!(record.group_size, 3);
        assert_eq!(target.status_changed_at(DiseaseStatus::InfectedButNotContagious), Some(at(86_399.0, 2)));
    }

    #[test]
    fn infect_person_checks_invariants() {
        let mut core = core(2);
        let label = InfectionLabel::Transit;

        let mut pop = population(2);
        set_status(&mut pop, 0, DiseaseStatus::Recovered, 1);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        let (target, infector) = pop.pair_mut(PersonId(0), PersonId(1)).unwrap();
        assert!(core.infect_person(target, infector, at(0.0, 2), &label, ContainerId(2), 1).is_err());

        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::InfectedButNotContagious, 1);
        let (target, infector) = pop.pair_mut(PersonId(0), PersonId(1)).unwrap();
        assert!(core.infect_person(target, infector, at(0.0, 2), &label, ContainerId(2), 1).is_err());

        let mut pop = population(2);
        set_status(&mut pop, 1, DiseaseStatus::Contagious, 1);
        pop.person_mut(PersonId(1)).unwrap().set_quarantine_status(QuarantineStatus::Full, 1);
        let (target, infector) = pop.pair_mut(PersonId(0), PersonId(1)).unwrap();
        assert!(core.infect_person(target, infector, at(0.0, 2), &label, ContainerId(2), 1).is_err());
        assert_eq!(target.disease_status(), DiseaseStatus::Susceptible);
        assert!(core.drain_infections().is_empty());
    }

    #[test]
    fn home_quarantine_selects_quarantine_params() {
        let core = core(2);
        let mut pop = population(1);
        let home = Site::of(pop.container(ContainerId(HOME_1)).unwrap());
        let bus = Site::of(pop.container(ContainerId(BUS_1)).unwrap());

        let p = pop.person(PersonId(0)).unwrap();
        assert_eq!(core.infection_params(&home, p, HOME).unwrap().container_name, "home");
        assert_eq!(core.infection_params(&bus, p, HOME).unwrap().container_name, "tr");

        pop.person_mut(PersonId(0)).unwrap().set_quarantine_status(QuarantineStatus::AtHome, 1);
        let p = pop.person(PersonId(0)).unwrap();
        assert_eq!(core.infection_params(&home, p, HOME).unwrap().container_name, "quarantine_home");
        assert_eq!(core.infection_params(&home, p, WORK).unwrap().container_name, "work");
    }

    #[test]
    fn labels_render_and_match() {
        let label = InfectionLabel::new(false, "leisure", "work");
        assert_eq!(label.to_string(), "leisure_work");
        assert!(label.contains("leis"));
        assert!(!label.contains("home"));
        assert_eq!(InfectionLabel::new(true, "leisure", "work").to_string(), "pt");
        assert!(InfectionLabel::Transit.cross_activity_allowed());
    }
}

// ── Direct contact model ──────────────────────────────────────────────────────

#[cfg(test)]
mod direct {
    use super::*;
    use ep_graph::EnterEvent;

    use crate::DirectContactModel;

    fn direct(iteration: u32) -> DirectContactModel {
        let config = config();
        let mut m = DirectContactModel::new(&config, dict(), Box::new(FixedInfectionModel { probability: 1.0 }));
        m.set_iteration(iteration, Arc::new(Restrictions::for_config(&config)));
        m
    }

    fn enter(m: &mut DirectContactModel, pop: &mut Population, person: u32, container: u32, time: f64, it: u32) {
        let event = EnterEvent { person: PersonId(person), container: ContainerId(container), activity: HOME, time: time as u32 };
        m.notify_enter(&event, at(time, it), pop, &mut SimRng::for_run(0)).unwrap();
    }

    #[test]
    fn entering_persons_pair_up() {
        let mut m = direct(1);
        let mut pop = population(3);
        enter(&mut m, &mut pop, 0, HOME_1, 0.0, 1);
        assert_eq!(m.single(ContainerId(HOME_1)), Some(PersonId(0)));
        enter(&mut m, &mut pop, 1, HOME_1, 600.0, 1);
        assert_eq!(m.single(ContainerId(HOME_1)), None);
        assert_eq!(m.partner(ContainerId(HOME_1), PersonId(0)), Some(PersonId(1)));
        enter(&mut m, &mut pop, 2, HOME_1, 1200.0, 1);
        assert_eq!(m.single(ContainerId(HOME_1)), Some(PersonId(2)));

        // Re-entering a grouped person changes nothing.
        enter(&mut m, &mut pop, 1, HOME_1, 1300.0, 1);
        assert_eq!(m.single(ContainerId(HOME_1)), Some(PersonId(2)));

        // Vehicles form no groups.
        enter(&mut m, &mut pop, 0, BUS_1, 0.0, 1);
        assert_eq!(m.single(ContainerId(BUS_1)), None);
    }

    #[test]
    fn leaving_group_member_infects_partner_and_frees_them() {
        let mut m = direct(1);
        let mut pop = population(3);
        set_status(&mut pop, 0, DiseaseStatus::Contagious, 1);
        enter(&mut m, &mut pop, 0, HOME_1, 0.0, 1);
        enter(&mut m, &mut pop, 1, HOME_1, 600.0, 1);
        enter(&mut m, &mut pop, 2, HOME_1, 1200.0, 1);

        let event = leave(0, HOME_1, HOME, &[(1, HOME, 0), (2, HOME, 0)]);
        m.infection_dynamics(&event, at(4200.0, 1), &mut pop, &mut SimRng::for_run(1)).unwrap();

        assert_eq!(status(&pop, 1), DiseaseStatus::InfectedButNotContagious);
        assert_eq!(m.drain_infections()[0].infection_type, "home_home");
        assert_eq!(m.drain_contacts(), 1);
        // The freed partner paired with the waiting single.
        assert_eq!(m.partner(ContainerId(HOME_1), PersonId(1)), Some(PersonId(2)));
        assert_eq!(m.single(ContainerId(HOME_1)), None);
    }

    #[test]
    fn leaving_single_is_cleared() {
        let mut m = direct(1);
        let mut pop = population(1);
        enter(&mut m, &mut pop, 0, HOME_1, 0.0, 1);
        let event = leave(0, HOME_1, HOME, &[(0, HOME, 0)]);
        m.infection_dynamics(&event, at(600.0, 1), &mut pop, &mut SimRng::for_run(1)).unwrap();
        assert_eq!(m.single(ContainerId(HOME_1)), None);
    }

    #[test]
    fn day_zero_releases_without_infection() {
        let mut m = direct(0);
        let mut pop = population(2);
        set_status(&mut pop, 0, DiseaseStatus::Contagious, 0);
        enter(&mut m, &mut pop, 0, HOME_1, 0.0, 0);
        enter(&mut m, &mut pop, 1, HOME_1, 600.0, 0);

        let event = leave(0, HOME_1, HOME, &[(1, HOME, 0)]);
        m.infection_dynamics(&event, at(4200.0, 0), &mut pop, &mut SimRng::for_run(1)).unwrap();
        assert_eq!(status(&pop, 1), DiseaseStatus::Susceptible);
        assert_eq!(m.single(ContainerId(HOME_1)), Some(PersonId(1)));
    }

    #[test]
    fn zero_joint_time_ends_processing() {
        let mut m = direct(1);
        let mut pop = population(2);
        set_status(&mut pop, 0, DiseaseStatus::Contagious, 1);
        enter(&mut m, &mut pop, 0, HOME_1, 0.0, 1);
        enter(&mut m, &mut pop, 1, HOME_1, 600.0, 1);

        let event = leave(0, HOME_1, HOME, &[(1, HOME, 0)]);
        m.infection_dynamics(&event, at(600.0, 1), &mut pop, &mut SimRng::for_run(1)).unwrap();
        assert_eq!(status(&pop, 1), DiseaseStatus::Susceptible);
        assert_eq!(m.drain_contacts(), 0);
    }
}

// ── Infection model ───────────────────────────────────────────────────────────

#[cfg(test)]
mod infection {
    use super::*;
    use crate::{DefaultInfectionModel, InfectionModel};

    #[test]
    fn default_probability_formula() {
        let model = DefaultInfectionModel::new(1.0e-5);
        let mut pop = population(2);
        pop.person_mut(PersonId(0)).unwrap().set_susceptibility(0.5);
        let restrictions = Restrictions::new().with("leisure", Restriction::open().with_ci_correction(0.5));
        let (target_params, infector_params) = (InfectionParams::new("home", 2.0), InfectionParams::new("leisure", 5.0));

        let p = model.infection_probability(
            pop.person(PersonId(0)).unwrap(),
            pop.person(PersonId(1)).unwrap(),
            &restrictions,
            &target_params,
            &infector_params,
            3600.0,
        );
        let expected = 1.0 - (-1.0e-5 * 0.5 * 5.0 * 3600.0 * 0.5f64).exp();
        assert!((p - expected).abs() < 1e-12);

        let none = model.infection_probability(
            pop.person(PersonId(0)).unwrap(),
            pop.person(PersonId(1)).unwrap(),
            &restrictions,
            &target_params,
            &infector_params,
            0.0,
        );
        assert_eq!(none, 0.0);
    }
}

// ── Restrictions ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod restriction {
    use super::*;
    use crate::{FixedPolicy, RestrictionChange, RestrictionPolicy, ScheduledPolicy, StatusCounts};

    #[test]
    fn missing_entry_is_open() {
        let r = Restrictions::new();
        assert_eq!(r.remaining_fraction("work"), 1.0);
        assert_eq!(r.ci_correction("work"), 1.0);
        let mut rng = SimRng::for_run(1);
        assert!(r.is_relevant("work", &mut rng));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn group_size_check() {
        let r = Restriction::open().with_max_group_size(10);
        assert!(r.exceeds_group_size(11));
        assert!(!r.exceeds_group_size(10));
        assert!(!r.exceeds_group_size(-1));
        assert!(!Restriction::open().exceeds_group_size(1000));
    }

    #[test]
    fn scheduled_policy_applies_changes_once_in_order() {
        let mut policy = ScheduledPolicy::new()
            .fraction_at(0, "work", 0.9)
            .fraction_at(3, "work", 0.5)
            .at(3, "edu", RestrictionChange::Close(ContainerId(4)))
            .fraction_at(5, "work", 0.2);
        let mut r = Restrictions::for_config(&config());
        let counts = StatusCounts::default();

        policy.init(&mut r);
        assert_eq!(r.remaining_fraction("work"), 0.9);
        policy.update_restrictions(1, &counts, &mut r);
        policy.update_restrictions(2, &counts, &mut r);
        assert_eq!(r.remaining_fraction("work"), 0.9);
        policy.update_restrictions(3, &counts, &mut r);
        assert_eq!(r.remaining_fraction("work"), 0.5);
        assert!(r.get("edu").unwrap().is_closed(ContainerId(4)));

        // Changes of skipped iterations are caught up.
        policy.update_restrictions(6, &counts, &mut r);
        assert_eq!(r.remaining_fraction("work"), 0.2);
    }

    #[test]
    fn fixed_policy_installs_initial_restrictions() {
        let mut policy = FixedPolicy::new(Restrictions::new().with("leisure", Restriction::fraction(0.3)));
        let mut r = Restrictions::for_config(&config());
        policy.init(&mut r);
        policy.update_restrictions(1, &StatusCounts::default(), &mut r);
        assert_eq!(r.remaining_fraction("leisure"), 0.3);
        assert_eq!(r.remaining_fraction("work"), 1.0);
    }
}

// ── Progression ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod progression {
    use super::*;
    use ep_core::ProgressionConfig;
    use ep_population::PersonState;

    use crate::{DefaultProgressionModel, ProgressionModel, StatusCounts};

    fn certain() -> DefaultProgressionModel {
        DefaultProgressionModel::new(ProgressionConfig {
            p_symptoms: 1.0,
            p_seriously_sick: 1.0,
            p_critical: 1.0,
            ..ProgressionConfig::default()
        })
    }

    #[test]
    fn severe_course_with_quarantine() {
        let mut model = certain();
        let mut rng = SimRng::for_run(1);
        let mut p = PersonState::new(PersonId(0));
        p.set_disease_status(at(0.0, 1), DiseaseStatus::InfectedButNotContagious).unwrap();

        let expected = [
            (4, DiseaseStatus::InfectedButNotContagious, QuarantineStatus::No),
            (5, DiseaseStatus::Contagious, QuarantineStatus::No),
            (7, DiseaseStatus::ShowingSymptoms, QuarantineStatus::No),
            (8, DiseaseStatus::ShowingSymptoms, QuarantineStatus::AtHome),
            (11, DiseaseStatus::SeriouslySick, QuarantineStatus::Full),
            (16, DiseaseStatus::Critical, QuarantineStatus::Full),
            (26, DiseaseStatus::SeriouslySickAfterCritical, QuarantineStatus::Full),
            (31, DiseaseStatus::Recovered, QuarantineStatus::No),
        ];
        for (day, status, quarantine) in expected {
            model.update_state(&mut p, at(0.0, day), &mut rng).unwrap();
            assert_eq!(p.disease_status(), status, "day {day}");
            assert_eq!(p.quarantine_status(), quarantine, "day {day}");
        }
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn mild_course_recovers_after_contagious() {
        let mut model = DefaultProgressionModel::new(ProgressionConfig { p_symptoms: 0.0, ..ProgressionConfig::default() });
        let mut rng = SimRng::for_run(1);
        let mut p = PersonState::new(PersonId(0));
        p.set_disease_status(at(0.0, 1), DiseaseStatus::Contagious).unwrap();
        model.update_state(&mut p, at(0.0, 3), &mut rng).unwrap();
        assert_eq!(p.disease_status(), DiseaseStatus::Recovered);
    }

    #[test]
    fn traced_contacts_quarantined_then_released() {
        let mut model = certain();
        let config = config();
        let mut rng = SimRng::for_run(1);
        let mut persons: Vec<_> = (0..3).map(|i| PersonState::new(PersonId(i))).collect();
        persons[0].set_disease_status(at(0.0, 3), DiseaseStatus::ShowingSymptoms).unwrap();
        persons[0].add_traceable_contact(PersonId(1), true, at(100.0, 2).seconds);

        model.before_state_updates(&mut persons, 4, &config);
        for p in persons.iter_mut() {
            model.update_state(p, at(0.0, 4), &mut rng).unwrap();
        }
        assert_eq!(persons[0].quarantine_status(), QuarantineStatus::AtHome);
        assert_eq!(persons[1].quarantine_status(), QuarantineStatus::AtHome);
        assert_eq!(persons[2].quarantine_status(), QuarantineStatus::No);

        model.update_state(&mut persons[1], at(0.0, 17), &mut rng).unwrap();
        assert_eq!(persons[1].quarantine_status(), QuarantineStatus::AtHome);
        model.update_state(&mut persons[1], at(0.0, 18), &mut rng).unwrap();
        assert_eq!(persons[1].quarantine_status(), QuarantineStatus::No);
    }

    #[test]
    fn can_progress_while_anyone_is_infected_or_quarantined() {
        let model = certain();
        let mut persons: Vec<_> = (0..2).map(|i| PersonState::new(PersonId(i))).collect();
        assert!(!model.can_progress(&StatusCounts::from_persons(&persons)));
        persons[1].set_quarantine_status(QuarantineStatus::AtHome, 1);
        assert!(model.can_progress(&StatusCounts::from_persons(&persons)));
        persons[1].set_quarantine_status(QuarantineStatus::No, 2);
        persons[0].set_disease_status(at(0.0, 1), DiseaseStatus::Contagious).unwrap();
        assert!(model.can_progress(&StatusCounts::from_persons(&persons)));
        persons[0].set_disease_status(at(0.0, 2), DiseaseStatus::Recovered).unwrap();
        assert!(!model.can_progress(&StatusCounts::from_persons(&persons)));
    }
}

// ── Household susceptibility and counts ───────────────────────────────────────

#[cfg(test)]
mod household {
    use super::*;
    use ep_core::HouseholdSusceptibilityConfig;

    use crate::{StatusCounts, apply_household_susceptibility};

    #[test]
    fn one_draw_per_household() {
        let mut pop = population(4);
        let homes = [Some(ContainerId(0)), Some(ContainerId(0)), Some(ContainerId(1)), None];
        let config = HouseholdSusceptibilityConfig { p_households: 1.0, susceptibility: 0.5 };
        let mut rng = SimRng::for_init(3);

        let changed = apply_household_susceptibility(pop.persons_mut(), &homes, &config, &mut rng);
        assert_eq!(changed, 4);
        assert_eq!(rng.draws(), 3);
        assert!(pop.persons().iter().all(|p| p.susceptibility() == 0.5));
    }

    #[test]
    fn disabled_sampling_draws_nothing() {
        let mut pop = population(3);
        let config = HouseholdSusceptibilityConfig::default();
        let mut rng = SimRng::for_init(3);
        assert_eq!(apply_household_susceptibility(pop.persons_mut(), &[], &config, &mut rng), 0);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn counts_by_status_and_quarantine() {
        let mut pop = population(4);
        set_status(&mut pop, 0, DiseaseStatus::Contagious, 1);
        set_status(&mut pop, 1, DiseaseStatus::Recovered, 1);
        pop.person_mut(PersonId(2)).unwrap().set_quarantine_status(QuarantineStatus::AtHome, 1);
        let counts = StatusCounts::from_persons(pop.persons());
        assert_eq!(counts.count(DiseaseStatus::Susceptible), 2);
        assert_eq!(counts.active_infections(), 1);
        assert_eq!(counts.cumulative_infected(), 2);
        assert_eq!(counts.quarantined(), 1);
        assert_eq!(counts.total(), 4);
    }
}
