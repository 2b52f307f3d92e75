//! Unit tests for the codec and archive.

use ep_core::{ActivityDictionary, ActivityId, ContainerId, InfectionParams, PersonId};

use crate::event::{Contact, EnterEvent, EpisimEvent, LeaveRecord};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn params() -> Vec<InfectionParams> {
    vec![
        InfectionParams::new("home", 1.0),
        InfectionParams::new("work", 1.0),
        InfectionParams::new("leisure", 5.0),
        InfectionParams::new("tr", 10.0),
    ]
}

fn dict() -> ActivityDictionary {
    ActivityDictionary::new(params()).unwrap()
}

fn contact(person: u32, activity: u8, offset: u32, duration: u32) -> Contact {
    Contact { person: PersonId(person), activity: ActivityId(activity), offset, duration }
}

/// One leave event with two contacts followed by one enter event.
fn scenario_a() -> Vec<EpisimEvent> {
    vec![
        EpisimEvent::Leave(LeaveRecord {
            person: PersonId(0),
            container: ContainerId(1),
            activity: ActivityId(0),
            prev_activity: None,
            next_activity: Some(ActivityId(1)),
            time: 1000,
            enter_time: 2000,
            contacts: vec![contact(5, 0, 0, 600), contact(6, 2, 120, 480)],
        }),
        EpisimEvent::Enter(EnterEvent {
            person: PersonId(3),
            container: ContainerId(3),
            activity: ActivityId(2),
            time: 3000,
        }),
    ]
}

// ── Codec ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod codec {
    use super::*;
    use crate::codec::{CONTACT_SIZE, ContactGraph, EVENT_SIZE, EventRef, HEADER_SIZE};
    use crate::error::GraphError;
    use crate::event::LeaveEvent;
    use ep_core::MAX_JOINT_TIME;

    fn roundtrip(events: &[EpisimEvent]) -> ContactGraph {
        let graph = ContactGraph::construct(events, &dict()).unwrap();
        let mut buf = Vec::new();
        graph.write(&mut buf).unwrap();
        assert_eq!(buf.len(), graph.serialized_len());
        ContactGraph::read(&mut buf.as_slice(), &dict()).unwrap()
    }

    #[test]
    fn allocates_exact_size() {
        let graph = ContactGraph::construct(&scenario_a(), &dict()).unwrap();
        assert_eq!(graph.num_events(), 2);
        assert_eq!(graph.num_contacts(), 2);
        assert_eq!(graph.size_bytes(), 2 * EVENT_SIZE + 2 * CONTACT_SIZE);
    }

    #[test]
    fn scenario_a_survives_write_and_read() {
        let graph = roundtrip(&scenario_a());
        let mut it = graph.iter();

        match it.next() {
            Some(EventRef::Leave(l)) => {
                assert_eq!(l.person(), PersonId(0));
                assert_eq!(l.container(), ContainerId(1));
                assert_eq!(l.activity(), ActivityId(0));
                assert_eq!(l.time(), 1000);
                assert_eq!(l.enter_time(), 2000);
                assert_eq!(l.prev_activity(), None);
                assert_eq!(l.next_activity(), Some(ActivityId(1)));
                assert_eq!(l.num_contacts(), 2);
                let contacts: Vec<_> = l.contacts().collect();
                assert_eq!(contacts, vec![contact(5, 0, 0, 600), contact(6, 2, 120, 480)]);
            }
            other => panic!("expected leave, got {other:?}"),
        }

        match it.next() {
            Some(EventRef::Enter(e)) => {
                assert_eq!(e.person, PersonId(3));
                assert_eq!(e.container, ContainerId(3));
                assert_eq!(e.activity, ActivityId(2));
                assert_eq!(e.time, 3000);
            }
            other => panic!("expected enter, got {other:?}"),
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn owned_events_roundtrip_field_for_field() {
        let events = scenario_a();
        assert_eq!(roundtrip(&events).to_events(), events);
    }

    #[test]
    fn contact_counts_match_declared_counts() {
        let mut events = Vec::new();
        for i in 0..20u32 {
            let contacts = (0..i % 5).map(|k| contact(100 + k, 1, k * 10, 60 + k)).collect();
            events.push(EpisimEvent::Leave(LeaveRecord {
                person: PersonId(i),
                container: ContainerId(i % 3),
                activity: ActivityId(1),
                prev_activity: Some(ActivityId(0)),
                next_activity: None,
                time: 5000 + i,
                enter_time: 100,
                contacts,
            }));
        }
        let graph = roundtrip(&events);
        for (e, original) in graph.iter().zip(&events) {
            let (EventRef::Leave(l), EpisimEvent::Leave(o)) = (e, original) else {
                panic!("kind changed");
            };
            assert_eq!(l.num_contacts(), o.contacts.len());
            assert_eq!(l.contacts().count(), o.contacts.len());
            for (i, c) in o.contacts.iter().enumerate() {
                assert_eq!(l.contact(i), *c);
            }
        }
    }

    #[test]
    fn week_long_values_roundtrip_exactly() {
        let events = vec![EpisimEvent::Leave(LeaveRecord {
            person: PersonId(1),
            container: ContainerId(2),
            activity: ActivityId(3),
            prev_activity: None,
            next_activity: None,
            time: 90_000,
            enter_time: 0,
            contacts: vec![contact(2, 3, MAX_JOINT_TIME, MAX_JOINT_TIME), contact(3, 3, 1, 3)],
        })];
        assert_eq!(roundtrip(&events).to_events(), events);
    }

    #[test]
    fn construct_rejects_duration_beyond_a_week() {
        let events = vec![EpisimEvent::Leave(LeaveRecord {
            person: PersonId(1),
            container: ContainerId(2),
            activity: ActivityId(0),
            prev_activity: None,
            next_activity: None,
            time: 10,
            enter_time: 0,
            contacts: vec![contact(2, 0, 0, MAX_JOINT_TIME + 1)],
        })];
        assert!(matches!(ContactGraph::construct(&events, &dict()), Err(GraphError::Corrupt(_))));
    }

    #[test]
    fn construct_rejects_unknown_activity() {
        let events = vec![EpisimEvent::Enter(EnterEvent {
            person: PersonId(0),
            container: ContainerId(0),
            activity: ActivityId(9),
            time: 0,
        })];
        assert!(matches!(ContactGraph::construct(&events, &dict()), Err(GraphError::Corrupt(_))));
    }

    #[test]
    fn read_rejects_truncated_body() {
        let graph = ContactGraph::construct(&scenario_a(), &dict()).unwrap();
        let mut buf = Vec::new();
        graph.write(&mut buf).unwrap();
        buf.truncate(buf.len() - 3);
        let err = ContactGraph::read(&mut buf.as_slice(), &dict()).unwrap_err();
        assert!(matches!(err, GraphError::SizeMismatch { actual, expected } if actual + 3 == expected));
    }

    #[test]
    fn read_rejects_trailing_bytes() {
        let graph = ContactGraph::construct(&scenario_a(), &dict()).unwrap();
        let mut buf = Vec::new();
        graph.write(&mut buf).unwrap();
        buf.push(0);
        assert!(matches!(
            ContactGraph::read(&mut buf.as_slice(), &dict()),
            Err(GraphError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn read_rejects_oversized_header_without_allocating_it() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&i32::MAX.to_le_bytes());
        buf.extend_from_slice(&i32::MAX.to_le_bytes());
        buf.extend_from_slice(&[0u8; 10]);
        let err = ContactGraph::read(&mut buf.as_slice(), &dict()).unwrap_err();
        assert!(matches!(err, GraphError::SizeMismatch { actual: 10, .. }));
    }

    #[test]
    fn read_reports_full_length_of_trailing_bytes() {
        let graph = ContactGraph::construct(&scenario_a(), &dict()).unwrap();
        let mut buf = Vec::new();
        graph.write(&mut buf).unwrap();
        let expected = (buf.len() - 8) as u64;
        buf.extend_from_slice(&[0u8; 5]);
        let err = ContactGraph::read(&mut buf.as_slice(), &dict()).unwrap_err();
        assert!(matches!(err, GraphError::SizeMismatch { actual, .. } if actual == expected + 5));
    }

    #[test]
    fn read_rejects_truncated_header() {
        let buf = [1u8, 0, 0];
        assert!(matches!(ContactGraph::read(&mut buf.as_slice(), &dict()), Err(GraphError::Io(_))));
    }

    #[test]
    fn read_rejects_unknown_tag() {
        let graph = ContactGraph::construct(&scenario_a(), &dict()).unwrap();
        let mut buf = Vec::new();
        graph.write(&mut buf).unwrap();
        buf[HEADER_SIZE + EVENT_SIZE] = 7;
        assert!(matches!(
            ContactGraph::read(&mut buf.as_slice(), &dict()),
            Err(GraphError::UnknownEventType(7))
        ));
    }

    #[test]
    fn read_rejects_out_of_range_duration() {
        let graph = ContactGraph::construct(&scenario_a(), &dict()).unwrap();
        let mut buf = Vec::new();
        graph.write(&mut buf).unwrap();
        // duration field of the first contact record
        let at = HEADER_SIZE + 2 * EVENT_SIZE + 8;
        buf[at..at + 4].copy_from_slice(&((MAX_JOINT_TIME + 10) << 2).to_le_bytes());
        assert!(matches!(ContactGraph::read(&mut buf.as_slice(), &dict()), Err(GraphError::Corrupt(_))));
    }

    #[test]
    fn read_rejects_contact_run_outside_table() {
        let graph = ContactGraph::construct(&scenario_a(), &dict()).unwrap();
        let mut buf = Vec::new();
        graph.write(&mut buf).unwrap();
        // contact index of the leave record
        let at = HEADER_SIZE + 20;
        buf[at..at + 4].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(ContactGraph::read(&mut buf.as_slice(), &dict()), Err(GraphError::Corrupt(_))));
    }

    #[test]
    fn read_checks_activities_against_dictionary() {
        let graph = ContactGraph::construct(&scenario_a(), &dict()).unwrap();
        let mut buf = Vec::new();
        graph.write(&mut buf).unwrap();
        let small = ActivityDictionary::new(vec![InfectionParams::new("tr", 1.0)]).unwrap();
        assert!(matches!(ContactGraph::read(&mut buf.as_slice(), &small), Err(GraphError::Corrupt(_))));
    }

    #[test]
    fn empty_graph() {
        let graph = roundtrip(&[]);
        assert_eq!(graph.num_events(), 0);
        assert!(graph.iter().next().is_none());
    }

    #[test]
    fn graph_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ContactGraph>();

        let graph = std::sync::Arc::new(ContactGraph::construct(&scenario_a(), &dict()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let g = graph.clone();
                std::thread::spawn(move || g.iter().count())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 2);
        }
    }
}

// ── Archive ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod archive {
    use std::sync::Arc;

    use super::*;
    use crate::archive::GraphArchive;
    use crate::codec::ContactGraph;
    use crate::error::GraphError;
    use ep_core::{ContainerInfo, ContainerStats, DayOfWeek};

    fn archive() -> GraphArchive {
        let containers = vec![
            ContainerInfo::facility("home_1").with_stats(ContainerStats {
                max_group_size: 4,
                total_users: 9,
                typical_capacity: 4,
                num_spaces: 1.0,
            }),
            ContainerInfo::vehicle("bus_7").with_stats(ContainerStats {
                max_group_size: 30,
                total_users: 200,
                typical_capacity: 150,
                num_spaces: 1.0,
            }),
        ];
        let persons = vec!["alice".to_string(), "bob".to_string()];
        let mut a = GraphArchive::new(persons, containers, Arc::new(dict()));
        let graph = Arc::new(ContactGraph::construct(&scenario_a(), &dict()).unwrap());
        a.set_day(DayOfWeek::Monday, graph.clone());
        a.set_day(DayOfWeek::Saturday, graph);
        a
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.tar.lz4");
        let written = archive();
        written.write_to_path(&path).unwrap();
        assert!(path.is_file());

        let read = GraphArchive::read_from_path(&path, &params()).unwrap();
        assert_eq!(read.persons, written.persons);
        assert_eq!(read.containers, written.containers);
        assert_eq!(read.dictionary.names(), written.dictionary.names());
        assert_eq!(
            read.stored_days().collect::<Vec<_>>(),
            vec![DayOfWeek::Monday, DayOfWeek::Saturday]
        );
        let monday = read.stored_day(DayOfWeek::Monday).unwrap();
        assert_eq!(monday.to_events(), scenario_a());
    }

    #[test]
    fn missing_days_fall_back_to_earlier_day() {
        let a = archive();
        assert_eq!(a.for_day(DayOfWeek::Friday).map(|(d, _)| d), Some(DayOfWeek::Monday));
        assert_eq!(a.for_day(DayOfWeek::Sunday).map(|(d, _)| d), Some(DayOfWeek::Saturday));
        assert_eq!(a.for_day(DayOfWeek::Monday).map(|(d, _)| d), Some(DayOfWeek::Monday));
    }

    #[test]
    fn fallback_wraps_around_the_week() {
        let mut a = GraphArchive::new(Vec::new(), Vec::new(), Arc::new(dict()));
        assert!(a.for_day(DayOfWeek::Monday).is_none());
        a.set_day(DayOfWeek::Thursday, Arc::new(ContactGraph::construct(&[], &dict()).unwrap()));
        assert_eq!(a.for_day(DayOfWeek::Tuesday).map(|(d, _)| d), Some(DayOfWeek::Thursday));
    }

    #[test]
    fn dictionary_is_resolved_by_name_not_position() {
        let buf = archive().write_to(Vec::new()).unwrap();
        let mut reordered = params();
        reordered.reverse();
        let read = GraphArchive::read_from(buf.as_slice(), &reordered).unwrap();
        assert_eq!(read.dictionary.names(), vec!["home", "work", "leisure", "tr"]);
    }

    #[test]
    fn unknown_activity_name_fails() {
        let buf = archive().write_to(Vec::new()).unwrap();
        let partial = vec![InfectionParams::new("home", 1.0), InfectionParams::new("tr", 1.0)];
        assert!(matches!(
            GraphArchive::read_from(buf.as_slice(), &partial),
            Err(GraphError::Core(_))
        ));
    }

    #[test]
    fn garbage_input_fails() {
        let garbage = vec![0x42u8; 64];
        assert!(GraphArchive::read_from(garbage.as_slice(), &params()).is_err());
    }

    #[test]
    fn metadata_with_oversized_counts_fails_cleanly() {
        use crate::archive::{decode_activities, decode_containers, decode_persons};

        let huge = u32::MAX.to_le_bytes();
        assert!(matches!(decode_persons(&huge), Err(GraphError::Corrupt(_))));
        assert!(matches!(decode_containers(&huge), Err(GraphError::Corrupt(_))));
        assert!(matches!(decode_activities(&huge), Err(GraphError::Corrupt(_))));

        // One real record behind a count that promises far more.
        let mut buf = huge.to_vec();
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.push(b'a');
        assert!(matches!(decode_persons(&buf), Err(GraphError::Corrupt(_))));
    }
}
