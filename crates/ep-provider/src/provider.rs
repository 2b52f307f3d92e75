//! The [`EventProvider`] trait and the per-day event iterator.

use std::slice;
use std::sync::Arc;

use ep_core::{ActivityDictionary, ActivityId, ContainerId, ContainerInfo, DayOfWeek};
use ep_graph::{EpisimEvent, EventRef, EventView, Events, LeaveEvent};

use crate::ProviderResult;

/// Container name of the home activity group.
pub const HOME: &str = "home";

/// Source of the persons, containers and daily events of a run.
///
/// A provider is initialized once and then read concurrently: parallel
/// runs share one provider by reference, so every query takes `&self`.
pub trait EventProvider: Send + Sync {
    /// Build whatever the queries need.  Calling it again is a no-op.
    fn init(&mut self) -> ProviderResult<()>;

    /// Called at the start of every iteration.
    fn reset(&self, _iteration: u32) {}

    /// External person ids, indexed by `PersonId`.
    fn persons(&self) -> &[String];

    /// Containers with their statistics, indexed by `ContainerId`.
    fn containers(&self) -> &[ContainerInfo];

    /// Activity dictionary every event's activity ids refer to.
    fn dictionary(&self) -> &Arc<ActivityDictionary>;

    /// The events of `day` in replay order.
    fn for_day(&self, day: DayOfWeek) -> ProviderResult<DayEvents<'_>>;

    /// Facility activities of every person on `day`, in leave order.
    /// Vehicle legs are not part of a trajectory.
    fn trajectories(&self, day: DayOfWeek) -> ProviderResult<Vec<Vec<ActivityId>>> {
        let containers = self.containers();
        let mut trajectories = vec![Vec::new(); self.persons().len()];
        for event in self.for_day(day)? {
            let EventView::Leave(leave) = event else { continue };
            let is_vehicle = containers.get(leave.container().index()).is_some_and(|c| c.is_vehicle);
            if is_vehicle {
                continue;
            }
            if let Some(t) = trajectories.get_mut(leave.person().index()) {
                t.push(leave.activity());
            }
        }
        Ok(trajectories)
    }

    /// Home container of every person: the first container in which the
    /// person performs a `home` activity during the week.
    fn homes(&self) -> ProviderResult<Vec<Option<ContainerId>>> {
        let mut homes = vec![None; self.persons().len()];
        let Some(home) = self.dictionary().id_of(HOME) else {
            return Ok(homes);
        };
        for day in DayOfWeek::ALL {
            for event in self.for_day(day)? {
                let (person, container, activity) = match event {
                    EventView::Enter(e) => (e.person, e.container, e.activity),
                    EventView::Leave(l) => (l.person(), l.container(), l.activity()),
                };
                if activity == home {
                    if let Some(slot) = homes.get_mut(person.index()) {
                        slot.get_or_insert(container);
                    }
                }
            }
        }
        Ok(homes)
    }
}

/// Iterator over one day of events, borrowed from the provider.
///
/// Neither variant allocates per event.
#[derive(Clone, Debug)]
pub enum DayEvents<'a> {
    Packed(Events<'a>),
    Owned(slice::Iter<'a, EpisimEvent>),
}

impl<'a> Iterator for DayEvents<'a> {
    type Item = EventView<'a>;

    #[inline]
    fn next(&mut self) -> Option<EventView<'a>> {
        match self {
            DayEvents::Packed(it) => it.next().map(EventRef::view),
            DayEvents::Owned(it) => it.next().map(EpisimEvent::view),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            DayEvents::Packed(it) => it.size_hint(),
            DayEvents::Owned(it) => it.size_hint(),
        }
    }
}

impl ExactSizeIterator for DayEvents<'_> {}
