//! Container events: owned records, the [`LeaveEvent`] view trait, and the
//! borrowed [`EventView`] that providers hand to the simulation.
//!
//! Contact models only ever see `&dyn LeaveEvent`, so the same model code
//! runs against packed graph records, owned records, or a live view over a
//! container's current occupants.

use ep_core::{ActivityId, ContainerId, PersonId};

use crate::codec::LeaveRef;

// ── Plain records ─────────────────────────────────────────────────────────────

/// A person entering a container.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EnterEvent {
    pub person: PersonId,
    pub container: ContainerId,
    pub activity: ActivityId,
    /// Seconds of day.
    pub time: u32,
}

/// A co-occupant a leaving person could have interacted with.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Contact {
    pub person: PersonId,
    /// Activity the other person was performing.
    pub activity: ActivityId,
    /// Seconds after the leaving person's entry at which the contact began.
    pub offset: u32,
    /// Seconds of overlap.
    pub duration: u32,
}

// ── LeaveEvent ────────────────────────────────────────────────────────────────

/// Read access to a "leaves container" event and its contacts.
pub trait LeaveEvent {
    fn person(&self) -> PersonId;
    fn container(&self) -> ContainerId;
    fn activity(&self) -> ActivityId;
    fn prev_activity(&self) -> Option<ActivityId>;
    fn next_activity(&self) -> Option<ActivityId>;
    /// Leave time, seconds of day.
    fn time(&self) -> u32;
    fn enter_time(&self) -> u32;
    fn num_contacts(&self) -> usize;

    /// The `index`-th contact.
    ///
    /// # Panics
    /// Panics if `index >= self.num_contacts()`.
    fn contact(&self, index: usize) -> Contact;
}

/// Owned leave record.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LeaveRecord {
    pub person: PersonId,
    pub container: ContainerId,
    pub activity: ActivityId,
    pub prev_activity: Option<ActivityId>,
    pub next_activity: Option<ActivityId>,
    pub time: u32,
    pub enter_time: u32,
    pub contacts: Vec<Contact>,
}

impl LeaveRecord {
    /// Copy any leave view into an owned record.
    pub fn from_view(view: &dyn LeaveEvent) -> LeaveRecord {
        LeaveRecord {
            person: view.person(),
            container: view.container(),
            activity: view.activity(),
            prev_activity: view.prev_activity(),
            next_activity: view.next_activity(),
            time: view.time(),
            enter_time: view.enter_time(),
            contacts: (0..view.num_contacts()).map(|i| view.contact(i)).collect(),
        }
    }
}

impl LeaveEvent for LeaveRecord {
    fn person(&self) -> PersonId { self.person }
    fn container(&self) -> ContainerId { self.container }
    fn activity(&self) -> ActivityId { self.activity }
    fn prev_activity(&self) -> Option<ActivityId> { self.prev_activity }
    fn next_activity(&self) -> Option<ActivityId> { self.next_activity }
    fn time(&self) -> u32 { self.time }
    fn enter_time(&self) -> u32 { self.enter_time }
    fn num_contacts(&self) -> usize { self.contacts.len() }
    fn contact(&self, index: usize) -> Contact { self.contacts[index] }
}

/// Owned event, used to construct graphs and to replay in-memory days.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EpisimEvent {
    Enter(EnterEvent),
    Leave(LeaveRecord),
}

impl EpisimEvent {
    pub fn person(&self) -> PersonId {
        match self {
            EpisimEvent::Enter(e) => e.person,
            EpisimEvent::Leave(l) => l.person,
        }
    }

    pub fn container(&self) -> ContainerId {
        match self {
            EpisimEvent::Enter(e) => e.container,
            EpisimEvent::Leave(l) => l.container,
        }
    }

    pub fn time(&self) -> u32 {
        match self {
            EpisimEvent::Enter(e) => e.time,
            EpisimEvent::Leave(l) => l.time,
        }
    }

    pub fn view(&self) -> EventView<'_> {
        match self {
            EpisimEvent::Enter(e) => EventView::Enter(*e),
            EpisimEvent::Leave(l) => EventView::Leave(LeaveView::Owned(l)),
        }
    }
}

// ── Borrowed views ────────────────────────────────────────────────────────────

/// A leave event borrowed from either a packed graph or an owned record.
#[derive(Copy, Clone, Debug)]
pub enum LeaveView<'a> {
    Packed(LeaveRef<'a>),
    Owned(&'a LeaveRecord),
}

macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            LeaveView::Packed(l) => l.$method($($arg),*),
            LeaveView::Owned(l) => l.$method($($arg),*),
        }
    };
}

impl LeaveEvent for LeaveView<'_> {
    fn person(&self) -> PersonId { delegate!(self, person) }
    fn container(&self) -> ContainerId { delegate!(self, container) }
    fn activity(&self) -> ActivityId { delegate!(self, activity) }
    fn prev_activity(&self) -> Option<ActivityId> { delegate!(self, prev_activity) }
    fn next_activity(&self) -> Option<ActivityId> { delegate!(self, next_activity) }
    fn time(&self) -> u32 { delegate!(self, time) }
    fn enter_time(&self) -> u32 { delegate!(self, enter_time) }
    fn num_contacts(&self) -> usize { delegate!(self, num_contacts) }
    fn contact(&self, index: usize) -> Contact { delegate!(self, contact, index) }
}

/// One event of a day, as produced by an event provider.
#[derive(Copy, Clone, Debug)]
pub enum EventView<'a> {
    Enter(EnterEvent),
    Leave(LeaveView<'a>),
}

impl EventView<'_> {
    pub fn time(&self) -> u32 {
        match self {
            EventView::Enter(e) => e.time,
            EventView::Leave(l) => l.time(),
        }
    }

    pub fn to_owned_event(&self) -> EpisimEvent {
        match self {
            EventView::Enter(e) => EpisimEvent::Enter(*e),
            EventView::Leave(l) => EpisimEvent::Leave(LeaveRecord::from_view(l)),
        }
    }
}
