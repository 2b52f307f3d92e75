//! Fixed-width binary encoding of one day's container events.
//!
//! # Layout
//!
//! A graph owns two flat byte buffers, allocated once at their exact final
//! size and never resized:
//!
//! ```text
//! event record (26 bytes, little-endian)
//!   0  u8   tag            0 = enter, 1 = leave
//!   1  u32  person
//!   5  u32  container
//!   9  u8   activity
//!  10  u32  time           leave time for leave records
//!  14  u32  enter time     ┐
//!  18  u8   next activity  │ leave records only,
//!  19  u8   prev activity  │ zero for enter records
//!  20  u32  contact index  │
//!  24  u16  contact count  ┘
//!
//! contact record (13 bytes, little-endian)
//!   0  u32  person
//!   4  u32  offset << 2
//!   8  u32  duration << 2
//!  12  u8   activity
//! ```
//!
//! Offsets and durations keep their two low bits free; whole seconds up to
//! one week round-trip exactly.  Absent previous/next activities are stored
//! as `0xFF`.
//!
//! # Iteration
//!
//! [`ContactGraph::iter`] yields [`EventRef`]s that borrow the graph's
//! buffer directly: decoding a field reads a few bytes in place and nothing is
//! allocated per event.  Because the graph is immutable after construction,
//! any number of cursors (from any number of threads) may walk it at once.
//! The buffers are released when the graph is dropped.

use std::io::{self, Read, Write};

use ep_core::{ActivityDictionary, ActivityId, ContainerId, MAX_JOINT_TIME, PersonId};
use log::debug;

use crate::error::{GraphError, GraphResult};
use crate::event::{Contact, EnterEvent, EpisimEvent, EventView, LeaveEvent, LeaveRecord, LeaveView};

pub const EVENT_SIZE: usize = 26;
pub const CONTACT_SIZE: usize = 13;
pub const HEADER_SIZE: usize = 8;

const TAG_ENTER: u8 = 0;
const TAG_LEAVE: u8 = 1;

mod ev {
    pub const TAG: usize = 0;
    pub const PERSON: usize = 1;
    pub const CONTAINER: usize = 5;
    pub const ACTIVITY: usize = 9;
    pub const TIME: usize = 10;
    pub const ENTER_TIME: usize = 14;
    pub const NEXT: usize = 18;
    pub const PREV: usize = 19;
    pub const CONTACT_INDEX: usize = 20;
    pub const CONTACT_COUNT: usize = 24;
}

mod ct {
    pub const PERSON: usize = 0;
    pub const OFFSET: usize = 4;
    pub const DURATION: usize = 8;
    pub const ACTIVITY: usize = 12;
}

/// Low bits reserved in offset and duration fields.
const FLAG_BITS: u32 = 2;

// ── Byte helpers ──────────────────────────────────────────────────────────────

#[inline(always)]
fn get_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

#[inline(always)]
fn get_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[inline(always)]
fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

#[inline(always)]
fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

// ── ContactGraph ──────────────────────────────────────────────────────────────

/// One day of packed container events.
#[derive(Clone, PartialEq, Eq)]
pub struct ContactGraph {
    events: Box<[u8]>,
    contacts: Box<[u8]>,
}

impl std::fmt::Debug for ContactGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactGraph")
            .field("num_events", &self.num_events())
            .field("num_contacts", &self.num_contacts())
            .finish()
    }
}

impl ContactGraph {
    /// Pack `events` in order.
    ///
    /// Fails if any activity id is outside `dict`, if an offset or duration
    /// exceeds one week, or if a leave event has more than `u16::MAX`
    /// contacts.  Nothing is returned on failure, so a half-built graph can
    /// never escape.
    pub fn construct(events: &[EpisimEvent], dict: &ActivityDictionary) -> GraphResult<Self> {
        let num_contacts: usize = events
            .iter()
            .map(|e| match e {
                EpisimEvent::Leave(l) => l.contacts.len(),
                EpisimEvent::Enter(_) => 0,
            })
            .sum();

        if events.len() > i32::MAX as usize || num_contacts > i32::MAX as usize {
            return Err(GraphError::corrupt("graph exceeds 2^31 records"));
        }

        let mut ev_buf = vec![0u8; events.len() * EVENT_SIZE].into_boxed_slice();
        let mut ct_buf = vec![0u8; num_contacts * CONTACT_SIZE].into_boxed_slice();

        let mut next_contact = 0usize;
        for (i, event) in events.iter().enumerate() {
            let rec = &mut ev_buf[i * EVENT_SIZE..(i + 1) * EVENT_SIZE];
            match event {
                EpisimEvent::Enter(e) => {
                    check_activity(dict, e.activity)?;
                    rec[ev::TAG] = TAG_ENTER;
                    put_u32(rec, ev::PERSON, e.person.0);
                    put_u32(rec, ev::CONTAINER, e.container.0);
                    rec[ev::ACTIVITY] = e.activity.0;
                    put_u32(rec, ev::TIME, e.time);
                }
                EpisimEvent::Leave(l) => {
                    check_activity(dict, l.activity)?;
                    check_optional_activity(dict, l.prev_activity)?;
                    check_optional_activity(dict, l.next_activity)?;
                    let count = u16::try_from(l.contacts.len()).map_err(|_| {
                        GraphError::corrupt(format!(
                            "{} contacts on one leave event of {}",
                            l.contacts.len(),
                            l.person
                        ))
                    })?;

                    rec[ev::TAG] = TAG_LEAVE;
                    put_u32(rec, ev::PERSON, l.person.0);
                    put_u32(rec, ev::CONTAINER, l.container.0);
                    rec[ev::ACTIVITY] = l.activity.0;
                    put_u32(rec, ev::TIME, l.time);
                    put_u32(rec, ev::ENTER_TIME, l.enter_time);
                    rec[ev::NEXT] = ActivityId::from_option(l.next_activity).0;
                    rec[ev::PREV] = ActivityId::from_option(l.prev_activity).0;
                    put_u32(rec, ev::CONTACT_INDEX, next_contact as u32);
                    put_u16(rec, ev::CONTACT_COUNT, count);

                    for c in &l.contacts {
                        check_activity(dict, c.activity)?;
                        check_seconds("offset", c.offset)?;
                        check_seconds("duration", c.duration)?;
                        let crec = &mut ct_buf[next_contact * CONTACT_SIZE..(next_contact + 1) * CONTACT_SIZE];
                        put_u32(crec, ct::PERSON, c.person.0);
                        put_u32(crec, ct::OFFSET, c.offset << FLAG_BITS);
                        put_u32(crec, ct::DURATION, c.duration << FLAG_BITS);
                        crec[ct::ACTIVITY] = c.activity.0;
                        next_contact += 1;
                    }
                }
            }
        }

        Ok(ContactGraph { events: ev_buf, contacts: ct_buf })
    }

    /// Emit the header (`numEvents`, `numContacts` as little-endian `i32`)
    /// followed by both raw buffers.
    pub fn write<W: Write>(&self, sink: &mut W) -> GraphResult<()> {
        sink.write_all(&(self.num_events() as i32).to_le_bytes())?;
        sink.write_all(&(self.num_contacts() as i32).to_le_bytes())?;
        sink.write_all(&self.events)?;
        sink.write_all(&self.contacts)?;
        Ok(())
    }

    /// Inverse of [`write`](Self::write).
    ///
    /// Consumes `source` to its end.  Every record is validated here (byte
    /// length, tags, activity ids against `dict`, contact runs, offset and
    /// duration bounds) so iteration afterwards cannot fail.
    pub fn read<R: Read>(source: &mut R, dict: &ActivityDictionary) -> GraphResult<Self> {
        let mut header = [0u8; HEADER_SIZE];
        source.read_exact(&mut header)?;
        let num_events = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let num_contacts = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if num_events < 0 || num_contacts < 0 {
            return Err(GraphError::corrupt(format!(
                "negative record counts ({num_events} events, {num_contacts} contacts)"
            )));
        }

        let ev_len = num_events as usize * EVENT_SIZE;
        let ct_len = num_contacts as usize * CONTACT_SIZE;
        let expected = (ev_len + ct_len) as u64;

        // The header is untrusted: read at most one byte past the declared
        // size and let the buffer grow with what is actually there.
        let mut body = Vec::new();
        (&mut *source).take(expected + 1).read_to_end(&mut body)?;
        if body.len() as u64 > expected {
            let trailing = io::copy(source, &mut io::sink())?;
            return Err(GraphError::SizeMismatch { expected, actual: body.len() as u64 + trailing });
        }
        if body.len() as u64 != expected {
            return Err(GraphError::SizeMismatch { expected, actual: body.len() as u64 });
        }

        let contacts = body.split_off(ev_len).into_boxed_slice();
        let graph = ContactGraph { events: body.into_boxed_slice(), contacts };
        graph.validate(dict)?;
        debug!(
            "read contact graph: {} events, {} contacts",
            graph.num_events(),
            graph.num_contacts()
        );
        Ok(graph)
    }

    fn validate(&self, dict: &ActivityDictionary) -> GraphResult<()> {
        let num_contacts = self.num_contacts();
        for rec in self.events.chunks_exact(EVENT_SIZE) {
            match rec[ev::TAG] {
                TAG_ENTER => check_activity(dict, ActivityId(rec[ev::ACTIVITY]))?,
                TAG_LEAVE => {
                    check_activity(dict, ActivityId(rec[ev::ACTIVITY]))?;
                    check_optional_activity(dict, ActivityId(rec[ev::NEXT]).get())?;
                    check_optional_activity(dict, ActivityId(rec[ev::PREV]).get())?;
                    let start = get_u32(rec, ev::CONTACT_INDEX) as usize;
                    let end = start + get_u16(rec, ev::CONTACT_COUNT) as usize;
                    if end > num_contacts {
                        return Err(GraphError::corrupt(format!(
                            "contact run {start}..{end} outside table of {num_contacts}"
                        )));
                    }
                }
                other => return Err(GraphError::UnknownEventType(other)),
            }
        }
        for rec in self.contacts.chunks_exact(CONTACT_SIZE) {
            check_activity(dict, ActivityId(rec[ct::ACTIVITY]))?;
            check_seconds("offset", get_u32(rec, ct::OFFSET) >> FLAG_BITS)?;
            check_seconds("duration", get_u32(rec, ct::DURATION) >> FLAG_BITS)?;
        }
        Ok(())
    }

    #[inline]
    pub fn num_events(&self) -> usize {
        self.events.len() / EVENT_SIZE
    }

    #[inline]
    pub fn num_contacts(&self) -> usize {
        self.contacts.len() / CONTACT_SIZE
    }

    /// Bytes held by both record buffers.
    pub fn size_bytes(&self) -> usize {
        self.events.len() + self.contacts.len()
    }

    /// Bytes produced by [`write`](Self::write).
    pub fn serialized_len(&self) -> usize {
        HEADER_SIZE + self.size_bytes()
    }

    /// Cursor over events in stored order.
    pub fn iter(&self) -> Events<'_> {
        Events { graph: self, pos: 0 }
    }

    /// Decode every event into owned records.
    pub fn to_events(&self) -> Vec<EpisimEvent> {
        self.iter().map(|e| e.view().to_owned_event()).collect()
    }

    fn decode(&self, index: usize) -> EventRef<'_> {
        let rec = &self.events[index * EVENT_SIZE..(index + 1) * EVENT_SIZE];
        if rec[ev::TAG] == TAG_ENTER {
            EventRef::Enter(EnterEvent {
                person: PersonId(get_u32(rec, ev::PERSON)),
                container: ContainerId(get_u32(rec, ev::CONTAINER)),
                activity: ActivityId(rec[ev::ACTIVITY]),
                time: get_u32(rec, ev::TIME),
            })
        } else {
            let start = get_u32(rec, ev::CONTACT_INDEX) as usize;
            let end = start + get_u16(rec, ev::CONTACT_COUNT) as usize;
            EventRef::Leave(LeaveRef {
                rec,
                contacts: &self.contacts[start * CONTACT_SIZE..end * CONTACT_SIZE],
            })
        }
    }
}

impl<'g> IntoIterator for &'g ContactGraph {
    type Item = EventRef<'g>;
    type IntoIter = Events<'g>;

    fn into_iter(self) -> Events<'g> {
        self.iter()
    }
}

fn check_activity(dict: &ActivityDictionary, id: ActivityId) -> GraphResult<()> {
    if dict.contains(id) {
        Ok(())
    } else {
        Err(GraphError::corrupt(format!(
            "activity index {} outside dictionary of {}",
            id.0,
            dict.len()
        )))
    }
}

fn check_optional_activity(dict: &ActivityDictionary, id: Option<ActivityId>) -> GraphResult<()> {
    id.map_or(Ok(()), |id| check_activity(dict, id))
}

fn check_seconds(what: &str, v: u32) -> GraphResult<()> {
    if v > MAX_JOINT_TIME {
        Err(GraphError::corrupt(format!("{what} of {v}s exceeds one week")))
    } else {
        Ok(())
    }
}

// ── Cursors ───────────────────────────────────────────────────────────────────

/// Event cursor over a [`ContactGraph`].
#[derive(Clone, Debug)]
pub struct Events<'g> {
    graph: &'g ContactGraph,
    pos: usize,
}

impl<'g> Iterator for Events<'g> {
    type Item = EventRef<'g>;

    #[inline]
    fn next(&mut self) -> Option<EventRef<'g>> {
        if self.pos >= self.graph.num_events() {
            return None;
        }
        let e = self.graph.decode(self.pos);
        self.pos += 1;
        Some(e)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.graph.num_events() - self.pos;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Events<'_> {}

/// An event decoded in place from a graph buffer.
#[derive(Copy, Clone, Debug)]
pub enum EventRef<'g> {
    Enter(EnterEvent),
    Leave(LeaveRef<'g>),
}

impl<'g> EventRef<'g> {
    #[inline]
    pub fn view(self) -> EventView<'g> {
        match self {
            EventRef::Enter(e) => EventView::Enter(e),
            EventRef::Leave(l) => EventView::Leave(LeaveView::Packed(l)),
        }
    }
}

/// A packed leave record and the contact run it points to.
#[derive(Copy, Clone)]
pub struct LeaveRef<'g> {
    rec: &'g [u8],
    contacts: &'g [u8],
}

impl std::fmt::Debug for LeaveRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaveRef")
            .field("person", &self.person())
            .field("container", &self.container())
            .field("time", &self.time())
            .field("num_contacts", &self.num_contacts())
            .finish()
    }
}

impl<'g> LeaveRef<'g> {
    /// Contacts of this event in stored order.
    pub fn contacts(&self) -> Contacts<'g> {
        Contacts { chunks: self.contacts.chunks_exact(CONTACT_SIZE) }
    }

    pub fn to_record(&self) -> LeaveRecord {
        LeaveRecord::from_view(self)
    }
}

#[inline(always)]
fn decode_contact(rec: &[u8]) -> Contact {
    Contact {
        person: PersonId(get_u32(rec, ct::PERSON)),
        activity: ActivityId(rec[ct::ACTIVITY]),
        offset: get_u32(rec, ct::OFFSET) >> FLAG_BITS,
        duration: get_u32(rec, ct::DURATION) >> FLAG_BITS,
    }
}

impl LeaveEvent for LeaveRef<'_> {
    #[inline]
    fn person(&self) -> PersonId {
        PersonId(get_u32(self.rec, ev::PERSON))
    }

    #[inline]
    fn container(&self) -> ContainerId {
        ContainerId(get_u32(self.rec, ev::CONTAINER))
    }

    #[inline]
    fn activity(&self) -> ActivityId {
        ActivityId(self.rec[ev::ACTIVITY])
    }

    #[inline]
    fn prev_activity(&self) -> Option<ActivityId> {
        ActivityId(self.rec[ev::PREV]).get()
    }

    #[inline]
    fn next_activity(&self) -> Option<ActivityId> {
        ActivityId(self.rec[ev::NEXT]).get()
    }

    #[inline]
    fn time(&self) -> u32 {
        get_u32(self.rec, ev::TIME)
    }

    #[inline]
    fn enter_time(&self) -> u32 {
        get_u32(self.rec, ev::ENTER_TIME)
    }

    #[inline]
    fn num_contacts(&self) -> usize {
        self.contacts.len() / CONTACT_SIZE
    }

    #[inline]
    fn contact(&self, index: usize) -> Contact {
        decode_contact(&self.contacts[index * CONTACT_SIZE..(index + 1) * CONTACT_SIZE])
    }
}

/// Contact cursor of a [`LeaveRef`].
#[derive(Clone, Debug)]
pub struct Contacts<'g> {
    chunks: std::slice::ChunksExact<'g, u8>,
}

impl Iterator for Contacts<'_> {
    type Item = Contact;

    #[inline]
    fn next(&mut self) -> Option<Contact> {
        self.chunks.next().map(decode_contact)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Contacts<'_> {}
