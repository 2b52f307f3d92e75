//! Compressed on-disk container for a week of contact graphs.
//!
//! An archive is a tar stream inside an LZ4 frame with independent blocks.
//! Entries, in write order:
//!
//! | Entry        | Payload                                                        |
//! |--------------|----------------------------------------------------------------|
//! | `persons`    | `u32` count, then (`u32` index, string id)                     |
//! | `container`  | `u32` count, then (`u32` index, name, vehicle flag, stats)      |
//! | `activities` | `u32` count, then activity group names in index order          |
//! | `MONDAY`…    | one [`ContactGraph`] per stored weekday                        |
//!
//! Strings are `u32`-length-prefixed UTF-8; all integers are little-endian.
//! Weekdays may be omitted; [`GraphArchive::for_day`] then falls back to the
//! nearest earlier stored weekday.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use ep_core::{ActivityDictionary, ContainerInfo, ContainerStats, DayOfWeek, InfectionParams};
use log::{info, warn};
use lz4_flex::frame::{BlockMode, BlockSize, FrameDecoder, FrameEncoder, FrameInfo};

use crate::codec::ContactGraph;
use crate::error::{GraphError, GraphResult};

pub const PERSONS_ENTRY: &str = "persons";
pub const CONTAINER_ENTRY: &str = "container";
pub const ACTIVITIES_ENTRY: &str = "activities";

/// Everything needed to replay a week without the original mobility data.
#[derive(Clone, Debug)]
pub struct GraphArchive {
    /// External person ids, indexed by `PersonId`.
    pub persons: Vec<String>,
    /// Containers, indexed by `ContainerId`.
    pub containers: Vec<ContainerInfo>,
    pub dictionary: Arc<ActivityDictionary>,
    days: [Option<Arc<ContactGraph>>; 7],
}

impl GraphArchive {
    pub fn new(persons: Vec<String>, containers: Vec<ContainerInfo>, dictionary: Arc<ActivityDictionary>) -> Self {
        GraphArchive { persons, containers, dictionary, days: Default::default() }
    }

    pub fn set_day(&mut self, day: DayOfWeek, graph: Arc<ContactGraph>) {
        self.days[day.index()] = Some(graph);
    }

    /// The graph stored under exactly `day`.
    pub fn stored_day(&self, day: DayOfWeek) -> Option<&Arc<ContactGraph>> {
        self.days[day.index()].as_ref()
    }

    /// Weekdays with a stored graph.
    pub fn stored_days(&self) -> impl Iterator<Item = DayOfWeek> + '_ {
        DayOfWeek::ALL.into_iter().filter(|d| self.days[d.index()].is_some())
    }

    /// Graph for `day`, or for the nearest earlier stored weekday.  Returns
    /// the weekday actually used.
    pub fn for_day(&self, day: DayOfWeek) -> Option<(DayOfWeek, &Arc<ContactGraph>)> {
        let mut d = day;
        for _ in 0..7 {
            if let Some(g) = &self.days[d.index()] {
                return Some((d, g));
            }
            d = d.previous();
        }
        None
    }

    // ── Writing ───────────────────────────────────────────────────────────

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> GraphResult<()> {
        let file = File::create(path.as_ref())?;
        let mut w = self.write_to(BufWriter::new(file))?;
        w.flush()?;
        info!("wrote graph archive {}", path.as_ref().display());
        Ok(())
    }

    /// Write the archive and hand back the underlying writer.
    pub fn write_to<W: Write>(&self, sink: W) -> GraphResult<W> {
        let frame = FrameInfo::new()
            .block_mode(BlockMode::Independent)
            .block_size(BlockSize::Max4MB);
        let encoder = FrameEncoder::with_frame_info(frame, sink);
        let mut tar = tar::Builder::new(encoder);

        append(&mut tar, PERSONS_ENTRY, &encode_persons(&self.persons))?;
        append(&mut tar, CONTAINER_ENTRY, &encode_containers(&self.containers))?;
        append(&mut tar, ACTIVITIES_ENTRY, &encode_activities(&self.dictionary))?;

        for day in DayOfWeek::ALL {
            if let Some(graph) = &self.days[day.index()] {
                let mut buf = Vec::with_capacity(graph.serialized_len());
                graph.write(&mut buf)?;
                info!(
                    "{day}: {} events, {} contacts, {} bytes",
                    graph.num_events(),
                    graph.num_contacts(),
                    buf.len()
                );
                append(&mut tar, day.as_str(), &buf)?;
            }
        }

        let encoder = tar.into_inner()?;
        let sink = encoder.finish().map_err(std::io::Error::from)?;
        Ok(sink)
    }

    // ── Reading ───────────────────────────────────────────────────────────

    pub fn read_from_path(path: impl AsRef<Path>, params: &[InfectionParams]) -> GraphResult<Self> {
        let file = File::open(path.as_ref())?;
        let archive = Self::read_from(BufReader::new(file), params)?;
        info!(
            "read graph archive {}: {} persons, {} containers, days {:?}",
            path.as_ref().display(),
            archive.persons.len(),
            archive.containers.len(),
            archive.stored_days().collect::<Vec<_>>()
        );
        Ok(archive)
    }

    /// Read an archive, resolving its stored activity names against
    /// `params`.
    pub fn read_from<R: Read>(source: R, params: &[InfectionParams]) -> GraphResult<Self> {
        let mut tar = tar::Archive::new(FrameDecoder::new(source));

        let mut persons = None;
        let mut containers = None;
        let mut dictionary: Option<Arc<ActivityDictionary>> = None;
        let mut days: [Option<Arc<ContactGraph>>; 7] = Default::default();

        for entry in tar.entries()? {
            let mut entry = entry?;
            let name = entry.path()?.to_string_lossy().into_owned();
            match name.as_str() {
                PERSONS_ENTRY => persons = Some(decode_persons(&read_all(&mut entry)?)?),
                CONTAINER_ENTRY => containers = Some(decode_containers(&read_all(&mut entry)?)?),
                ACTIVITIES_ENTRY => {
                    let names = decode_activities(&read_all(&mut entry)?)?;
                    dictionary = Some(Arc::new(ActivityDictionary::from_names(names.as_slice(), params)?));
                }
                other => match DayOfWeek::from_name(other) {
                    Some(day) => {
                        let dict = dictionary.as_deref().ok_or_else(|| {
                            GraphError::corrupt(format!("day entry '{other}' precedes '{ACTIVITIES_ENTRY}'"))
                        })?;
                        days[day.index()] = Some(Arc::new(ContactGraph::read(&mut entry, dict)?));
                    }
                    None => warn!("ignoring unknown archive entry '{other}'"),
                },
            }
        }

        Ok(GraphArchive {
            persons: persons.ok_or_else(|| GraphError::MissingEntry(PERSONS_ENTRY.into()))?,
            containers: containers.ok_or_else(|| GraphError::MissingEntry(CONTAINER_ENTRY.into()))?,
            dictionary: dictionary.ok_or_else(|| GraphError::MissingEntry(ACTIVITIES_ENTRY.into()))?,
            days,
        })
    }
}

fn append<W: Write>(tar: &mut tar::Builder<W>, name: &str, data: &[u8]) -> GraphResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, name, data)?;
    Ok(())
}

fn read_all<R: Read>(r: &mut R) -> GraphResult<Vec<u8>> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;
    Ok(buf)
}

// ── Metadata encoding ─────────────────────────────────────────────────────────

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    put_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_persons(persons: &[String]) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32(&mut buf, persons.len() as u32);
    for (i, id) in persons.iter().enumerate() {
        put_u32(&mut buf, i as u32);
        put_str(&mut buf, id);
    }
    buf
}

fn encode_containers(containers: &[ContainerInfo]) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32(&mut buf, containers.len() as u32);
    for (i, c) in containers.iter().enumerate() {
        put_u32(&mut buf, i as u32);
        put_str(&mut buf, &c.name);
        buf.push(c.is_vehicle as u8);
        put_i32(&mut buf, c.stats.max_group_size);
        put_i32(&mut buf, c.stats.total_users);
        put_i32(&mut buf, c.stats.typical_capacity);
        buf.extend_from_slice(&c.stats.num_spaces.to_le_bytes());
    }
    buf
}

fn encode_activities(dict: &ActivityDictionary) -> Vec<u8> {
    let names = dict.names();
    let mut buf = Vec::new();
    put_u32(&mut buf, names.len() as u32);
    for name in names {
        put_str(&mut buf, name);
    }
    buf
}

/// Bounds-checked reader over a metadata payload.
struct MetaReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> MetaReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        MetaReader { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> GraphResult<[u8; N]> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + N)
            .ok_or_else(|| GraphError::corrupt("truncated metadata entry"))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Capacity for `count` records of at least `min_len` bytes each,
    /// bounded by the bytes left so a corrupt count cannot over-allocate.
    fn capacity(&self, count: u32, min_len: usize) -> usize {
        (count as usize).min(self.remaining() / min_len)
    }

    fn u8(&mut self) -> GraphResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn u32(&mut self) -> GraphResult<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> GraphResult<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn f64(&mut self) -> GraphResult<f64> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    fn string(&mut self) -> GraphResult<String> {
        let len = self.u32()? as usize;
        let bytes = self
            .buf
            .get(self.pos..self.pos + len)
            .ok_or_else(|| GraphError::corrupt("truncated string in metadata entry"))?;
        self.pos += len;
        String::from_utf8(bytes.to_vec()).map_err(|e| GraphError::corrupt(format!("invalid UTF-8: {e}")))
    }

    fn finish(self) -> GraphResult<()> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(GraphError::corrupt(format!(
                "{} trailing bytes in metadata entry",
                self.buf.len() - self.pos
            )))
        }
    }
}

/// index + empty string
const PERSON_MIN_LEN: usize = 4 + 4;
/// index + empty name + is_vehicle + three i32 stats + num_spaces
const CONTAINER_MIN_LEN: usize = 4 + 4 + 1 + 3 * 4 + 8;

/// Place `(index, value)` pairs into a dense vector, requiring every index
/// in `0..count` exactly once.
fn densify<T>(what: &str, pairs: Vec<(u32, T)>) -> GraphResult<Vec<T>> {
    let n = pairs.len();
    let mut slots: Vec<Option<T>> = (0..n).map(|_| None).collect();
    for (i, v) in pairs {
        let slot = slots
            .get_mut(i as usize)
            .ok_or_else(|| GraphError::corrupt(format!("{what} index {i} out of range 0..{n}")))?;
        if slot.replace(v).is_some() {
            return Err(GraphError::corrupt(format!("{what} index {i} listed twice")));
        }
    }
    // With n pairs, n slots and no duplicates, every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

pub(crate) fn decode_persons(buf: &[u8]) -> GraphResult<Vec<String>> {
    let mut r = MetaReader::new(buf);
    let n = r.u32()?;
    let mut pairs = Vec::with_capacity(r.capacity(n, PERSON_MIN_LEN));
    for _ in 0..n {
        pairs.push((r.u32()?, r.string()?));
    }
    r.finish()?;
    densify("person", pairs)
}

pub(crate) fn decode_containers(buf: &[u8]) -> GraphResult<Vec<ContainerInfo>> {
    let mut r = MetaReader::new(buf);
    let n = r.u32()?;
    let mut pairs = Vec::with_capacity(r.capacity(n, CONTAINER_MIN_LEN));
    for _ in 0..n {
        let index = r.u32()?;
        let name = r.string()?;
        let is_vehicle = r.u8()? != 0;
        let stats = ContainerStats {
            max_group_size: r.i32()?,
            total_users: r.i32()?,
            typical_capacity: r.i32()?,
            num_spaces: r.f64()?,
        };
        pairs.push((index, ContainerInfo { name, is_vehicle, stats }));
    }
    r.finish()?;
    densify("container", pairs)
}

pub(crate) fn decode_activities(buf: &[u8]) -> GraphResult<Vec<String>> {
    let mut r = MetaReader::new(buf);
    let n = r.u32()?;
    let names = (0..n).map(|_| r.string()).collect::<GraphResult<Vec<_>>>()?;
    r.finish()?;
    Ok(names)
}
