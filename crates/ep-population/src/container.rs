//! Per-place and per-vehicle occupancy.

use ep_core::{ContainerId, ContainerInfo, ContainerStats, EpiError, EpiResult, PersonId};
use rustc_hash::FxHashMap;

use crate::PersonState;

/// Current occupants of one container and when each of them entered.
///
/// Occupants are kept in entry order.  A person appears at most once;
/// adding a present person or removing an absent one is an invariant
/// violation.
#[derive(Clone, Debug)]
pub struct ContainerState {
    id: ContainerId,
    is_vehicle: bool,
    occupants: Vec<PersonId>,
    enter_times: FxHashMap<PersonId, f64>,
    stats: Option<ContainerStats>,
}

impl ContainerState {
    pub fn new(id: ContainerId, is_vehicle: bool) -> Self {
        ContainerState {
            id,
            is_vehicle,
            occupants: Vec::new(),
            enter_times: FxHashMap::default(),
            stats: None,
        }
    }

    pub fn from_info(id: ContainerId, info: &ContainerInfo) -> Self {
        let mut c = Self::new(id, info.is_vehicle);
        c.stats = Some(info.stats);
        c
    }

    #[inline]
    pub fn id(&self) -> ContainerId {
        self.id
    }

    #[inline]
    pub fn is_vehicle(&self) -> bool {
        self.is_vehicle
    }

    #[inline]
    pub fn is_facility(&self) -> bool {
        !self.is_vehicle
    }

    pub fn add_person(&mut self, person: &mut PersonState, now: f64) -> EpiResult<()> {
        let pid = person.id();
        if self.enter_times.contains_key(&pid) {
            return Err(EpiError::invariant(format!("{pid} already in {}", self.id)));
        }
        if let Some(other) = person.current_container() {
            return Err(EpiError::invariant(format!(
                "{pid} entering {} while still in {other}",
                self.id
            )));
        }
        self.occupants.push(pid);
        self.enter_times.insert(pid, now);
        person.set_current_container(Some(self.id));
        Ok(())
    }

    /// Remove `person` and return their entry time.
    pub fn remove_person(&mut self, person: &mut PersonState) -> EpiResult<f64> {
        let pid = person.id();
        let entered = self
            .enter_times
            .remove(&pid)
            .ok_or_else(|| EpiError::invariant(format!("{pid} is not in {}", self.id)))?;
        if let Some(pos) = self.occupants.iter().position(|&p| p == pid) {
            self.occupants.remove(pos);
        }
        person.set_current_container(None);
        Ok(entered)
    }

    /// Empty the container and return who was inside, in entry order.
    /// Back-references on the persons are left to the caller.
    pub(crate) fn take_occupants(&mut self) -> Vec<PersonId> {
        self.enter_times.clear();
        std::mem::take(&mut self.occupants)
    }

    /// Entry time of `person`, or negative infinity if absent.
    #[inline]
    pub fn entering_time(&self, person: PersonId) -> f64 {
        self.enter_times.get(&person).copied().unwrap_or(f64::NEG_INFINITY)
    }

    #[inline]
    pub fn contains(&self, person: PersonId) -> bool {
        self.enter_times.contains_key(&person)
    }

    /// Occupants in entry order.
    #[inline]
    pub fn occupants(&self) -> &[PersonId] {
        &self.occupants
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Preprocessed statistics, or all-unknown defaults if never set.
    pub fn stats(&self) -> ContainerStats {
        self.stats.unwrap_or_default()
    }

    /// Set the statistics.  They are write-once.
    pub fn set_stats(&mut self, stats: ContainerStats) -> EpiResult<()> {
        if self.stats.is_some() {
            return Err(EpiError::invariant(format!("statistics of {} already set", self.id)));
        }
        self.stats = Some(stats);
        Ok(())
    }
}
