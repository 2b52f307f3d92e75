//! `Population`: the arena owning every person and container of a run.
//!
//! # Why one struct with two `Vec`s?
//!
//! Entering or leaving touches a person *and* a container at once, and an
//! infection touches two persons at once.  Keeping persons and containers in
//! sibling fields lets those operations borrow disjoint fields (or disjoint
//! halves of the person `Vec`) without any interior mutability.

use ep_core::{ContainerId, EpiError, EpiResult, PersonId};

use crate::{ContainerState, PersonState};

/// All persons and containers of a run, indexed by their ids.
#[derive(Clone, Debug, Default)]
pub struct Population {
    persons: Vec<PersonState>,
    containers: Vec<ContainerState>,
}

impl Population {
    /// Wrap pre-built state.  Element `i` of each `Vec` must carry id `i`.
    pub fn new(persons: Vec<PersonState>, containers: Vec<ContainerState>) -> EpiResult<Self> {
        if let Some((i, p)) = persons.iter().enumerate().find(|(i, p)| p.id().index() != *i) {
            return Err(EpiError::invariant(format!("person at slot {i} carries id {}", p.id())));
        }
        if let Some((i, c)) = containers.iter().enumerate().find(|(i, c)| c.id().index() != *i) {
            return Err(EpiError::invariant(format!("container at slot {i} carries id {}", c.id())));
        }
        Ok(Population { persons, containers })
    }

    #[inline]
    pub fn num_persons(&self) -> usize {
        self.persons.len()
    }

    #[inline]
    pub fn num_containers(&self) -> usize {
        self.containers.len()
    }

    /// Iterator over all `PersonId`s in ascending index order.
    pub fn person_ids(&self) -> impl Iterator<Item = PersonId> + '_ {
        (0..self.persons.len() as u32).map(PersonId)
    }

    // ── Access ────────────────────────────────────────────────────────────

    #[inline]
    pub fn person(&self, id: PersonId) -> EpiResult<&PersonState> {
        self.persons.get(id.index()).ok_or(EpiError::PersonNotFound(id))
    }

    #[inline]
    pub fn person_mut(&mut self, id: PersonId) -> EpiResult<&mut PersonState> {
        self.persons.get_mut(id.index()).ok_or(EpiError::PersonNotFound(id))
    }

    #[inline]
    pub fn persons(&self) -> &[PersonState] {
        &self.persons
    }

    #[inline]
    pub fn persons_mut(&mut self) -> &mut [PersonState] {
        &mut self.persons
    }

    #[inline]
    pub fn container(&self, id: ContainerId) -> EpiResult<&ContainerState> {
        self.containers.get(id.index()).ok_or(EpiError::ContainerNotFound(id))
    }

    #[inline]
    pub fn container_mut(&mut self, id: ContainerId) -> EpiResult<&mut ContainerState> {
        self.containers.get_mut(id.index()).ok_or(EpiError::ContainerNotFound(id))
    }

    #[inline]
    pub fn containers(&self) -> &[ContainerState] {
        &self.containers
    }

    /// Mutable access to two distinct persons at once.
    pub fn pair_mut(&mut self, a: PersonId, b: PersonId) -> EpiResult<(&mut PersonState, &mut PersonState)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib {
            return Err(EpiError::invariant(format!("{a} paired with itself")));
        }
        let n = self.persons.len();
        if ia >= n {
            return Err(EpiError::PersonNotFound(a));
        }
        if ib >= n {
            return Err(EpiError::PersonNotFound(b));
        }
        if ia < ib {
            let (lo, hi) = self.persons.split_at_mut(ib);
            Ok((&mut lo[ia], &mut hi[0]))
        } else {
            let (lo, hi) = self.persons.split_at_mut(ia);
            Ok((&mut hi[0], &mut lo[ib]))
        }
    }

    // ── Occupancy ─────────────────────────────────────────────────────────

    /// Put `person` into `container` at `now`.
    pub fn enter(&mut self, person: PersonId, container: ContainerId, now: f64) -> EpiResult<()> {
        let p = self.persons.get_mut(person.index()).ok_or(EpiError::PersonNotFound(person))?;
        let c = self.containers.get_mut(container.index()).ok_or(EpiError::ContainerNotFound(container))?;
        c.add_person(p, now)
    }

    /// Take `person` out of `container`; returns the entry time.
    pub fn leave(&mut self, person: PersonId, container: ContainerId) -> EpiResult<f64> {
        let p = self.persons.get_mut(person.index()).ok_or(EpiError::PersonNotFound(person))?;
        let c = self.containers.get_mut(container.index()).ok_or(EpiError::ContainerNotFound(container))?;
        c.remove_person(p)
    }

    /// Empty every container.
    pub fn clear_occupancy(&mut self) {
        for c in &mut self.containers {
            for pid in c.take_occupants() {
                if let Some(p) = self.persons.get_mut(pid.index()) {
                    p.set_current_container(None);
                }
            }
        }
    }
}
