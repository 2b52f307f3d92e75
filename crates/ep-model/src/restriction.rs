//! Per-activity restrictions and the policies that update them once a day.

use std::collections::BTreeMap;

use ep_core::{ContainerId, EpiConfig, SimRng};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::StatusCounts;

// ── Restriction ───────────────────────────────────────────────────────────────

/// Participation limits for one activity group on one day.
#[derive(Clone, Debug, PartialEq)]
pub struct Restriction {
    /// Probability that a person still performs the activity, in `[0, 1]`.
    pub remaining_fraction: f64,
    /// Facilities whose usual maximum occupancy exceeds this are closed.
    /// `None` or a negative value disables the check.
    pub max_group_size: Option<i32>,
    /// Multiplies the transmission probability of infectors performing this
    /// activity.
    pub ci_correction: f64,
    pub closed: FxHashSet<ContainerId>,
}

impl Default for Restriction {
    fn default() -> Self {
        Restriction {
            remaining_fraction: 1.0,
            max_group_size: None,
            ci_correction: 1.0,
            closed: FxHashSet::default(),
        }
    }
}

impl Restriction {
    /// Fully open activity.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn fraction(remaining_fraction: f64) -> Self {
        Restriction { remaining_fraction, ..Self::default() }
    }

    pub fn with_max_group_size(mut self, size: i32) -> Self {
        self.max_group_size = Some(size);
        self
    }

    pub fn with_ci_correction(mut self, correction: f64) -> Self {
        self.ci_correction = correction;
        self
    }

    pub fn close(mut self, container: ContainerId) -> Self {
        self.closed.insert(container);
        self
    }

    #[inline]
    pub fn is_closed(&self, container: ContainerId) -> bool {
        self.closed.contains(&container)
    }

    /// `true` if a facility with the given usual maximum occupancy exceeds
    /// the group size limit.
    pub fn exceeds_group_size(&self, container_max_group_size: i32) -> bool {
        match self.max_group_size {
            Some(m) => m > -1 && container_max_group_size > 0 && container_max_group_size > m,
            None => false,
        }
    }
}

// ── Restrictions ──────────────────────────────────────────────────────────────

/// Restrictions of every activity group, keyed by container name.
///
/// A group without an entry is fully open.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Restrictions {
    by_name: FxHashMap<String, Restriction>,
}

impl Restrictions {
    pub fn new() -> Self {
        Self::default()
    }

    /// One open entry per configured activity group.
    pub fn for_config(config: &EpiConfig) -> Self {
        let by_name = config
            .infection_params
            .iter()
            .map(|p| (p.container_name.clone(), Restriction::open()))
            .collect();
        Restrictions { by_name }
    }

    pub fn with(mut self, name: impl Into<String>, restriction: Restriction) -> Self {
        self.set(name, restriction);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, restriction: Restriction) {
        self.by_name.insert(name.into(), restriction);
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Restriction> {
        self.by_name.get(name)
    }

    /// Entry for `name`, inserted open if absent.
    pub fn entry(&mut self, name: &str) -> &mut Restriction {
        self.by_name.entry(name.to_owned()).or_default()
    }

    #[inline]
    pub fn remaining_fraction(&self, name: &str) -> f64 {
        self.get(name).map_or(1.0, |r| r.remaining_fraction)
    }

    #[inline]
    pub fn ci_correction(&self, name: &str) -> f64 {
        self.get(name).map_or(1.0, |r| r.ci_correction)
    }

    /// Bernoulli draw against the remaining fraction of `name`.  A fraction
    /// of exactly 0 or 1 decides without drawing.
    #[inline]
    pub fn is_relevant(&self, name: &str, rng: &mut SimRng) -> bool {
        rng.bernoulli(self.remaining_fraction(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Restriction)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ── Policies ──────────────────────────────────────────────────────────────────

/// Produces the restrictions of each day.
///
/// Called once per iteration, after the daily report is built and before
/// any event of the day is replayed.
pub trait RestrictionPolicy: Send {
    /// Set up the restrictions used before the first update.
    fn init(&mut self, _restrictions: &mut Restrictions) {}

    fn update_restrictions(&mut self, iteration: u32, counts: &StatusCounts, restrictions: &mut Restrictions);
}

/// Keeps the restrictions it was created with.
#[derive(Clone, Debug, Default)]
pub struct FixedPolicy {
    initial: Restrictions,
}

impl FixedPolicy {
    pub fn new(initial: Restrictions) -> Self {
        FixedPolicy { initial }
    }
}

impl RestrictionPolicy for FixedPolicy {
    fn init(&mut self, restrictions: &mut Restrictions) {
        for (name, r) in self.initial.iter() {
            restrictions.set(name, r.clone());
        }
    }

    fn update_restrictions(&mut self, _iteration: u32, _counts: &StatusCounts, _restrictions: &mut Restrictions) {}
}

/// A change applied to one activity group.
#[derive(Clone, Debug, PartialEq)]
pub enum RestrictionChange {
    Fraction(f64),
    MaxGroupSize(Option<i32>),
    CiCorrection(f64),
    Close(ContainerId),
    Reopen(ContainerId),
}

/// Applies changes keyed by the iteration on which they take effect.
///
/// Every change scheduled for an iteration up to and including the current
/// one is applied exactly once, in iteration order.
#[derive(Clone, Debug, Default)]
pub struct ScheduledPolicy {
    schedule: BTreeMap<u32, Vec<(String, RestrictionChange)>>,
    applied_through: u32,
}

impl ScheduledPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, iteration: u32, name: impl Into<String>, change: RestrictionChange) -> Self {
        self.schedule.entry(iteration).or_default().push((name.into(), change));
        self
    }

    /// Shorthand for a remaining-fraction change.
    pub fn fraction_at(self, iteration: u32, name: impl Into<String>, fraction: f64) -> Self {
        self.at(iteration, name, RestrictionChange::Fraction(fraction))
    }
}

impl RestrictionPolicy for ScheduledPolicy {
    fn init(&mut self, restrictions: &mut Restrictions) {
        self.applied_through = 0;
        // Iteration 0 entries describe the starting state.
        self.update_restrictions(0, &StatusCounts::default(), restrictions);
    }

    fn update_restrictions(&mut self, iteration: u32, _counts: &StatusCounts, restrictions: &mut Restrictions) {
        let from = if iteration == 0 { 0 } else { self.applied_through + 1 };
        if from > iteration {
            return;
        }
        for (it, changes) in self.schedule.range(from..=iteration) {
            for (name, change) in changes {
                log::debug!("iteration {it}: {name} -> {change:?}");
                let r = restrictions.entry(name);
                match *change {
                    RestrictionChange::Fraction(f) => r.remaining_fraction = f,
                    RestrictionChange::MaxGroupSize(m) => r.max_group_size = m,
                    RestrictionChange::CiCorrection(c) => r.ci_correction = c,
                    RestrictionChange::Close(c) => {
                        r.closed.insert(c);
                    }
                    RestrictionChange::Reopen(c) => {
                        r.closed.remove(&c);
                    }
                }
            }
        }
        self.applied_through = iteration;
    }
}
