//! Activity parameters and the byte-indexed activity dictionary.
//!
//! Event records store activities as one-byte [`ActivityId`]s.  The
//! dictionary is the explicit name → index table behind those bytes; graph
//! archives persist [`ActivityDictionary::names`] so a reader never depends
//! on reconstructing the writer's parameter order.

use std::ops::Index;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{ActivityId, EpiError, EpiResult};

/// Container name of the transit parameters used for every vehicle leg.
pub const TRANSIT: &str = "tr";

/// Container name of the optional parameters applied to home contacts of a
/// person quarantined at home.
pub const HOME_QUARANTINE: &str = "quarantine_home";

/// Transmission parameters of one activity group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfectionParams {
    /// Group name, e.g. `"home"`, `"work"`, `"leisure"`, `"tr"`.
    pub container_name: String,

    /// Activity-type prefixes mapped onto this group.  Empty means the
    /// container name itself is the only prefix.
    #[serde(default)]
    pub mapped_names: Vec<String>,

    #[serde(default = "default_contact_intensity")]
    pub contact_intensity: f64,

    /// Typical number of independent spaces per facility of this type.
    #[serde(default = "default_spaces")]
    pub spaces_per_facility: f64,
}

fn default_contact_intensity() -> f64 {
    1.0
}

fn default_spaces() -> f64 {
    20.0
}

impl InfectionParams {
    pub fn new(container_name: impl Into<String>, contact_intensity: f64) -> Self {
        InfectionParams {
            container_name: container_name.into(),
            mapped_names: Vec::new(),
            contact_intensity,
            spaces_per_facility: default_spaces(),
        }
    }

    /// Builder-style helper for additional activity-type prefixes.
    pub fn mapping(mut self, prefix: impl Into<String>) -> Self {
        self.mapped_names.push(prefix.into());
        self
    }

    pub fn spaces(mut self, spaces_per_facility: f64) -> Self {
        self.spaces_per_facility = spaces_per_facility;
        self
    }

    /// `true` if an activity of type `activity_type` belongs to this group.
    pub fn includes(&self, activity_type: &str) -> bool {
        if self.mapped_names.is_empty() {
            activity_type.starts_with(&self.container_name)
        } else {
            self.mapped_names.iter().any(|p| activity_type.starts_with(p.as_str()))
        }
    }
}

// ── ActivityDictionary ────────────────────────────────────────────────────────

/// Ordered, immutable table of [`InfectionParams`] addressed by [`ActivityId`].
#[derive(Clone, Debug)]
pub struct ActivityDictionary {
    params: Vec<InfectionParams>,
    by_name: FxHashMap<String, ActivityId>,
    transit: ActivityId,
    home_quarantine: Option<ActivityId>,
}

impl ActivityDictionary {
    /// Build from params in their given order.
    ///
    /// Fails if names repeat, if there are more than 255 entries (0xFF is
    /// the "none" sentinel) or if no transit (`"tr"`) entry exists.
    pub fn new(params: Vec<InfectionParams>) -> EpiResult<Self> {
        if params.len() >= ActivityId::INVALID.index() {
            return Err(EpiError::Config(format!(
                "at most {} activity groups are supported, got {}",
                ActivityId::INVALID.index(),
                params.len()
            )));
        }

        let mut by_name = FxHashMap::default();
        for (i, p) in params.iter().enumerate() {
            let id = ActivityId(i as u8);
            if by_name.insert(p.container_name.clone(), id).is_some() {
                return Err(EpiError::Config(format!(
                    "duplicate activity group '{}'",
                    p.container_name
                )));
            }
        }

        let transit = *by_name
            .get(TRANSIT)
            .ok_or_else(|| EpiError::Config(format!("missing '{TRANSIT}' activity group")))?;
        let home_quarantine = by_name.get(HOME_QUARANTINE).copied();

        Ok(ActivityDictionary { params, by_name, transit, home_quarantine })
    }

    /// Rebuild a dictionary whose index order is given by `names`, resolving
    /// each name against `params`.
    pub fn from_names<S: AsRef<str>>(names: &[S], params: &[InfectionParams]) -> EpiResult<Self> {
        let ordered = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                params
                    .iter()
                    .find(|p| p.container_name == n)
                    .cloned()
                    .ok_or_else(|| EpiError::UnknownActivity(n.to_string()))
            })
            .collect::<EpiResult<Vec<_>>>()?;
        Self::new(ordered)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: ActivityId) -> bool {
        id.index() < self.params.len()
    }

    #[inline]
    pub fn get(&self, id: ActivityId) -> Option<&InfectionParams> {
        self.params.get(id.index())
    }

    pub fn id_of(&self, container_name: &str) -> Option<ActivityId> {
        self.by_name.get(container_name).copied()
    }

    /// Resolve a raw activity type (e.g. `"work_8h"`) to its group.
    pub fn select(&self, activity_type: &str) -> EpiResult<ActivityId> {
        self.params
            .iter()
            .position(|p| p.includes(activity_type))
            .map(|i| ActivityId(i as u8))
            .ok_or_else(|| EpiError::UnknownActivity(activity_type.to_string()))
    }

    /// Group names in index order, as persisted in graph archives.
    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.container_name.as_str()).collect()
    }

    #[inline]
    pub fn transit(&self) -> ActivityId {
        self.transit
    }

    #[inline]
    pub fn home_quarantine(&self) -> Option<ActivityId> {
        self.home_quarantine
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActivityId, &InfectionParams)> {
        self.params.iter().enumerate().map(|(i, p)| (ActivityId(i as u8), p))
    }
}

impl Index<ActivityId> for ActivityDictionary {
    type Output = InfectionParams;

    #[inline]
    fn index(&self, id: ActivityId) -> &InfectionParams {
        &self.params[id.index()]
    }
}
