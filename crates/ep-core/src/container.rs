//! Static container metadata shared by providers, archives and state.

use serde::{Deserialize, Serialize};

/// Usage statistics computed once by a provider's preprocessing pass.
///
/// Counts are already scaled by `1 / sample_size`.  `-1` (or `1.0` spaces)
/// means "unknown".
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ContainerStats {
    /// Maximum number of persons present at the same time.
    pub max_group_size: i32,
    /// Number of distinct visits over the preprocessed days.
    pub total_users: i32,
    /// Nominal capacity: the vehicle capacity, or `max_group_size` for a
    /// facility.
    pub typical_capacity: i32,
    /// Number of independent spaces the facility is split into.
    pub num_spaces: f64,
}

impl Default for ContainerStats {
    fn default() -> Self {
        ContainerStats {
            max_group_size: -1,
            total_users: -1,
            typical_capacity: -1,
            num_spaces: 1.0,
        }
    }
}

impl ContainerStats {
    /// Divide raw counts by the sampling factor, truncating.  A vehicle
    /// capacity is a property of the vehicle and is not scaled.
    pub fn scaled(raw_max: u32, raw_users: u32, capacity: Option<u32>, num_spaces: f64, sample_size: f64) -> Self {
        let scale = |v: u32| (v as f64 / sample_size) as i32;
        let max_group_size = scale(raw_max);
        ContainerStats {
            max_group_size,
            total_users: scale(raw_users),
            typical_capacity: capacity.map(|c| c as i32).unwrap_or(max_group_size),
            num_spaces,
        }
    }
}

/// Identity and kind of a container, plus its statistics.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// External id string from the mobility data.
    pub name: String,
    pub is_vehicle: bool,
    pub stats: ContainerStats,
}

impl ContainerInfo {
    pub fn facility(name: impl Into<String>) -> Self {
        ContainerInfo { name: name.into(), is_vehicle: false, stats: ContainerStats::default() }
    }

    pub fn vehicle(name: impl Into<String>) -> Self {
        ContainerInfo { name: name.into(), is_vehicle: true, stats: ContainerStats::default() }
    }

    pub fn with_stats(mut self, stats: ContainerStats) -> Self {
        self.stats = stats;
        self
    }
}
