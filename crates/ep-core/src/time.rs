//! Simulation time model.
//!
//! # Design
//!
//! One iteration simulates one day.  Events carry seconds-of-day as `u32`;
//! the handler turns them into an absolute, day-offset-corrected timestamp:
//!
//!   seconds = start_offset + time_of_day + iteration * 86400
//!
//! Events after midnight (time_of_day ≥ 86400) belong to the following day
//! for "days since" arithmetic.  [`SimTime`] carries both the corrected
//! seconds and that integral day, so elapsed-day computations never need to
//! divide floating-point timestamps.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: u32 = 86_400;

/// Upper bound for offsets, durations and joint times: one week.
pub const MAX_JOINT_TIME: u32 = 7 * SECONDS_PER_DAY;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// A corrected timestamp plus the simulation day it falls on.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Serialize, Deserialize)]
pub struct SimTime {
    pub seconds: f64,
    pub day: u32,
}

impl SimTime {
    /// Correct a seconds-of-day value for the given iteration.
    #[inline]
    pub fn corrected(start_offset: f64, time_of_day: f64, iteration: u32) -> SimTime {
        let overflow_days = (time_of_day / SECONDS_PER_DAY as f64).floor().max(0.0) as u32;
        SimTime {
            seconds: start_offset + time_of_day + iteration as f64 * SECONDS_PER_DAY as f64,
            day: iteration + overflow_days,
        }
    }

    /// Seconds elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.seconds - earlier.seconds
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}s (day {})", self.seconds, self.day)
    }
}

// ── DayOfWeek ─────────────────────────────────────────────────────────────────

/// Weekday of an iteration.  Contact graphs are stored per weekday.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Zero-based position, Monday = 0.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> DayOfWeek {
        Self::ALL[i % 7]
    }

    /// The preceding weekday, wrapping Monday to Sunday.
    #[inline]
    pub fn previous(self) -> DayOfWeek {
        Self::from_index(self.index() + 6)
    }

    /// Weekday of `iteration` when iteration 1 falls on `start_day`.
    ///
    /// Iteration 0 (the setup day) is the day before `start_day`.
    pub fn for_iteration(start_day: DayOfWeek, iteration: u32) -> DayOfWeek {
        Self::from_index(start_day.index() + 6 + (iteration % 7) as usize)
    }

    /// Upper-case name, also used as archive entry name.
    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday    => "MONDAY",
            DayOfWeek::Tuesday   => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday  => "THURSDAY",
            DayOfWeek::Friday    => "FRIDAY",
            DayOfWeek::Saturday  => "SATURDAY",
            DayOfWeek::Sunday    => "SUNDAY",
        }
    }

    pub fn from_name(name: &str) -> Option<DayOfWeek> {
        Self::ALL.into_iter().find(|d| d.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
