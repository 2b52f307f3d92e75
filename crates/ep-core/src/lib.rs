//! `ep-core`: foundational types for the `rust_ep` contact simulation.
//!
//! This crate is a dependency of every other `ep-*` crate.  It has no `ep-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `PersonId`, `ContainerId`, `ActivityId`                    |
//! | [`time`]        | `SimTime`, `DayOfWeek`, day/week constants                 |
//! | [`rng`]         | `SimRng` (run and init streams, draw counting)             |
//! | [`disease`]     | `DiseaseStatus`, `QuarantineStatus`                        |
//! | [`activity`]    | `InfectionParams`, `ActivityDictionary`                    |
//! | [`container`]   | `ContainerInfo`, `ContainerStats`                          |
//! | [`config`]      | `EpiConfig` and its nested sections                        |
//! | [`error`]       | `EpiError`, `EpiResult`                                    |

pub mod activity;
pub mod config;
pub mod container;
pub mod disease;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use activity::{ActivityDictionary, InfectionParams};
pub use config::{EpiConfig, HouseholdSusceptibilityConfig, ProgressionConfig};
pub use container::{ContainerInfo, ContainerStats};
pub use disease::{DiseaseStatus, QuarantineStatus};
pub use error::{EpiError, EpiResult};
pub use ids::{ActivityId, ContainerId, PersonId};
pub use rng::SimRng;
pub use time::{DayOfWeek, MAX_JOINT_TIME, SECONDS_PER_DAY, SimTime};
