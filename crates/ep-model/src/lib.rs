//! `ep-model`: the pluggable strategies of a `rust_ep` run.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                          |
//! |-----------------|-------------------------------------------------------------------|
//! | [`contact`]     | `ContactModel` trait, `DefaultContactModel`, `DirectContactModel` |
//! | [`infection`]   | `InfectionModel` trait, `DefaultInfectionModel`                   |
//! | [`progression`] | `ProgressionModel` trait, `DefaultProgressionModel`               |
//! | [`restriction`] | `Restriction`, `Restrictions`, `RestrictionPolicy` + policies     |
//! | [`household`]   | household susceptibility sampling                                 |
//! | [`counts`]      | `StatusCounts`                                                    |
//! | [`record`]      | `InfectionRecord`                                                 |
//!
//! # Design notes
//!
//! A day is processed strictly sequentially:
//!
//! 1. **Progression**: the handler runs `ProgressionModel` over every
//!    person, then asks the `RestrictionPolicy` for the day's
//!    `Restrictions` and hands an `Arc` snapshot to the contact model.
//!
//! 2. **Replay**: every enter and leave event of the day is passed to the
//!    `ContactModel`, which mutates `Population` directly when an infection
//!    happens.
//!
//! Every random decision draws from the `SimRng` passed into the call, so a
//! run is reproducible from its seed alone.

pub mod contact;
pub mod counts;
pub mod household;
pub mod infection;
pub mod progression;
pub mod record;
pub mod restriction;

#[cfg(test)]
mod tests;

pub use contact::{ContactCore, ContactModel, DefaultContactModel, DirectContactModel, InfectionLabel, Site};
pub use counts::StatusCounts;
pub use household::apply_household_susceptibility;
pub use infection::{DefaultInfectionModel, FixedInfectionModel, InfectionModel};
pub use progression::{DefaultProgressionModel, ProgressionModel};
pub use record::{IMPORT, InfectionRecord};
pub use restriction::{FixedPolicy, Restriction, RestrictionChange, RestrictionPolicy, Restrictions, ScheduledPolicy};
