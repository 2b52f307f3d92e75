//! `ep-population`: mutable person and container state for `rust_ep`.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`person`]      | `PersonState`, `InfectionSource`, `TraceableContact`      |
//! | [`container`]   | `ContainerState` (occupants and entry times)              |
//! | [`store`]       | `Population` arena                                        |
//! | [`builder`]     | `PopulationBuilder` (fluent construction)                 |
//!
//! State is created once per run and mutated day after day.  Nothing here
//! draws randomness except the builder, which takes the init stream
//! explicitly.

pub mod builder;
pub mod container;
pub mod person;
pub mod store;


pub use builder::PopulationBuilder;
pub use container::ContainerState;
pub use person::{InfectionSource, PersonState, TraceableContact};
pub use store::Population;
