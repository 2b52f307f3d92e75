//! `ep-provider`: sources of persons, containers, and daily events.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`provider`]   | `EventProvider` trait, `DayEvents` iterator                |
//! | [`movement`]   | `Movement`, `load_movements_csv`, `load_movements_reader`  |
//! | [`scenario`]   | `ScenarioProvider`, the live `OccupancyLeave` view         |
//! | [`graph`]      | `GraphProvider`, `build_archive`, `write_archive`          |
//! | [`error`]      | `ProviderError`, `ProviderResult<T>`                       |
//!
//! # Two ways in
//!
//! ```text
//! movements.csv ──► ScenarioProvider ──► write_archive ──► week.tar.lz4
//!                                                              │
//!                         GraphProvider::open ◄────────────────┘
//! ```
//!
//! Both providers hand out the same `EventView`s, so a run replayed from an
//! archive is identical to one driven by the movements it was written from.

pub mod error;
pub mod graph;
pub mod movement;
pub mod provider;
pub mod scenario;


pub use error::{ProviderError, ProviderResult};
pub use graph::{GraphProvider, build_archive, write_archive};
pub use movement::{Movement, MovementKind, load_movements_csv, load_movements_reader};
pub use provider::{DayEvents, EventProvider, HOME};
pub use scenario::{OccupancyLeave, ScenarioProvider};
