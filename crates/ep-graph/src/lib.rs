//! `ep-graph`: compact storage and replay of daily container events.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`event`]   | `EnterEvent`, `Contact`, `LeaveEvent`, owned and borrowed events |
//! | [`codec`]   | `ContactGraph` fixed-width codec, `Events`/`Contacts` cursors  |
//! | [`archive`] | `GraphArchive`: tar + LZ4 file holding a week of graphs       |
//! | [`error`]   | `GraphError`, `GraphResult`                                   |
//!
//! A graph is built once per distinct weekday and replayed, read-only, on
//! every iteration that falls on that weekday.  Graphs are `Send + Sync`;
//! parallel runs share them behind an `Arc`.

pub mod archive;
pub mod codec;
pub mod error;
pub mod event;

#[cfg(test)]
mod tests;

pub use archive::GraphArchive;
pub use codec::{CONTACT_SIZE, ContactGraph, EVENT_SIZE, EventRef, Events, LeaveRef};
pub use error::{GraphError, GraphResult};
pub use event::{Contact, EnterEvent, EpisimEvent, EventView, LeaveEvent, LeaveRecord, LeaveView};
