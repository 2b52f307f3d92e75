//! `ep-sim`: day loop orchestrator for the rust_ep contact simulation.
//!
//! # Day loop
//!
//! ```text
//! handler.init(provider)                       once per run
//! for iteration in 1..=max_iterations:
//!   ① Reset   : provider.reset(i); handler.reset(i):
//!                  progression → tracing retention → imported cases
//!                  → report → restrictions → contact model
//!   ② Replay  : for event in provider.for_day(weekday(i)):
//!                  Enter  → ContactModel::notify_enter
//!                  Leave  → ContactModel::infection_dynamics
//!   ③ Report  : handler.finish_day(): infections + completed report
//!   stop early once handler.is_finished()
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the simulations of [`run_sweep`] on Rayon.        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ep_core::EpiConfig;
//! use ep_provider::{EventProvider, GraphProvider};
//! use ep_sim::{NoopObserver, SimBuilder};
//!
//! let config = EpiConfig::from_json_file("config.json")?;
//! let provider = GraphProvider::open("week.tar.lz4", &config)?;
//! let mut sim = SimBuilder::new(&provider, config).build()?;
//! let last = sim.run(100, &mut NoopObserver)?;
//! println!("{last}");
//! ```

pub mod builder;
pub mod error;
pub mod handler;
pub mod observer;
pub mod report;
pub mod sim;


pub use builder::{ContactModelKind, SimBuilder};
pub use error::{SimError, SimResult};
pub use handler::InfectionEventHandler;
pub use observer::{EpiObserver, NoopObserver};
pub use report::InfectionReport;
pub use sim::{Simulation, run_sweep};
