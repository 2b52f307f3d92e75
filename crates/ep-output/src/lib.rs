//! `ep-output`: simulation output writers for the rust_ep contact simulation.
//!
//! | Backend | Files created                       |
//! |---------|-------------------------------------|
//! | CSV     | `infections.csv`, `reports.csv`     |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`ReportObserver`], which implements `ep_sim::EpiObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ep_output::{CsvWriter, IdNames, ReportObserver};
//!
//! let names = IdNames::new(provider.persons(), provider.containers());
//! let writer = CsvWriter::new(Path::new("./output"))?.with_names(names);
//! let mut obs = ReportObserver::new(writer);
//! sim.run(100, &mut obs)?;
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::ReportObserver;
pub use row::{INFECTION_HEADER, IdNames, InfectionRow, ReportRow, report_header};
pub use writer::OutputWriter;
