//! Simulation observer trait for progress reporting and data collection.

use ep_core::DayOfWeek;
use ep_model::InfectionRecord;

use crate::InfectionReport;

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run] at key
/// points of the day loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter;
///
/// impl EpiObserver for ProgressPrinter {
///     fn on_report(&mut self, report: &InfectionReport) {
///         println!("{report}");
///     }
/// }
/// ```
pub trait EpiObserver {
    /// Called after `reset`, before the first event of the day is replayed.
    fn on_day_start(&mut self, _iteration: u32, _day: DayOfWeek) {}

    /// Called once per infection of the day, imported cases first, in the
    /// order they happened.
    fn on_infection(&mut self, _infection: &InfectionRecord) {}

    /// Called at the end of each day with the completed report.
    fn on_report(&mut self, _report: &InfectionReport) {}

    /// Called once after the last day.
    fn on_sim_end(&mut self, _final_report: &InfectionReport) {}
}

/// An [`EpiObserver`] that does nothing.
pub struct NoopObserver;

impl EpiObserver for NoopObserver {}
