//! The `OutputWriter` trait implemented by output backends.

use ep_model::InfectionRecord;
use ep_sim::InfectionReport;

use crate::OutputResult;

/// Sink for the infections and daily reports of one run.
///
/// Errors never interrupt the run when the writer is driven by
/// [`ReportObserver`][crate::ReportObserver]; they are stored and retrieved
/// with [`ReportObserver::take_error`][crate::ReportObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of infections, in the order given.
    fn write_infections(&mut self, infections: &[InfectionRecord]) -> OutputResult<()>;

    /// Write one daily report.
    fn write_report(&mut self, report: &InfectionReport) -> OutputResult<()>;

    /// Push buffered rows to the underlying files.
    fn flush(&mut self) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
