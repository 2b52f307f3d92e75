//! `ReportObserver<W>`: bridges `EpiObserver` to an `OutputWriter`.

use ep_model::InfectionRecord;
use ep_sim::{EpiObserver, InfectionReport};

use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// An [`EpiObserver`] that writes every day's infections and report to any
/// [`OutputWriter`] backend.
///
/// Infections are buffered during the day and written together with the
/// report.  Errors from the writer are stored internally because
/// `EpiObserver` methods have no return value.  After `sim.run()` returns,
/// check for errors with [`take_error`][Self::take_error].
pub struct ReportObserver<W: OutputWriter> {
    writer:     W,
    pending:    Vec<InfectionRecord>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> ReportObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, pending: Vec::new(), last_error: None }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> EpiObserver for ReportObserver<W> {
    fn on_infection(&mut self, infection: &InfectionRecord) {
        self.pending.push(infection.clone());
    }

    fn on_report(&mut self, report: &InfectionReport) {
        let infections = std::mem::take(&mut self.pending);
        let result = self
            .writer
            .write_infections(&infections)
            .and_then(|()| self.writer.write_report(report))
            .and_then(|()| self.writer.flush());
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_report: &InfectionReport) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
