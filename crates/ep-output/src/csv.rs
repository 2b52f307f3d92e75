//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `infections.csv`
//! - `reports.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;
use ep_model::InfectionRecord;
use ep_sim::InfectionReport;
use log::info;

use crate::row::{INFECTION_HEADER, IdNames, InfectionRow, ReportRow, report_header};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Writes infections and daily reports to two CSV files.
pub struct CsvWriter {
    infections: Writer<File>,
    reports:    Writer<File>,
    names:      IdNames,
    rows:       u64,
    finished:   bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut infections = Writer::from_path(dir.join("infections.csv"))?;
        infections.write_record(INFECTION_HEADER)?;

        let mut reports = Writer::from_path(dir.join("reports.csv"))?;
        reports.write_record(report_header())?;

        Ok(Self {
            infections,
            reports,
            names: IdNames::default(),
            rows: 0,
            finished: false,
        })
    }

    /// Write external person and container ids instead of numeric ones.
    pub fn with_names(mut self, names: IdNames) -> Self {
        self.names = names;
        self
    }

    fn check_open(&self) -> OutputResult<()> {
        if self.finished { Err(OutputError::Finished) } else { Ok(()) }
    }
}

impl OutputWriter for CsvWriter {
    fn write_infections(&mut self, infections: &[InfectionRecord]) -> OutputResult<()> {
        self.check_open()?;
        for record in infections {
            let row = InfectionRow::from_record(record, &self.names);
            self.infections.write_record(&row.fields())?;
        }
        self.rows += infections.len() as u64;
        Ok(())
    }

    fn write_report(&mut self, report: &InfectionReport) -> OutputResult<()> {
        self.check_open()?;
        self.reports.write_record(ReportRow::from(report).fields())?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.check_open()?;
        self.infections.flush()?;
        self.reports.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.infections.flush()?;
        self.reports.flush()?;
        info!("csv output finished: {} infections", self.rows);
        Ok(())
    }
}
