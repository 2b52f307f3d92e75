//! Plain data row types written by output backends.

use ep_core::{ContainerId, ContainerInfo, DiseaseStatus, PersonId};
use ep_model::InfectionRecord;
use ep_sim::InfectionReport;

/// Columns of `infections.csv`.
pub const INFECTION_HEADER: [&str; 8] =
    ["time", "day", "infector", "infected", "container", "infection_type", "group_size", "infector_status"];

/// Columns of `reports.csv`: the day, one count per disease status, then
/// quarantine and daily totals.
pub fn report_header() -> Vec<&'static str> {
    let mut header = vec!["iteration", "day"];
    header.extend(DiseaseStatus::ALL.iter().map(|s| s.as_str()));
    header.extend(["quarantined_at_home", "quarantined_full", "cumulative_infected", "new_infections", "imported", "contacts"]);
    header
}

/// External ids used in place of numeric ones.  Ids without a name are
/// written as numbers.
#[derive(Clone, Debug, Default)]
pub struct IdNames {
    persons:    Vec<String>,
    containers: Vec<String>,
}

impl IdNames {
    pub fn new(persons: &[String], containers: &[ContainerInfo]) -> Self {
        IdNames {
            persons: persons.to_vec(),
            containers: containers.iter().map(|c| c.name.clone()).collect(),
        }
    }

    pub fn person(&self, id: PersonId) -> String {
        self.persons.get(id.index()).cloned().unwrap_or_else(|| id.0.to_string())
    }

    pub fn container(&self, id: ContainerId) -> String {
        self.containers.get(id.index()).cloned().unwrap_or_else(|| id.0.to_string())
    }
}

/// One row of `infections.csv`.  Empty strings stand for absent values.
#[derive(Debug, Clone, PartialEq)]
pub struct InfectionRow {
    pub time:            f64,
    pub day:             u32,
    pub infector:        String,
    pub infected:        String,
    pub container:       String,
    pub infection_type:  String,
    pub group_size:      usize,
    pub infector_status: String,
}

impl InfectionRow {
    pub fn from_record(record: &InfectionRecord, names: &IdNames) -> Self {
        InfectionRow {
            time:            record.time,
            day:             record.day,
            infector:        record.infector.map(|p| names.person(p)).unwrap_or_default(),
            infected:        names.person(record.infected),
            container:       record.container.map(|c| names.container(c)).unwrap_or_default(),
            infection_type:  record.infection_type.clone(),
            group_size:      record.group_size,
            infector_status: record.infector_status.map(|s| s.as_str().to_string()).unwrap_or_default(),
        }
    }

    pub fn fields(&self) -> [String; 8] {
        [
            self.time.to_string(),
            self.day.to_string(),
            self.infector.clone(),
            self.infected.clone(),
            self.container.clone(),
            self.infection_type.clone(),
            self.group_size.to_string(),
            self.infector_status.clone(),
        ]
    }
}

/// One row of `reports.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub iteration:           u32,
    pub day:                 &'static str,
    pub by_status:           [usize; DiseaseStatus::COUNT],
    pub quarantined_at_home: usize,
    pub quarantined_full:    usize,
    pub cumulative_infected: usize,
    pub new_infections:      usize,
    pub imported:            usize,
    pub contacts:            u64,
}

impl From<&InfectionReport> for ReportRow {
    fn from(report: &InfectionReport) -> Self {
        ReportRow {
            iteration:           report.iteration,
            day:                 report.day.as_str(),
            by_status:           report.counts.by_status,
            quarantined_at_home: report.quarantined_at_home(),
            quarantined_full:    report.quarantined_full(),
            cumulative_infected: report.cumulative_infected(),
            new_infections:      report.infections,
            imported:            report.imported,
            contacts:            report.contacts,
        }
    }
}

impl ReportRow {
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![self.iteration.to_string(), self.day.to_string()];
        fields.extend(self.by_status.iter().map(usize::to_string));
        fields.extend([
            self.quarantined_at_home.to_string(),
            self.quarantined_full.to_string(),
            self.cumulative_infected.to_string(),
            self.new_infections.to_string(),
            self.imported.to_string(),
            self.contacts.to_string(),
        ]);
        fields
    }
}
