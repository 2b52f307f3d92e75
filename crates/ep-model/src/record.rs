//! Infection records handed to observers and output writers.

use ep_core::{ContainerId, DiseaseStatus, PersonId};

/// Infection type of cases seeded from outside the population.
pub const IMPORT: &str = "import";

/// One infection, either transmitted or imported.
#[derive(Clone, Debug, PartialEq)]
pub struct InfectionRecord {
    /// Corrected seconds, clamped to the end of the day.
    pub time: f64,
    pub day: u32,
    /// `None` for imported cases.
    pub infector: Option<PersonId>,
    pub infected: PersonId,
    /// `None` for imported cases.
    pub container: Option<ContainerId>,
    /// `"home_leisure"`, `"pt"`, `"import"`, …
    pub infection_type: String,
    /// Number of contacts of the leave event that led to the infection.
    pub group_size: usize,
    /// Status of the infector at the time of infection.
    pub infector_status: Option<DiseaseStatus>,
}

impl InfectionRecord {
    pub fn is_import(&self) -> bool {
        self.infector.is_none()
    }
}
