//! Per-person mutable state.

use ep_core::{ActivityId, ContainerId, DiseaseStatus, EpiError, EpiResult, PersonId, QuarantineStatus, SimTime};

/// Where and how a person got infected.  Recorded once.
#[derive(Clone, Debug, PartialEq)]
pub struct InfectionSource {
    pub container: ContainerId,
    /// Label such as `"home_home"`, `"work_leisure"` or `"pt"`.
    pub infection_type: String,
    pub time: SimTime,
}

/// One entry of the contact-tracing log.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TraceableContact {
    pub person: PersonId,
    /// Corrected seconds of the contact.
    pub time: f64,
}

/// Disease, quarantine and tracing state of one person.
///
/// Disease transitions only move forward along [`DiseaseStatus`] order.
/// The person occupies at most one container; the back-reference is kept in
/// sync by [`ContainerState`](crate::ContainerState).
#[derive(Clone, Debug)]
pub struct PersonState {
    id: PersonId,
    status: DiseaseStatus,
    status_changes: [Option<SimTime>; DiseaseStatus::COUNT],
    quarantine: QuarantineStatus,
    quarantine_since: Option<u32>,
    trajectory: Vec<ActivityId>,
    cursor: usize,
    traceable: bool,
    traceable_contacts: Vec<TraceableContact>,
    susceptibility: f64,
    infection: Option<InfectionSource>,
    container: Option<ContainerId>,
}

impl PersonState {
    pub fn new(id: PersonId) -> Self {
        PersonState {
            id,
            status: DiseaseStatus::Susceptible,
            status_changes: [None; DiseaseStatus::COUNT],
            quarantine: QuarantineStatus::No,
            quarantine_since: None,
            trajectory: Vec::new(),
            cursor: 0,
            traceable: true,
            traceable_contacts: Vec::new(),
            susceptibility: 1.0,
            infection: None,
            container: None,
        }
    }

    #[inline]
    pub fn id(&self) -> PersonId {
        self.id
    }

    // ── Disease ───────────────────────────────────────────────────────────

    #[inline]
    pub fn disease_status(&self) -> DiseaseStatus {
        self.status
    }

    /// Move to `status` at `now`.  Backward transitions are rejected.
    pub fn set_disease_status(&mut self, now: SimTime, status: DiseaseStatus) -> EpiResult<()> {
        if status < self.status {
            return Err(EpiError::invariant(format!(
                "{}: transition {} -> {} moves backwards",
                self.id, self.status, status
            )));
        }
        self.status = status;
        self.status_changes[status.index()] = Some(now);
        Ok(())
    }

    /// When `status` was last entered.
    #[inline]
    pub fn status_changed_at(&self, status: DiseaseStatus) -> Option<SimTime> {
        self.status_changes[status.index()]
    }

    #[inline]
    pub fn had_disease_status(&self, status: DiseaseStatus) -> bool {
        self.status_changes[status.index()].is_some()
    }

    /// Whole days between entering `status` and `day`.  The day a status is
    /// set counts as day 0.
    pub fn days_since(&self, status: DiseaseStatus, day: u32) -> Option<u32> {
        self.status_changes[status.index()].map(|t| day.saturating_sub(t.day))
    }

    // ── Quarantine ────────────────────────────────────────────────────────

    #[inline]
    pub fn quarantine_status(&self) -> QuarantineStatus {
        self.quarantine
    }

    pub fn set_quarantine_status(&mut self, status: QuarantineStatus, day: u32) {
        self.quarantine = status;
        self.quarantine_since = match status {
            QuarantineStatus::No => None,
            _ => Some(day),
        };
    }

    pub fn days_since_quarantine(&self, day: u32) -> Option<u32> {
        self.quarantine_since.map(|d| day.saturating_sub(d))
    }

    // ── Trajectory ────────────────────────────────────────────────────────

    /// Replace the day's trajectory and rewind the cursor.
    pub fn set_trajectory(&mut self, trajectory: Vec<ActivityId>) {
        self.trajectory = trajectory;
        self.cursor = 0;
    }

    pub fn trajectory(&self) -> &[ActivityId] {
        &self.trajectory
    }

    /// Activities completed so far today.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn advance_cursor(&mut self) {
        self.cursor += 1;
    }

    /// The activity at the cursor.
    pub fn current_activity(&self) -> Option<ActivityId> {
        self.trajectory.get(self.cursor).copied()
    }

    /// The activity before the cursor.
    pub fn previous_activity(&self) -> Option<ActivityId> {
        self.cursor.checked_sub(1).and_then(|i| self.trajectory.get(i).copied())
    }

    /// The activity after the cursor.
    pub fn next_activity(&self) -> Option<ActivityId> {
        self.trajectory.get(self.cursor + 1).copied()
    }

    // ── Tracing ───────────────────────────────────────────────────────────

    #[inline]
    pub fn is_traceable(&self) -> bool {
        self.traceable
    }

    pub fn set_traceable(&mut self, traceable: bool) {
        self.traceable = traceable;
    }

    /// Log a contact with `other`.  Nothing is logged unless both sides
    /// carry a tracing device.
    pub fn add_traceable_contact(&mut self, other: PersonId, other_traceable: bool, now: f64) {
        if !self.traceable || !other_traceable {
            return;
        }
        self.traceable_contacts.push(TraceableContact { person: other, time: now });
    }

    /// Persons met at or after `since`.
    pub fn traceable_contacts(&self, since: f64) -> impl Iterator<Item = PersonId> + '_ {
        self.traceable_contacts
            .iter()
            .filter(move |c| c.time >= since)
            .map(|c| c.person)
    }

    pub fn num_traceable_contacts(&self) -> usize {
        self.traceable_contacts.len()
    }

    /// Drop contacts logged before `before`.
    pub fn clear_traceable_contacts_before(&mut self, before: f64) {
        self.traceable_contacts.retain(|c| c.time >= before);
    }

    // ── Susceptibility and infection source ───────────────────────────────

    #[inline]
    pub fn susceptibility(&self) -> f64 {
        self.susceptibility
    }

    pub fn set_susceptibility(&mut self, susceptibility: f64) {
        self.susceptibility = susceptibility;
    }

    pub fn infection(&self) -> Option<&InfectionSource> {
        self.infection.as_ref()
    }

    /// Record where the infection happened.  Fails if already recorded.
    pub fn record_infection(&mut self, source: InfectionSource) -> EpiResult<()> {
        if self.infection.is_some() {
            return Err(EpiError::invariant(format!("{} infected twice", self.id)));
        }
        self.infection = Some(source);
        Ok(())
    }

    // ── Container back-reference ──────────────────────────────────────────

    #[inline]
    pub fn current_container(&self) -> Option<ContainerId> {
        self.container
    }

    pub(crate) fn set_current_container(&mut self, container: Option<ContainerId>) {
        self.container = container;
    }
}
