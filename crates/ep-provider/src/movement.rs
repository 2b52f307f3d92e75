//! Raw movements and their CSV loader.
//!
//! # CSV format
//!
//! One row per container entry or exit.  Rows need not be sorted; the
//! provider orders each weekday by `time`, keeping file order for ties.
//!
//! ```csv
//! day,person,container,vehicle,activity_type,time,kind
//! MONDAY,p1,home_1,false,home,0,leave
//! MONDAY,p1,bus_7,true,,25200,enter
//! MONDAY,p1,bus_7,true,,27000,leave
//! MONDAY,p1,office_3,false,work,27000,enter
//! ```
//!
//! | Column          | Meaning                                               |
//! |-----------------|-------------------------------------------------------|
//! | `day`           | weekday name, any case                                |
//! | `person`        | external person id                                    |
//! | `container`     | external facility or vehicle id                       |
//! | `vehicle`       | `true` for vehicles; optional, defaults to `false`    |
//! | `activity_type` | raw activity type; ignored for vehicles               |
//! | `time`          | seconds of day                                        |
//! | `kind`          | `enter` or `leave`                                    |

use std::io::Read;
use std::path::Path;

use ep_core::DayOfWeek;
use serde::Deserialize;

use crate::ProviderError;

/// Direction of a movement.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MovementKind {
    Enter,
    Leave,
}

/// One person entering or leaving one container on one weekday.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Movement {
    pub day: DayOfWeek,
    pub person: String,
    pub container: String,
    pub vehicle: bool,
    /// Raw activity type such as `"work_8h"`.  Empty for vehicle legs.
    pub activity_type: String,
    /// Seconds of day.
    pub time: u32,
    pub kind: MovementKind,
}

impl Movement {
    pub fn enter(day: DayOfWeek, person: &str, container: &str, activity_type: &str, time: u32) -> Self {
        Movement {
            day,
            person: person.to_string(),
            container: container.to_string(),
            vehicle: false,
            activity_type: activity_type.to_string(),
            time,
            kind: MovementKind::Enter,
        }
    }

    pub fn leave(day: DayOfWeek, person: &str, container: &str, activity_type: &str, time: u32) -> Self {
        Movement { kind: MovementKind::Leave, ..Self::enter(day, person, container, activity_type, time) }
    }

    /// Mark the container as a vehicle.
    pub fn by_vehicle(mut self) -> Self {
        self.vehicle = true;
        self.activity_type.clear();
        self
    }
}

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MovementRecord {
    day:           String,
    person:        String,
    container:     String,
    #[serde(default)]
    vehicle:       bool,
    #[serde(default)]
    activity_type: String,
    time:          u32,
    kind:          String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load movements from a CSV file.
pub fn load_movements_csv(path: &Path) -> Result<Vec<Movement>, ProviderError> {
    let file = std::fs::File::open(path).map_err(ProviderError::Io)?;
    load_movements_reader(file)
}

/// Like [`load_movements_csv`] but accepts any `Read` source.
pub fn load_movements_reader<R: Read>(reader: R) -> Result<Vec<Movement>, ProviderError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut movements = Vec::new();

    for (line, result) in csv_reader.deserialize::<MovementRecord>().enumerate() {
        let row = result.map_err(|e| ProviderError::Parse(e.to_string()))?;
        movements.push(Movement {
            day: parse_day(&row.day, line)?,
            person: row.person,
            container: row.container,
            vehicle: row.vehicle,
            activity_type: row.activity_type,
            time: row.time,
            kind: parse_kind(&row.kind, line)?,
        });
    }

    Ok(movements)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_day(s: &str, line: usize) -> Result<DayOfWeek, ProviderError> {
    DayOfWeek::from_name(s.trim())
        .ok_or_else(|| ProviderError::Parse(format!("row {}: invalid day {s:?}", line + 1)))
}

fn parse_kind(s: &str, line: usize) -> Result<MovementKind, ProviderError> {
    match s.trim() {
        "enter" => Ok(MovementKind::Enter),
        "leave" => Ok(MovementKind::Leave),
        k => Err(ProviderError::Parse(format!(
            "row {}: invalid kind {k:?}: expected \"enter\" or \"leave\"",
            line + 1
        ))),
    }
}
