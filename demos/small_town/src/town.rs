//! Synthetic weekly movements of a small town.
//!
//! Households of one to four persons share a home.  The first member
//! commutes by bus to an office, the second either commutes too or runs
//! errands as a retiree, further members walk to school.  On Fridays
//! commuters go to a pub after work; on Saturdays everyone shops and some
//! go out in the evening.  Sunday has no movements and replays Saturday.

use ep_core::{DayOfWeek, SimRng};
use ep_provider::Movement;

pub const OFFICES:   usize = 6;
pub const SCHOOLS:   usize = 2;
pub const PUBS:      usize = 3;
pub const SHOPS:     usize = 4;
pub const BUS_LINES: usize = 3;

const HOUR: u32 = 3_600;
const BUS_RIDE: u32 = 1_200;

const WEEKDAYS: [DayOfWeek; 5] = [
    DayOfWeek::Monday,
    DayOfWeek::Tuesday,
    DayOfWeek::Wednesday,
    DayOfWeek::Thursday,
    DayOfWeek::Friday,
];

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Role {
    Commuter,
    Retiree,
    Pupil,
}

pub fn bus(line: usize) -> String {
    format!("bus_{line}")
}

/// One day of one person, recorded stay by stay.
struct DayPlan<'a> {
    day:    DayOfWeek,
    person: &'a str,
    out:    &'a mut Vec<Movement>,
    /// Current container and activity type.
    at:     (String, String),
}

impl<'a> DayPlan<'a> {
    /// Every day starts at home.
    fn start(day: DayOfWeek, person: &'a str, home: &str, out: &'a mut Vec<Movement>) -> Self {
        DayPlan { day, person, out, at: (home.to_string(), "home".to_string()) }
    }

    /// Leave the current place at `time` and walk to `container`.
    fn go(&mut self, time: u32, container: &str, activity_type: &str) {
        let (from, from_type) = &self.at;
        self.out.push(Movement::leave(self.day, self.person, from, from_type, time));
        self.out.push(Movement::enter(self.day, self.person, container, activity_type, time));
        self.at = (container.to_string(), activity_type.to_string());
    }

    /// Ride `line` from `time` and arrive at `container`.
    fn ride(&mut self, time: u32, line: usize, container: &str, activity_type: &str) {
        let bus = bus(line);
        let (from, from_type) = self.at.clone();
        self.out.push(Movement::leave(self.day, self.person, &from, &from_type, time));
        self.out.push(Movement::enter(self.day, self.person, &bus, "", time).by_vehicle());
        self.out.push(Movement::leave(self.day, self.person, &bus, "", time + BUS_RIDE).by_vehicle());
        self.out.push(Movement::enter(self.day, self.person, container, activity_type, time + BUS_RIDE));
        self.at = (container.to_string(), activity_type.to_string());
    }
}

/// Movements of `households` households for one week, in no particular
/// order.
pub fn build_movements(households: usize, rng: &mut SimRng) -> Vec<Movement> {
    let mut out = Vec::new();
    for h in 0..households {
        let home = format!("home_{h}");
        let size = 1 + rng.index(4);
        for m in 0..size {
            let person = format!("p{h}_{m}");
            let role = match m {
                0 => Role::Commuter,
                1 if rng.bernoulli(0.7) => Role::Commuter,
                1 => Role::Retiree,
                _ => Role::Pupil,
            };
            let line = h % BUS_LINES;
            let office = format!("office_{}", rng.index(OFFICES));
            let school = format!("school_{}", h % SCHOOLS);

            for day in WEEKDAYS {
                let mut plan = DayPlan::start(day, &person, &home, &mut out);
                match role {
                    Role::Commuter => {
                        plan.ride(7 * HOUR + jitter(rng, HOUR), line, &office, "work");
                        if day == DayOfWeek::Friday && rng.bernoulli(0.4) {
                            let venue = format!("pub_{}", rng.index(PUBS));
                            plan.go(17 * HOUR + jitter(rng, HOUR), &venue, "leisure");
                            plan.go(21 * HOUR + jitter(rng, HOUR), &home, "home");
                        } else {
                            plan.ride(16 * HOUR + jitter(rng, 2 * HOUR), line, &home, "home");
                        }
                    }
                    Role::Retiree => {
                        let shop = format!("shop_{}", rng.index(SHOPS));
                        plan.go(10 * HOUR + jitter(rng, HOUR), &shop, "errand");
                        plan.go(11 * HOUR + jitter(rng, HOUR), &home, "home");
                    }
                    Role::Pupil => {
                        plan.go(7 * HOUR + HOUR / 2, &school, "educ_primary");
                        plan.go(13 * HOUR + HOUR / 2, &home, "home");
                    }
                }
            }

            let mut saturday = DayPlan::start(DayOfWeek::Saturday, &person, &home, &mut out);
            let shop = format!("shop_{}", rng.index(SHOPS));
            saturday.go(9 * HOUR + jitter(rng, 3 * HOUR), &shop, "shopping");
            saturday.go(13 * HOUR + jitter(rng, HOUR), &home, "home");
            if role != Role::Pupil && rng.bernoulli(0.3) {
                let venue = format!("pub_{}", rng.index(PUBS));
                saturday.go(19 * HOUR + jitter(rng, HOUR), &venue, "leisure");
                saturday.go(23 * HOUR, &home, "home");
            }
        }
    }
    out
}

fn jitter(rng: &mut SimRng, range: u32) -> u32 {
    rng.index(range as usize) as u32
}
