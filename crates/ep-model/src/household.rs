//! Household-level susceptibility sampling.

use ep_core::{ContainerId, HouseholdSusceptibilityConfig, PersonId, SimRng};
use ep_population::PersonState;
use rustc_hash::FxHashMap;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
enum Household {
    Home(ContainerId),
    /// A person without a home forms a household of one.
    Alone(PersonId),
}

/// Give every member of a sampled household the configured susceptibility.
///
/// `homes[i]` is the home container of person `i`, if known.  Households are
/// sampled in order of their first member, one draw each from `init_rng`.
/// Nothing is drawn when `p_households` is zero.
///
/// Returns the number of persons whose susceptibility changed.
pub fn apply_household_susceptibility(
    persons:  &mut [PersonState],
    homes:    &[Option<ContainerId>],
    config:   &HouseholdSusceptibilityConfig,
    init_rng: &mut SimRng,
) -> usize {
    if config.p_households <= 0.0 {
        return 0;
    }

    let mut sampled: FxHashMap<Household, f64> = FxHashMap::default();
    let mut changed = 0;
    for person in persons.iter_mut() {
        let key = match homes.get(person.id().index()).copied().flatten() {
            Some(home) => Household::Home(home),
            None => Household::Alone(person.id()),
        };
        let susceptibility = *sampled.entry(key).or_insert_with(|| {
            if init_rng.uniform() < config.p_households { config.susceptibility } else { 1.0 }
        });
        if susceptibility != 1.0 {
            changed += 1;
        }
        person.set_susceptibility(susceptibility);
    }
    log::info!(
        "household susceptibility {} applied to {changed} persons in {} households",
        config.susceptibility,
        sampled.len()
    );
    changed
}
