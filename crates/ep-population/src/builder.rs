//! Fluent builder for a [`Population`].
//!
//! # Usage
//!
//! ```rust
//! use ep_core::{ContainerInfo, SimRng};
//! use ep_population::PopulationBuilder;
//!
//! let containers = vec![ContainerInfo::facility("home_1"), ContainerInfo::vehicle("bus_1")];
//! let mut init_rng = SimRng::for_init(42);
//!
//! let population = PopulationBuilder::new(100)
//!     .containers(&containers)
//!     .equipment_rate(0.6)
//!     .build(&mut init_rng)
//!     .unwrap();
//!
//! assert_eq!(population.num_persons(), 100);
//! assert!(population.containers()[1].is_vehicle());
//! ```

use ep_core::{ContainerId, ContainerInfo, EpiResult, PersonId, SimRng};

use crate::{ContainerState, PersonState, Population};

/// Fluent builder for [`Population`].
pub struct PopulationBuilder<'a> {
    num_persons: usize,
    containers: &'a [ContainerInfo],
    equipment_rate: f64,
}

impl<'a> PopulationBuilder<'a> {
    /// Create a builder for `num_persons` persons, all susceptible.
    pub fn new(num_persons: usize) -> Self {
        PopulationBuilder { num_persons, containers: &[], equipment_rate: 1.0 }
    }

    /// Containers in id order, with their preprocessed statistics.
    pub fn containers(mut self, containers: &'a [ContainerInfo]) -> Self {
        self.containers = containers;
        self
    }

    /// Probability that a person carries a tracing device.
    pub fn equipment_rate(mut self, rate: f64) -> Self {
        self.equipment_rate = rate;
        self
    }

    /// Create the population.  One traceability draw per person is taken
    /// from `init_rng`, in person order.
    pub fn build(self, init_rng: &mut SimRng) -> EpiResult<Population> {
        let persons = (0..self.num_persons)
            .map(|i| {
                let mut p = PersonState::new(PersonId(i as u32));
                p.set_traceable(init_rng.bernoulli(self.equipment_rate));
                p
            })
            .collect();
        let containers = self
            .containers
            .iter()
            .enumerate()
            .map(|(i, info)| ContainerState::from_info(ContainerId(i as u32), info))
            .collect();
        Population::new(persons, containers)
    }
}
