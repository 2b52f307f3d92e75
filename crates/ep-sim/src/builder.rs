//! Fluent builder for constructing a [`Simulation`].

use std::sync::Arc;

use ep_core::EpiConfig;
use ep_model::{
    ContactModel, DefaultContactModel, DefaultInfectionModel, DefaultProgressionModel, DirectContactModel,
    FixedPolicy, InfectionModel, ProgressionModel, RestrictionPolicy, Restrictions,
};
use ep_provider::EventProvider;

use crate::{InfectionEventHandler, SimError, SimResult, Simulation};

/// Which [`ContactModel`] a run uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ContactModelKind {
    /// Samples up to `max_contacts` contacts of every leave event.
    #[default]
    Default,
    /// Pairs persons as they enter facilities.
    Direct,
}

/// Fluent builder for [`Simulation`].
///
/// # Required inputs
///
/// - an initialized `EventProvider`, borrowed for the lifetime of the run
/// - [`EpiConfig`]: seed, sampling, tracing and import settings, params
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                                      |
/// |----------------------|----------------------------------------------|
/// | `.contact_model(k)`  | `ContactModelKind::Default`                  |
/// | `.infection_model(m)`| `DefaultInfectionModel::from_config`         |
/// | `.progression(m)`    | `DefaultProgressionModel::from_config`       |
/// | `.policy(p)`         | `FixedPolicy` with every group open          |
///
/// # Example
///
/// ```rust,ignore
/// let mut provider = ScenarioProvider::new(movements, &config)?;
/// provider.init()?;
/// let mut sim = SimBuilder::new(&provider, config)
///     .contact_model(ContactModelKind::Direct)
///     .build()?;
/// let last = sim.run(56, &mut NoopObserver)?;
/// ```
pub struct SimBuilder<'p> {
    provider:    &'p dyn EventProvider,
    config:      EpiConfig,
    contact:     ContactModelKind,
    infection:   Option<Box<dyn InfectionModel>>,
    progression: Option<Box<dyn ProgressionModel>>,
    policy:      Option<Box<dyn RestrictionPolicy>>,
}

impl<'p> SimBuilder<'p> {
    /// Create a builder with all required inputs.
    pub fn new(provider: &'p dyn EventProvider, config: EpiConfig) -> Self {
        SimBuilder {
            provider,
            config,
            contact: ContactModelKind::Default,
            infection: None,
            progression: None,
            policy: None,
        }
    }

    pub fn contact_model(mut self, kind: ContactModelKind) -> Self {
        self.contact = kind;
        self
    }

    /// Replace the transmission probability function.
    pub fn infection_model(mut self, model: impl InfectionModel + 'static) -> Self {
        self.infection = Some(Box::new(model));
        self
    }

    pub fn progression(mut self, model: impl ProgressionModel + 'static) -> Self {
        self.progression = Some(Box::new(model));
        self
    }

    /// Policy deciding the restrictions of every day.
    pub fn policy(mut self, policy: impl RestrictionPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Validate the config and assemble a ready-to-run [`Simulation`].
    pub fn build(self) -> SimResult<Simulation<'p>> {
        self.config.validate().map_err(|e| SimError::Config(e.to_string()))?;
        let config = self.config;

        let dictionary = Arc::clone(self.provider.dictionary());
        for name in dictionary.names() {
            if !config.infection_params.iter().any(|p| p.container_name == name) {
                return Err(SimError::Config(format!("provider activity group {name:?} has no infection params")));
            }
        }

        let infection = self.infection.unwrap_or_else(|| Box::new(DefaultInfectionModel::from_config(&config)));
        let contact_model: Box<dyn ContactModel> = match self.contact {
            ContactModelKind::Default => Box::new(DefaultContactModel::new(&config, dictionary, infection)),
            ContactModelKind::Direct => Box::new(DirectContactModel::new(&config, dictionary, infection)),
        };
        let progression =
            self.progression.unwrap_or_else(|| Box::new(DefaultProgressionModel::from_config(&config)));
        let policy = self.policy.unwrap_or_else(|| Box::new(FixedPolicy::new(Restrictions::for_config(&config))));

        Ok(Simulation {
            provider: self.provider,
            handler: InfectionEventHandler::new(config, contact_model, progression, policy),
        })
    }
}
