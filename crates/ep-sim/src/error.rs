use ep_core::EpiError;
use ep_graph::GraphError;
use ep_provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("infection event handler used before init")]
    NotInitialized,

    #[error("iteration {got} out of order: expected {expected}")]
    IterationOrder {
        expected: u32,
        got:      u32,
    },

    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] EpiError),

    #[error("event provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("contact graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type SimResult<T> = Result<T, SimError>;
