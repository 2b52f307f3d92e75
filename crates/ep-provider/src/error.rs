use ep_core::{DayOfWeek, EpiError};
use ep_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("movement parse error: {0}")]
    Parse(String),

    #[error("inconsistent movements: {0}")]
    Inconsistent(String),

    #[error("provider used before init()")]
    NotInitialized,

    #[error("no events stored for {0} or any earlier weekday")]
    NoEvents(DayOfWeek),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Core(#[from] EpiError),
}

pub type ProviderResult<T> = Result<T, ProviderError>;
