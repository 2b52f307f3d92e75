use ep_core::EpiError;
use thiserror::Error;

/// Errors raised while building, reading or writing contact graphs.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("size mismatch: header declares {expected} record bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("unknown event type byte {0}")]
    UnknownEventType(u8),

    #[error("corrupt contact graph: {0}")]
    Corrupt(String),

    #[error("archive has no '{0}' entry")]
    MissingEntry(String),

    #[error(transparent)]
    Core(#[from] EpiError),
}

impl GraphError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        GraphError::Corrupt(msg.into())
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
