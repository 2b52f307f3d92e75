//! Base error type.
//!
//! Sub-crates define their own error enums and wrap `EpiError` as one
//! variant via `#[from]`, so `?` carries core failures up unchanged.

use thiserror::Error;

use crate::{ContainerId, PersonId};

/// The top-level error type for `ep-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum EpiError {
    /// A broken simulation invariant.  Always fatal for the run.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("person {0} not found")]
    PersonNotFound(PersonId),

    #[error("container {0} not found")]
    ContainerNotFound(ContainerId),

    #[error("unknown activity: {0}")]
    UnknownActivity(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EpiError {
    /// Shorthand for building an [`EpiError::Invariant`].
    pub fn invariant(msg: impl Into<String>) -> Self {
        EpiError::Invariant(msg.into())
    }
}

/// Shorthand result type for all `ep-*` crates.
pub type EpiResult<T> = Result<T, EpiError>;
