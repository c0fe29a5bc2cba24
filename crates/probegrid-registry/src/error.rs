//! Registry error types.

use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service already registered: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid service spec: {0}")]
    InvalidSpec(String),

    #[error("state store error: {0}")]
    State(#[from] probegrid_state::StateError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
