use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::{round_ledger::LedgerError, storage::StorageError},
    state::{InvalidTransition, snapshot::InvalidSnapshot},
};

/// Errors that can occur in round and service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Invalid(message) => ServiceError::InvalidInput(message),
            LedgerError::NotFound(id) => ServiceError::NotFound(format!("round `{id}` not found")),
            LedgerError::Storage(source) => ServiceError::Unavailable(source),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {}", err))
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<InvalidSnapshot> for ServiceError {
    fn from(err: InvalidSnapshot) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}
