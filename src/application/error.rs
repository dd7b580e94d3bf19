//! Application-level error taxonomy.
//!
//! InvalidArgument and NotFound are local and terminal. Unavailable is
//! produced only after the resilience policy has been exhausted (or the
//! circuit is open) and carries the dependency name for the logs.
//! Duplicate likes are not errors at all; they surface as an
//! idempotent-ack outcome in the like service.

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::resilience::GuardError;

use super::repos::RepoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("`{dependency}` is unavailable")]
    Unavailable { dependency: &'static str },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl AppError {
    /// Collapse a guard failure into the application taxonomy.
    /// `entity` names what a pass-through NotFound refers to.
    pub fn from_guard(err: GuardError, entity: &'static str) -> Self {
        match err {
            GuardError::CircuitOpen { dependency }
            | GuardError::Timeout { dependency, .. }
            | GuardError::Unavailable { dependency, .. } => Self::Unavailable { dependency },
            GuardError::Rejected(RepoError::NotFound) => Self::NotFound(entity),
            GuardError::Rejected(RepoError::Duplicate { constraint }) => {
                Self::Conflict(format!("duplicate `{constraint}`"))
            }
            GuardError::Rejected(RepoError::InvalidInput { message }) => {
                Self::InvalidArgument(message)
            }
            GuardError::Rejected(other) => Self::Internal(other.to_string()),
        }
    }
}
