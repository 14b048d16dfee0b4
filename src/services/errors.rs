use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::repository::errors::RepositoryError;

/// Errors surfaced by the discovery services to the presentation layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed filter input caught before anything was dispatched.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure, including timeouts. Retryable.
    #[error("network error: {0}")]
    Network(String),

    #[error("not found")]
    NotFound,

    /// Missing, expired or insufficient credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Requested state already holds on the backend.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Network(_))
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::Network(message) => ServiceError::Network(message),
            RepositoryError::Timeout => ServiceError::Network("request timed out".to_string()),
            RepositoryError::Unauthorized(message) => ServiceError::Unauthorized(message),
            RepositoryError::Conflict(message) => ServiceError::Conflict(message),
            RepositoryError::ValidationError(message) => ServiceError::Validation(message),
            RepositoryError::InvalidResponse(message) | RepositoryError::Unexpected(message) => {
                ServiceError::Unexpected(message)
            }
        }
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}
