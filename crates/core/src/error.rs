//! Domain error model.

use thiserror::Error;

/// Result type used across the ledger domain.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// The first four variants are business failures that callers surface as-is.
/// `Internal` covers persistence failures inside an atomic posting unit; the
/// unit is rolled back before the error is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input (non-positive price, negative quantity, missing field, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An account, pending entry or other record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A pending entry has already been consumed by a posting.
    #[error("already processed: {0}")]
    AlreadyProcessed(String),

    /// A uniqueness rule was violated (duplicate voucher or reference).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn already_processed(msg: impl Into<String>) -> Self {
        Self::AlreadyProcessed(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::AlreadyProcessed(_) => "already_processed",
            DomainError::Conflict(_) => "conflict",
            DomainError::Internal(_) => "internal_error",
        }
    }
}
