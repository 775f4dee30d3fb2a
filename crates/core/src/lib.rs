//! Shared primitives for all Rust crates in Tallyflow.

#![forbid(unsafe_code)]

/// Caller identity primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::ActorContext;

/// Result type used across Tallyflow crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Tenant identifier used as the partition key for every persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input; the caller can correct and retry.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Principal has no role assignment in the tenant.
    #[error("unknown principal: {0}")]
    UnknownPrincipal(String),

    /// Known principal whose grant does not cover the requested resource.
    ///
    /// Carries the resource name only; the denial reason is logged, never returned.
    #[error("access restricted: {0}")]
    Unauthorized(String),

    /// Action is not legal from the record's current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Caller's expected version no longer matches the stored record.
    #[error("stale state: {0}")]
    StaleState(String),

    /// Ledger coding was already stamped with different values.
    #[error("already posted: {0}")]
    AlreadyPosted(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller did not present an identity.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::UnknownPrincipal(_) => "unknown_principal",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::StaleState(_) => "stale_state",
            Self::AlreadyPosted(_) => "already_posted",
            Self::Conflict(_) => "conflict",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns whether the caller may retry after re-reading state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleState(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString, TenantId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn tenant_id_formats_as_uuid() {
        let tenant_id = TenantId::new();
        assert_eq!(tenant_id.to_string().len(), 36);
    }

    #[test]
    fn only_stale_state_is_retryable() {
        assert!(AppError::StaleState("record".to_owned()).is_retryable());
        assert!(!AppError::InvalidTransition("record".to_owned()).is_retryable());
        assert!(!AppError::Unauthorized("expense".to_owned()).is_retryable());
    }

    #[test]
    fn unauthorized_message_names_resource_only() {
        let error = AppError::Unauthorized("purchase_order".to_owned());
        assert_eq!(error.to_string(), "access restricted: purchase_order");
        assert_eq!(error.code(), "unauthorized");
    }
}
