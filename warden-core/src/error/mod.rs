pub mod utilities;

use thiserror::Error;

use crate::policy::Violation;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Password policy violation: {0}")]
    PasswordPolicy(#[from] PasswordPolicyViolation),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Never surfaced to an end user with detail; treat like `InvalidCredentials`.
    #[error("Account not found")]
    AccountNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked")]
    AccountLocked,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Account expired")]
    AccountExpired,

    #[error("Account already exists")]
    AccountAlreadyExists,

    #[error("Password was used recently and cannot be reused")]
    PasswordReuseNotAllowed,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid login id: {0}")]
    InvalidLoginId(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Every rule violation found for one candidate password.
///
/// Violations carry message keys and arguments; rendering them is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} rule(s) violated: {}", .violations.len(), keys(.violations))]
pub struct PasswordPolicyViolation {
    pub violations: Vec<Violation>,
}

impl PasswordPolicyViolation {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn contains(&self, key: &str) -> bool {
        self.violations.iter().any(|v| v.key == key)
    }
}

fn keys(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.key)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returned by an event handler. Publishing logs it and moves on, so it never
/// fails the operation that raised the event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event handler error: {0}")]
    HandlerError(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// True for failures a caller should present as a generic credential failure.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::InvalidCredentials) | Error::Auth(AuthError::AccountNotFound)
        )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::PasswordPolicy(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
