//! # Warden
//!
//! Warden enforces the security lifecycle of password-based accounts: it locks an
//! account after repeated login failures, expires accounts left unused for too long,
//! validates new passwords against composable rules, prevents reuse of recent
//! passwords, and tells the caller when a password change is due.
//!
//! Warden does not check credentials over the wire, issue sessions or render
//! messages. It records what happened to each account as append-only histories and
//! derives the current state from them on every decision.
//!
//! ## Storage Support
//!
//! Warden currently ships the following storage backends:
//! - In-memory (`memory` feature, enabled by default)
//!
//! Other backends implement [`warden_core::repositories::RepositoryProvider`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use warden::{LoginOutcome, WardenBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warden = WardenBuilder::new().with_memory().build()?;
//!
//!     warden.register_account("alice", "s3cretPass", "admin").await?;
//!     match warden.authenticate("alice", "s3cretPass").await? {
//!         LoginOutcome::Success(success) => {
//!             println!("welcome back, last seen {:?}", success.previous_login_at)
//!         }
//!         _ => println!("invalid credentials"),
//!     }
//!
//!     Ok(())
//! }
//! ```
pub mod builder;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use warden_core::{
    AuthError, Error, PasswordPolicyViolation, RepositoryProvider, ServiceContext,
    services::{AccountService, ExpiryService, LockoutService, LoginService, PasswordService},
};

pub use builder::{NoStorage, WardenBuilder, WardenBuilderError, WithStorage};

/// Re-export core types from warden_core
///
/// These types are commonly used when working with the Warden API.
pub use warden_core::{
    Account, AccountId, AccountState, Clock, EventBus, EventHandler, FixedClock, LoginOutcome,
    LoginSuccess, PasswordChangeRequirement, PasswordHasher, SecurityConfig, SecurityEvent,
    SystemClock, Violation,
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature is enabled.
#[cfg(feature = "memory")]
pub use warden_storage_memory::MemoryRepositoryProvider;

/// Errors that can occur when using Warden.
///
/// Rejected logins are not errors: they come back as a [`LoginOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// An account operation was refused
    #[error("Auth error: {0}")]
    Auth(AuthError),
    /// A new password broke one or more rules
    #[error("Password policy violation: {0}")]
    PasswordPolicy(PasswordPolicyViolation),
    /// Malformed input, such as an invalid login id
    #[error("Validation error: {0}")]
    Validation(String),
    /// Error when interacting with storage
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WardenError {
    /// The violated password rules, if this is a policy violation
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Self::PasswordPolicy(violation) => Some(violation.violations()),
            _ => None,
        }
    }
}

impl From<Error> for WardenError {
    fn from(error: Error) -> Self {
        match error {
            Error::Auth(e) => Self::Auth(e),
            Error::PasswordPolicy(e) => Self::PasswordPolicy(e),
            Error::Validation(e) => Self::Validation(e.to_string()),
            Error::Storage(e) => Self::Storage(e.to_string()),
        }
    }
}

/// The main Warden instance.
///
/// All services share one clock, hasher, configuration and per-account lock
/// registry, so concurrent calls for the same account are serialized across every
/// operation.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use warden::{MemoryRepositoryProvider, Warden};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let warden = Warden::new(Arc::new(MemoryRepositoryProvider::new()));
/// let account = warden.register_account("alice", "s3cretPass", "admin").await?;
/// assert!(!warden.is_locked(&account.id).await?);
/// # Ok(())
/// # }
/// ```
pub struct Warden<R: RepositoryProvider> {
    repositories: Arc<R>,
    config: SecurityConfig,
    account_service: Arc<AccountService<R>>,
    lockout_service: Arc<LockoutService<R>>,
    expiry_service: Arc<ExpiryService<R>>,
    login_service: Arc<LoginService<R>>,
    password_service: Arc<PasswordService<R>>,
}

impl<R: RepositoryProvider> Warden<R> {
    /// Create a new Warden instance with default configuration
    ///
    /// Uses the wall clock, Argon2 password hashing and [`SecurityConfig::default`].
    pub fn new(repositories: Arc<R>) -> Self {
        Self::from_context(ServiceContext::new(repositories, SecurityConfig::default()))
    }

    /// Create a Warden instance whose services all share `ctx`
    pub fn from_context(ctx: ServiceContext<R>) -> Self {
        Self {
            repositories: ctx.repositories().clone(),
            config: ctx.config().clone(),
            account_service: Arc::new(AccountService::new(ctx.clone())),
            lockout_service: Arc::new(LockoutService::new(ctx.clone())),
            expiry_service: Arc::new(ExpiryService::new(ctx.clone())),
            login_service: Arc::new(LoginService::new(ctx.clone())),
            password_service: Arc::new(PasswordService::new(ctx)),
        }
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn repositories(&self) -> &Arc<R> {
        &self.repositories
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), WardenError> {
        self.repositories
            .health_check()
            .await
            .map_err(|e| WardenError::Storage(e.to_string()))
    }

    /// Get an account by its ID
    pub async fn get_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<Account>, WardenError> {
        Ok(self.account_service.find_by_id(account_id).await?)
    }

    /// Get an account by its login id
    pub async fn get_account_by_login_id(
        &self,
        login_id: &str,
    ) -> Result<Option<Account>, WardenError> {
        Ok(self.account_service.find_by_login_id(login_id).await?)
    }
}

impl<R: RepositoryProvider> Warden<R> {
    /// Register an account with an initial password
    ///
    /// # Arguments
    ///
    /// * `login_id`: The login id of the account to register
    /// * `password`: The initial password, checked against the password rules
    /// * `operated_by`: Who registered the account
    ///
    /// # Returns
    ///
    /// Returns the registered account. Its first successful login reports
    /// [`PasswordChangeRequirement::InitialRegister`].
    pub async fn register_account(
        &self,
        login_id: &str,
        password: &str,
        operated_by: &str,
    ) -> Result<Account, WardenError> {
        Ok(self
            .password_service
            .register_account(login_id, password, operated_by)
            .await?)
    }

    /// Check a password and record the attempt
    ///
    /// Rejections are returned as a [`LoginOutcome`], not as errors. Callers
    /// showing the result to an end user should treat
    /// [`LoginOutcome::AccountNotFound`] exactly like invalid credentials.
    pub async fn authenticate(
        &self,
        login_id: &str,
        password: &str,
    ) -> Result<LoginOutcome, WardenError> {
        Ok(self.login_service.authenticate(login_id, password).await?)
    }

    /// Record a credential failure detected by an upstream check
    pub async fn record_failure(&self, login_id: &str) -> Result<LoginOutcome, WardenError> {
        Ok(self.login_service.record_failure(login_id).await?)
    }

    /// Record a credential success detected by an upstream check
    pub async fn record_success(
        &self,
        account_id: &AccountId,
    ) -> Result<LoginOutcome, WardenError> {
        Ok(self.login_service.record_success(account_id).await?)
    }

    /// When the login before the most recent one happened
    pub async fn previous_login_at(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<DateTime<Utc>>, WardenError> {
        Ok(self.login_service.previous_login_at(account_id).await?)
    }

    /// The state the next login attempt would see, without recording anything
    pub async fn account_state(&self, account_id: &AccountId) -> Result<AccountState, WardenError> {
        Ok(self.login_service.account_state(account_id).await?)
    }

    /// Change a password on behalf of its owner
    ///
    /// # Arguments
    ///
    /// * `account_id`: The account whose password changes
    /// * `old_password`: The current password for verification
    /// * `new_password`: The new password, checked against the rules and recent history
    pub async fn change_password(
        &self,
        account_id: &AccountId,
        old_password: &str,
        new_password: &str,
    ) -> Result<Account, WardenError> {
        Ok(self
            .password_service
            .change_password(account_id, old_password, new_password)
            .await?)
    }

    /// Reset a password as an administrator, unlocking the account if needed
    pub async fn reset_password(
        &self,
        account_id: &AccountId,
        new_password: &str,
        operated_by: &str,
    ) -> Result<Account, WardenError> {
        Ok(self
            .password_service
            .reset_password_to_initial(account_id, new_password, operated_by)
            .await?)
    }

    /// Why the account must change its password, if at all
    pub async fn requirement_of(
        &self,
        login_id: &str,
    ) -> Result<PasswordChangeRequirement, WardenError> {
        Ok(self.password_service.requirement_of(login_id).await?)
    }

    pub async fn is_password_change_required(&self, login_id: &str) -> Result<bool, WardenError> {
        Ok(self
            .password_service
            .is_password_change_required(login_id)
            .await?)
    }
}

impl<R: RepositoryProvider> Warden<R> {
    pub async fn is_locked(&self, account_id: &AccountId) -> Result<bool, WardenError> {
        Ok(self.lockout_service.is_locked(account_id).await?)
    }

    /// Consecutive login failures since the last unlock
    pub async fn consecutive_failures(&self, account_id: &AccountId) -> Result<u32, WardenError> {
        Ok(self.lockout_service.consecutive_failures(account_id).await?)
    }

    /// Lock an account. Returns `false` if it was already locked.
    pub async fn lock_account(
        &self,
        account_id: &AccountId,
        operated_by: &str,
    ) -> Result<bool, WardenError> {
        Ok(self
            .lockout_service
            .lock_account(account_id, operated_by)
            .await?)
    }

    /// Unlock an account. Returns `false` if it was not locked.
    pub async fn unlock_account(
        &self,
        account_id: &AccountId,
        operated_by: &str,
    ) -> Result<bool, WardenError> {
        Ok(self
            .lockout_service
            .unlock_account(account_id, operated_by)
            .await?)
    }

    pub async fn is_expired(&self, account_id: &AccountId) -> Result<bool, WardenError> {
        Ok(self.expiry_service.is_expired(account_id).await?)
    }

    /// Expire the account now if it has been inactive for too long
    pub async fn evaluate_expiry(&self, account_id: &AccountId) -> Result<bool, WardenError> {
        Ok(self
            .expiry_service
            .evaluate_and_expire_if_needed(account_id)
            .await?)
    }

    /// Reactivate an expired account. Returns `false` if it was not expired.
    pub async fn unexpire_account(
        &self,
        account_id: &AccountId,
        operated_by: &str,
    ) -> Result<bool, WardenError> {
        Ok(self
            .expiry_service
            .unexpire_if_expired(account_id, operated_by)
            .await?)
    }

    /// Enable an account, unexpiring it if it had expired
    pub async fn enable_account(
        &self,
        account_id: &AccountId,
        operated_by: &str,
    ) -> Result<Account, WardenError> {
        Ok(self.account_service.enable(account_id, operated_by).await?)
    }

    pub async fn disable_account(&self, account_id: &AccountId) -> Result<Account, WardenError> {
        Ok(self.account_service.disable(account_id).await?)
    }

    /// Logically delete an account. This cannot be undone.
    pub async fn delete_account(&self, account_id: &AccountId) -> Result<Account, WardenError> {
        Ok(self.account_service.delete(account_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{StorageError, ValidationError};

    #[test]
    fn test_error_mapping() {
        let err: WardenError = Error::Auth(AuthError::AccountLocked).into();
        assert!(matches!(err, WardenError::Auth(AuthError::AccountLocked)));

        let err: WardenError =
            Error::Storage(StorageError::Constraint("login_id".into())).into();
        assert!(matches!(err, WardenError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: Constraint violation: login_id");

        let err: WardenError =
            Error::Validation(ValidationError::InvalidLoginId("bad id".into())).into();
        assert_eq!(
            err.to_string(),
            "Validation error: Invalid login id: bad id"
        );
        assert!(err.violations().is_none());
    }

    #[test]
    fn test_policy_violations_are_kept() {
        let violation =
            PasswordPolicyViolation::new(vec![Violation::new("password.required", vec![])]);
        let err: WardenError = Error::PasswordPolicy(violation).into();
        let violations = err.violations().unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].key, "password.required");
    }
}
