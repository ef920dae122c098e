//! Service layer for account security decisions
//!
//! Services read histories through the repository ports, hand them to the pure
//! policies in [`crate::policy`], and commit whatever the policies decide as one
//! [`ChangeSet`]. Every public operation that writes takes the account's guard from
//! [`AccountLocks`] for the whole read-decide-commit sequence.
//!
//! All services share one [`ServiceContext`], so they agree on the clock, the
//! hasher, the configuration and the lock registry.

pub mod account;
pub mod expiry;
pub mod lockout;
pub mod login;
pub mod password;

pub use account::AccountService;
pub use expiry::ExpiryService;
pub use lockout::LockoutService;
pub use login::{AccountState, LoginOutcome, LoginService, LoginSuccess};
pub use password::PasswordService;

use std::sync::Arc;

use crate::{
    Account, AccountId, Error, SecurityConfig,
    clock::{Clock, SystemClock},
    crypto::{Argon2PasswordHasher, PasswordHasher},
    error::AuthError,
    events::{EventBus, SecurityEvent, publish},
    locks::{AccountGuard, AccountLocks},
    policy::PasswordPolicy,
    repositories::{AccountRepository, ChangeSet, JournalRepository, RepositoryProvider},
};

/// Collaborators shared by every service.
pub struct ServiceContext<R: RepositoryProvider> {
    repositories: Arc<R>,
    config: Arc<SecurityConfig>,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn PasswordHasher>,
    password_policy: Arc<dyn PasswordPolicy>,
    locks: Arc<AccountLocks>,
    event_bus: Option<EventBus>,
}

impl<R: RepositoryProvider> Clone for ServiceContext<R> {
    fn clone(&self) -> Self {
        Self {
            repositories: self.repositories.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            hasher: self.hasher.clone(),
            password_policy: self.password_policy.clone(),
            locks: self.locks.clone(),
            event_bus: self.event_bus.clone(),
        }
    }
}

impl<R: RepositoryProvider> ServiceContext<R> {
    /// Wall clock, Argon2 hashing and the standard password rules for `config`.
    pub fn new(repositories: Arc<R>, config: SecurityConfig) -> Self {
        let password_policy = Arc::new(config.password_policy());
        Self {
            repositories,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
            hasher: Arc::new(Argon2PasswordHasher),
            password_policy,
            locks: Arc::new(AccountLocks::new()),
            event_bus: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the rules built from `SecurityConfig::min_password_length`.
    pub fn with_password_policy(mut self, password_policy: Arc<dyn PasswordPolicy>) -> Self {
        self.password_policy = password_policy;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn repositories(&self) -> &Arc<R> {
        &self.repositories
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn locks(&self) -> &Arc<AccountLocks> {
        &self.locks
    }

    pub fn event_bus(&self) -> Option<&EventBus> {
        self.event_bus.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn hasher(&self) -> &dyn PasswordHasher {
        self.hasher.as_ref()
    }

    pub(crate) fn password_policy(&self) -> &dyn PasswordPolicy {
        self.password_policy.as_ref()
    }

    pub(crate) async fn require_account(&self, account_id: &AccountId) -> Result<Account, Error> {
        self.repositories
            .account()
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound.into())
    }

    /// Take the account's guard and read the account under it.
    ///
    /// Unknown ids are rejected before the guard is requested, so they never
    /// reach the lock registry.
    pub(crate) async fn guard_account(
        &self,
        account_id: &AccountId,
    ) -> Result<(AccountGuard<'_>, Account), Error> {
        self.require_account(account_id).await?;
        let guard = self.locks.acquire(account_id).await;
        let account = self.require_account(account_id).await?;
        Ok((guard, account))
    }

    pub(crate) async fn commit(&self, changes: ChangeSet) -> Result<(), Error> {
        if changes.is_empty() {
            return Ok(());
        }
        self.repositories.journal().commit(changes).await
    }

    pub(crate) async fn publish(&self, events: Vec<SecurityEvent>) {
        publish(self.event_bus.as_ref(), events).await;
    }
}
