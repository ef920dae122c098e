//! The login state machine.
//!
//! Every attempt against an existing account leaves exactly one
//! [`LoginAttemptEvent`], and possibly an `Expire` or lock event alongside it. State
//! is never cached: each attempt re-derives it from the histories, under the
//! account's guard, in a fixed order.
//!
//! | Order | Check                                | Recorded result | Outcome                  |
//! | ----- | ------------------------------------ | --------------- | ------------------------ |
//! | 1     | account does not exist               | nothing         | `AccountNotFound`        |
//! | 2     | expired, or inactive for too long    | `EXPIRED`       | `Expired`                |
//! | 3     | disabled or deleted                  | `DISABLED`      | `Disabled`               |
//! | 4     | locked                               | `LOCKED`        | `Locked`                 |
//! | 5     | otherwise                            | `FAIL`          | `InvalidCredentials`     |
//!
//! A `FAIL` that brings the consecutive count since the last unlock to the
//! threshold also appends `LockEvent(LOGIN_FAIL_THRESHOLD)`.
//!
//! Outcomes are differentiated on purpose. Whether an end user sees "locked" or a
//! generic "invalid credentials" is the integrator's call; `AccountNotFound` in
//! particular must not be shown as such.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    Account, AccountId, Error,
    error::AuthError,
    events::SecurityEvent,
    history::{EventLog, LockEvent, LoginAttemptEvent, LoginResult, SYSTEM_OPERATOR},
    policy::{LockoutPolicy, PasswordChangeRequirement},
    repositories::{
        AccountRepository, ChangeSet, LoginHistoryRepository, PasswordHistoryRepository,
        RepositoryProvider,
    },
    services::{
        ServiceContext,
        expiry::{ExpiryCheck, check_expiry},
        lockout::{locked_notification, recent_lock_events},
    },
};

/// State of an account as the next login attempt would see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountState {
    Active,
    Expired,
    Disabled,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub account: Account,
    /// The successful login before this one, for "last signed in" displays.
    pub previous_login_at: Option<DateTime<Utc>>,
    pub password_change: PasswordChangeRequirement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(LoginSuccess),
    AccountNotFound,
    InvalidCredentials {
        consecutive_failures: u32,
        /// This attempt crossed the threshold and locked the account.
        lock_triggered: bool,
    },
    Locked,
    Disabled,
    Expired,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(self) -> Option<LoginSuccess> {
        match self {
            Self::Success(success) => Some(success),
            _ => None,
        }
    }

    /// The matching [`AuthError`] for a rejected attempt, `None` on success.
    pub fn as_error(&self) -> Option<AuthError> {
        match self {
            Self::Success(_) => None,
            Self::AccountNotFound => Some(AuthError::AccountNotFound),
            Self::InvalidCredentials { .. } => Some(AuthError::InvalidCredentials),
            Self::Locked => Some(AuthError::AccountLocked),
            Self::Disabled => Some(AuthError::AccountDisabled),
            Self::Expired => Some(AuthError::AccountExpired),
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<LoginSuccess, Error> {
        match self {
            Self::Success(success) => Ok(success),
            other => Err(other
                .as_error()
                .unwrap_or(AuthError::InvalidCredentials)
                .into()),
        }
    }
}

/// What one evaluation read from the histories.
struct Snapshot {
    expiry: ExpiryCheck,
    lock_events: EventLog<LockEvent>,
}

impl Snapshot {
    fn state(&self, account: &Account) -> AccountState {
        if self.expiry.is_expired() {
            AccountState::Expired
        } else if !account.can_login() {
            AccountState::Disabled
        } else if LockoutPolicy::is_locked(&self.lock_events) {
            AccountState::Locked
        } else {
            AccountState::Active
        }
    }
}

/// Service that records login attempts and classifies them
pub struct LoginService<R: RepositoryProvider> {
    ctx: ServiceContext<R>,
}

impl<R: RepositoryProvider> LoginService<R> {
    pub fn new(ctx: ServiceContext<R>) -> Self {
        Self { ctx }
    }

    /// Check a password and record the attempt.
    ///
    /// The password is only compared when the account is active; a blocked account
    /// is reported as blocked whatever password was supplied.
    pub async fn authenticate(
        &self,
        login_id: &str,
        raw_password: &str,
    ) -> Result<LoginOutcome, Error> {
        let Some(found) = self.find_by_login_id(login_id).await? else {
            return Ok(LoginOutcome::AccountNotFound);
        };

        let _guard = self.ctx.locks().acquire(&found.id).await;
        let Some(account) = self.reload(&found.id).await? else {
            return Ok(LoginOutcome::AccountNotFound);
        };

        let now = self.ctx.clock().now();
        let snapshot = self.snapshot(&account.id, now).await?;

        if snapshot.state(&account) == AccountState::Active
            && self
                .ctx
                .hasher()
                .verify(raw_password, &account.password_hash)?
        {
            return self.succeed(account, now).await;
        }

        self.fail(&account, snapshot, now).await
    }

    /// Record a failed credential check made upstream.
    pub async fn record_failure(&self, login_id: &str) -> Result<LoginOutcome, Error> {
        let Some(found) = self.find_by_login_id(login_id).await? else {
            return Ok(LoginOutcome::AccountNotFound);
        };

        let _guard = self.ctx.locks().acquire(&found.id).await;
        let Some(account) = self.reload(&found.id).await? else {
            return Ok(LoginOutcome::AccountNotFound);
        };

        let now = self.ctx.clock().now();
        let snapshot = self.snapshot(&account.id, now).await?;
        self.fail(&account, snapshot, now).await
    }

    /// Record a successful credential check made upstream.
    ///
    /// The attempt is recorded as `SUCCESS` without re-checking lock or expiry
    /// state: the upstream check is expected to have done that already.
    pub async fn record_success(&self, account_id: &AccountId) -> Result<LoginOutcome, Error> {
        let (_guard, account) = match self.ctx.guard_account(account_id).await {
            Ok(guarded) => guarded,
            Err(Error::Auth(AuthError::AccountNotFound)) => {
                return Ok(LoginOutcome::AccountNotFound);
            }
            Err(e) => return Err(e),
        };

        let now = self.ctx.clock().now();
        self.succeed(account, now).await
    }

    /// When the login before the most recent one happened, within the login history window.
    pub async fn previous_login_at(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<DateTime<Utc>>, Error> {
        let history = self
            .ctx
            .repositories()
            .login_history()
            .recent(account_id, self.ctx.config().login_history_window)
            .await?;
        Ok(history.find_previous_success_at())
    }

    /// The state the next attempt would see. Read only: an account that is due to
    /// expire is reported as `Expired` but nothing is recorded.
    pub async fn account_state(&self, account_id: &AccountId) -> Result<AccountState, Error> {
        let account = self.ctx.require_account(account_id).await?;
        let snapshot = self.snapshot(account_id, self.ctx.clock().now()).await?;
        Ok(snapshot.state(&account))
    }

    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<Account>, Error> {
        let account = self
            .ctx
            .repositories()
            .account()
            .find_by_login_id(login_id)
            .await?;
        if account.is_none() {
            tracing::debug!("Login attempt for unknown login id");
        }
        Ok(account)
    }

    // the login id may have moved between lookup and guard acquisition
    async fn reload(&self, account_id: &AccountId) -> Result<Option<Account>, Error> {
        self.ctx
            .repositories()
            .account()
            .find_by_id(account_id)
            .await
    }

    async fn snapshot(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, Error> {
        let expiry = check_expiry(&self.ctx, account_id, now).await?;
        let lock_events = recent_lock_events(&self.ctx, account_id).await?;
        Ok(Snapshot {
            expiry,
            lock_events,
        })
    }

    async fn fail(
        &self,
        account: &Account,
        snapshot: Snapshot,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, Error> {
        let account_id = &account.id;
        let mut changes = ChangeSet::new();

        match snapshot.state(account) {
            AccountState::Expired => {
                let notification = snapshot.expiry.notification();
                if let Some(event) = snapshot.expiry.pending {
                    changes.expiry_event(event);
                }
                changes.login_attempt(LoginAttemptEvent::new(
                    account_id.clone(),
                    LoginResult::Expired,
                    now,
                ));
                self.ctx.commit(changes).await?;

                tracing::info!(account_id = %account_id, "Login rejected: account expired");
                self.ctx.publish(notification.into_iter().collect()).await;
                Ok(LoginOutcome::Expired)
            }
            AccountState::Disabled => {
                changes.login_attempt(LoginAttemptEvent::new(
                    account_id.clone(),
                    LoginResult::Disabled,
                    now,
                ));
                self.ctx.commit(changes).await?;

                tracing::info!(account_id = %account_id, "Login rejected: account disabled");
                Ok(LoginOutcome::Disabled)
            }
            AccountState::Locked => {
                changes.login_attempt(LoginAttemptEvent::new(
                    account_id.clone(),
                    LoginResult::Locked,
                    now,
                ));
                self.ctx.commit(changes).await?;

                tracing::info!(account_id = %account_id, "Login rejected: account locked");
                Ok(LoginOutcome::Locked)
            }
            AccountState::Active => {
                let history = self
                    .ctx
                    .repositories()
                    .login_history()
                    .recent(account_id, self.ctx.config().login_window())
                    .await?;

                // the attempt being recorded is newer than anything stored
                let consecutive_failures =
                    LockoutPolicy::consecutive_failures(&history, &snapshot.lock_events) + 1;
                let policy = self.ctx.config().lockout_policy();
                let lock = policy.lock_after_failure(
                    account_id,
                    consecutive_failures,
                    &snapshot.lock_events,
                    SYSTEM_OPERATOR,
                    now,
                );

                let mut notifications = vec![SecurityEvent::LoginFailed {
                    account_id: account_id.clone(),
                    consecutive_failures,
                    timestamp: now,
                }];
                changes.login_attempt(LoginAttemptEvent::new(
                    account_id.clone(),
                    LoginResult::Fail,
                    now,
                ));
                let lock_triggered = lock.is_some();
                if let Some(lock) = lock {
                    notifications.push(locked_notification(&lock));
                    changes.lock_event(lock);
                }
                self.ctx.commit(changes).await?;

                if lock_triggered {
                    tracing::warn!(
                        account_id = %account_id,
                        consecutive_failures,
                        threshold = policy.fail_threshold(),
                        "Account locked after repeated login failures"
                    );
                } else {
                    tracing::debug!(
                        account_id = %account_id,
                        consecutive_failures,
                        "Login failed"
                    );
                }
                self.ctx.publish(notifications).await;

                Ok(LoginOutcome::InvalidCredentials {
                    consecutive_failures,
                    lock_triggered,
                })
            }
        }
    }

    async fn succeed(&self, account: Account, now: DateTime<Utc>) -> Result<LoginOutcome, Error> {
        let repositories = self.ctx.repositories();
        let previous_login_at = repositories
            .login_history()
            .latest_success(&account.id)
            .await?
            .map(|e| e.occurred_at);

        let mut changes = ChangeSet::new();
        changes.login_attempt(LoginAttemptEvent::new(
            account.id.clone(),
            LoginResult::Success,
            now,
        ));
        self.ctx.commit(changes).await?;

        let latest_change = repositories.password_history().latest(&account.id).await?;
        let password_change = self
            .ctx
            .config()
            .history_guard()
            .requirement_of(latest_change.as_deref(), now);

        tracing::info!(
            account_id = %account.id,
            password_change_required = password_change.is_required(),
            "Login succeeded"
        );

        Ok(LoginOutcome::Success(LoginSuccess {
            account,
            previous_login_at,
            password_change,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::builder()
            .id(AccountId::new("acct_alice"))
            .login_id("alice")
            .password_hash("hash")
            .build()
            .unwrap()
    }

    #[test]
    fn test_outcome_errors() {
        assert_eq!(
            LoginOutcome::Locked.as_error(),
            Some(AuthError::AccountLocked)
        );
        assert_eq!(
            LoginOutcome::Expired.as_error(),
            Some(AuthError::AccountExpired)
        );
        assert_eq!(
            LoginOutcome::InvalidCredentials {
                consecutive_failures: 6,
                lock_triggered: true,
            }
            .as_error(),
            Some(AuthError::InvalidCredentials)
        );

        let success = LoginOutcome::Success(LoginSuccess {
            account: account(),
            previous_login_at: None,
            password_change: PasswordChangeRequirement::None,
        });
        assert!(success.as_error().is_none());
        assert!(success.clone().into_result().is_ok());
        assert_eq!(success.success().unwrap().account.login_id, "alice");
    }

    #[test]
    fn test_not_found_is_a_credential_error() {
        let err = LoginOutcome::AccountNotFound.into_result().unwrap_err();
        assert!(err.is_credential_error());
    }
}
