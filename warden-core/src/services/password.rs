//! Password registration, changes and administrative resets.
//!
//! Each accepted password is hashed and written with a [`PasswordChangeEvent`] in
//! the same commit. The change requirement is projected from the latest of those
//! events, so an admin reset makes the owner choose a new password at the next
//! login.

use crate::{
    Account, AccountId, Error,
    error::{AuthError, StorageError},
    events::SecurityEvent,
    history::{LockReason, PasswordChangeEvent, PasswordChangeType},
    policy::PasswordChangeRequirement,
    repositories::{AccountRepository, ChangeSet, PasswordHistoryRepository, RepositoryProvider},
    services::{
        ServiceContext,
        lockout::{unlock_event, unlocked_notification},
    },
    validation::{validate_login_id, validate_operator},
};

/// Service for password registration, changes and administrative resets
///
/// Every new password passes the configured [`crate::policy::PasswordPolicy`]
/// first, and all violations are reported together.
pub struct PasswordService<R: RepositoryProvider> {
    ctx: ServiceContext<R>,
}

impl<R: RepositoryProvider> PasswordService<R> {
    pub fn new(ctx: ServiceContext<R>) -> Self {
        Self { ctx }
    }

    /// Create an account with an initial password.
    ///
    /// The first login after registration is asked to change it.
    pub async fn register_account(
        &self,
        login_id: &str,
        raw_password: &str,
        operated_by: &str,
    ) -> Result<Account, Error> {
        validate_login_id(login_id)?;
        validate_operator(operated_by)?;
        self.ctx
            .password_policy()
            .validate_password(Some(raw_password), login_id)?;

        let accounts = self.ctx.repositories().account();
        if accounts.find_by_login_id(login_id).await?.is_some() {
            return Err(AuthError::AccountAlreadyExists.into());
        }

        let now = self.ctx.clock().now();
        let encoded = self.ctx.hasher().hash(raw_password)?;
        let account = Account::builder()
            .id(AccountId::new_random())
            .login_id(login_id)
            .password_hash(encoded.clone())
            .created_at(now)
            .build()?;

        let mut changes = ChangeSet::new();
        changes
            .save_account(account.clone())
            .password_change(PasswordChangeEvent::new(
                account.id.clone(),
                encoded,
                PasswordChangeType::InitialRegister,
                operated_by,
                now,
            ));

        // a concurrent registration of the same login id loses at the storage boundary
        self.ctx.commit(changes).await.map_err(|e| match e {
            Error::Storage(StorageError::Constraint(_)) => AuthError::AccountAlreadyExists.into(),
            other => other,
        })?;

        tracing::info!(account_id = %account.id, operated_by, "Account registered");
        self.ctx
            .publish(vec![SecurityEvent::PasswordChanged {
                account_id: account.id.clone(),
                change_type: PasswordChangeType::InitialRegister,
                timestamp: now,
            }])
            .await;
        Ok(account)
    }

    /// Change a password on behalf of its owner.
    ///
    /// Checks run in order: the current password, the password rules, then reuse
    /// against the most recent history entries. The new hash and the history entry
    /// are committed together.
    pub async fn change_password(
        &self,
        account_id: &AccountId,
        current_raw: &str,
        new_raw: &str,
    ) -> Result<Account, Error> {
        let (_guard, account) = self.ctx.guard_account(account_id).await?;

        if !self.ctx.hasher().verify(current_raw, &account.password_hash)? {
            tracing::debug!(
                account_id = %account_id,
                "Password change rejected: wrong current password"
            );
            return Err(AuthError::InvalidCredentials.into());
        }

        self.ctx
            .password_policy()
            .validate_password(Some(new_raw), &account.login_id)?;

        let guard = self.ctx.config().history_guard();
        let recent = self
            .ctx
            .repositories()
            .password_history()
            .recent(account_id, guard.reuse_depth())
            .await?;
        guard
            .ensure_not_reused(self.ctx.hasher(), new_raw, &recent)
            .inspect_err(|_| {
                tracing::warn!(
                    account_id = %account_id,
                    "Password change rejected: recently used password"
                );
            })?;

        let now = self.ctx.clock().now();
        let encoded = self.ctx.hasher().hash(new_raw)?;
        let updated = account.with_password_hash(encoded.clone(), now);

        let mut changes = ChangeSet::new();
        changes
            .save_account(updated.clone())
            .password_change(PasswordChangeEvent::new(
                account_id.clone(),
                encoded,
                PasswordChangeType::UserChange,
                &account.login_id,
                now,
            ));
        self.ctx.commit(changes).await?;

        tracing::info!(account_id = %account_id, "Password changed");
        self.ctx
            .publish(vec![SecurityEvent::PasswordChanged {
                account_id: account_id.clone(),
                change_type: PasswordChangeType::UserChange,
                timestamp: now,
            }])
            .await;
        Ok(updated)
    }

    /// Set a new password as an administrator and unlock the account if locked.
    ///
    /// The owner is asked to choose their own password at the next login.
    pub async fn reset_password_to_initial(
        &self,
        account_id: &AccountId,
        new_raw: &str,
        operated_by: &str,
    ) -> Result<Account, Error> {
        validate_operator(operated_by)?;
        let (_guard, account) = self.ctx.guard_account(account_id).await?;

        self.ctx
            .password_policy()
            .validate_password(Some(new_raw), &account.login_id)?;

        let now = self.ctx.clock().now();
        let encoded = self.ctx.hasher().hash(new_raw)?;
        let updated = account.with_password_hash(encoded.clone(), now);
        let unlock = unlock_event(
            &self.ctx,
            account_id,
            LockReason::PasswordReset,
            operated_by,
            now,
        )
        .await?;

        let mut notifications = vec![SecurityEvent::PasswordChanged {
            account_id: account_id.clone(),
            change_type: PasswordChangeType::AdminReset,
            timestamp: now,
        }];
        let mut changes = ChangeSet::new();
        changes
            .save_account(updated.clone())
            .password_change(PasswordChangeEvent::new(
                account_id.clone(),
                encoded,
                PasswordChangeType::AdminReset,
                operated_by,
                now,
            ));
        if let Some(event) = unlock {
            notifications.push(unlocked_notification(&event));
            changes.lock_event(event);
        }
        self.ctx.commit(changes).await?;

        tracing::info!(account_id = %account_id, operated_by, "Password reset by operator");
        self.ctx.publish(notifications).await;
        Ok(updated)
    }

    /// Why the account must change its password, if at all.
    pub async fn requirement_of(&self, login_id: &str) -> Result<PasswordChangeRequirement, Error> {
        let account = self
            .ctx
            .repositories()
            .account()
            .find_by_login_id(login_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        self.requirement_for(&account.id).await
    }

    pub async fn requirement_for(
        &self,
        account_id: &AccountId,
    ) -> Result<PasswordChangeRequirement, Error> {
        let latest = self
            .ctx
            .repositories()
            .password_history()
            .latest(account_id)
            .await?;
        Ok(self
            .ctx
            .config()
            .history_guard()
            .requirement_of(latest.as_deref(), self.ctx.clock().now()))
    }

    pub async fn is_password_change_required(&self, login_id: &str) -> Result<bool, Error> {
        Ok(self.requirement_of(login_id).await?.is_required())
    }
}
