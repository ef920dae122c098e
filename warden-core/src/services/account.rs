//! Administrative account transitions: enable, disable and logical delete.

use crate::{
    Account, AccountId, Error,
    events::SecurityEvent,
    repositories::{AccountRepository, ChangeSet, RepositoryProvider},
    services::{ServiceContext, expiry::unexpire_event},
    validation::validate_operator,
};

/// Service for administrative account transitions
pub struct AccountService<R: RepositoryProvider> {
    ctx: ServiceContext<R>,
}

impl<R: RepositoryProvider> AccountService<R> {
    pub fn new(ctx: ServiceContext<R>) -> Self {
        Self { ctx }
    }

    /// Get an account by ID
    pub async fn find_by_id(&self, account_id: &AccountId) -> Result<Option<Account>, Error> {
        self.ctx
            .repositories()
            .account()
            .find_by_id(account_id)
            .await
    }

    /// Get an account by login id
    pub async fn find_by_login_id(&self, login_id: &str) -> Result<Option<Account>, Error> {
        self.ctx
            .repositories()
            .account()
            .find_by_login_id(login_id)
            .await
    }

    /// Enable an account. An expired account is unexpired in the same commit.
    ///
    /// Deleted accounts stay disabled.
    pub async fn enable(
        &self,
        account_id: &AccountId,
        operated_by: &str,
    ) -> Result<Account, Error> {
        validate_operator(operated_by)?;
        let (_guard, account) = self.ctx.guard_account(account_id).await?;
        let now = self.ctx.clock().now();

        if account.deleted {
            tracing::warn!(account_id = %account_id, "Refusing to enable a deleted account");
            return Ok(account);
        }

        let updated = account.enable(now);
        let unexpire = unexpire_event(&self.ctx, account_id, operated_by, now).await?;

        let mut changes = ChangeSet::new();
        changes.save_account(updated.clone());
        let mut notifications = Vec::new();
        if let Some(event) = unexpire {
            notifications.push(SecurityEvent::AccountUnexpired {
                account_id: account_id.clone(),
                operated_by: operated_by.to_string(),
                timestamp: now,
            });
            changes.expiry_event(event);
        }
        self.ctx.commit(changes).await?;

        tracing::info!(account_id = %account_id, operated_by, "Account enabled");
        self.ctx.publish(notifications).await;
        Ok(updated)
    }

    pub async fn disable(&self, account_id: &AccountId) -> Result<Account, Error> {
        self.transition(account_id, "disabled", |account, now| account.disable(now))
            .await
    }

    /// Logically delete an account. Its histories are kept.
    pub async fn delete(&self, account_id: &AccountId) -> Result<Account, Error> {
        self.transition(account_id, "deleted", |account, now| account.delete(now))
            .await
    }

    async fn transition<F>(
        &self,
        account_id: &AccountId,
        action: &str,
        f: F,
    ) -> Result<Account, Error>
    where
        F: FnOnce(&Account, chrono::DateTime<chrono::Utc>) -> Account,
    {
        let (_guard, account) = self.ctx.guard_account(account_id).await?;
        let updated = f(&account, self.ctx.clock().now());

        let mut changes = ChangeSet::new();
        changes.save_account(updated.clone());
        self.ctx.commit(changes).await?;

        tracing::info!(account_id = %account_id, "Account {action}");
        Ok(updated)
    }
}
