//! Lock state and administrative locking.
//!
//! The event and notification helpers here are shared with the login flow, which
//! locks after repeated failures, and with the password reset, which unlocks.

use chrono::{DateTime, Utc};

use crate::{
    AccountId, Error,
    events::SecurityEvent,
    history::{EventLog, LockEvent, LockReason},
    policy::{LockState, LockoutPolicy},
    repositories::{ChangeSet, LockHistoryRepository, LoginHistoryRepository, RepositoryProvider},
    services::ServiceContext,
    validation::validate_operator,
};

pub(crate) async fn recent_lock_events<R: RepositoryProvider>(
    ctx: &ServiceContext<R>,
    account_id: &AccountId,
) -> Result<EventLog<LockEvent>, Error> {
    ctx.repositories()
        .lock_history()
        .recent(account_id, ctx.config().lock_history_window)
        .await
}

/// The unlock event to append, if the account is currently locked.
pub(crate) async fn unlock_event<R: RepositoryProvider>(
    ctx: &ServiceContext<R>,
    account_id: &AccountId,
    reason: LockReason,
    operated_by: &str,
    now: DateTime<Utc>,
) -> Result<Option<LockEvent>, Error> {
    let lock_events = recent_lock_events(ctx, account_id).await?;
    Ok(LockoutPolicy::unlock_transition(
        account_id,
        &lock_events,
        reason,
        operated_by,
        now,
    ))
}

pub(crate) fn unlocked_notification(event: &LockEvent) -> SecurityEvent {
    SecurityEvent::AccountUnlocked {
        account_id: event.account_id.clone(),
        reason: event.reason.clone(),
        timestamp: event.occurred_at,
    }
}

pub(crate) fn locked_notification(event: &LockEvent) -> SecurityEvent {
    SecurityEvent::AccountLocked {
        account_id: event.account_id.clone(),
        reason: event.reason.clone(),
        timestamp: event.occurred_at,
    }
}

/// Service for reading and administering lock state
///
/// Automatic locking after repeated failures happens in the login flow; this
/// service covers the administrative side and read-only inspection.
pub struct LockoutService<R: RepositoryProvider> {
    ctx: ServiceContext<R>,
}

impl<R: RepositoryProvider> LockoutService<R> {
    pub fn new(ctx: ServiceContext<R>) -> Self {
        Self { ctx }
    }

    pub async fn lock_state(&self, account_id: &AccountId) -> Result<LockState, Error> {
        let lock_events = recent_lock_events(&self.ctx, account_id).await?;
        Ok(LockoutPolicy::state(&lock_events))
    }

    pub async fn is_locked(&self, account_id: &AccountId) -> Result<bool, Error> {
        Ok(self.lock_state(account_id).await? == LockState::Locked)
    }

    /// Consecutive failures counted since the last unlock.
    pub async fn consecutive_failures(&self, account_id: &AccountId) -> Result<u32, Error> {
        let lock_events = recent_lock_events(&self.ctx, account_id).await?;
        let history = self
            .ctx
            .repositories()
            .login_history()
            .recent(account_id, self.ctx.config().login_window())
            .await?;
        Ok(LockoutPolicy::consecutive_failures(&history, &lock_events))
    }

    /// Lock an account by hand. Returns `false` when it was already locked.
    pub async fn lock_account(
        &self,
        account_id: &AccountId,
        operated_by: &str,
    ) -> Result<bool, Error> {
        validate_operator(operated_by)?;
        let (_guard, _) = self.ctx.guard_account(account_id).await?;

        let now = self.ctx.clock().now();
        let lock_events = recent_lock_events(&self.ctx, account_id).await?;
        let Some(event) = LockoutPolicy::lock_transition(
            account_id,
            &lock_events,
            LockReason::AdminLock,
            operated_by,
            now,
        ) else {
            tracing::debug!(account_id = %account_id, "Lock requested for a locked account");
            return Ok(false);
        };

        let notification = locked_notification(&event);
        let mut changes = ChangeSet::new();
        changes.lock_event(event);
        self.ctx.commit(changes).await?;

        tracing::warn!(account_id = %account_id, operated_by, "Account locked by operator");
        self.ctx.publish(vec![notification]).await;
        Ok(true)
    }

    /// Unlock an account. Returns `false` when it was not locked.
    ///
    /// Unlocking also restarts the consecutive failure count.
    pub async fn unlock_account(
        &self,
        account_id: &AccountId,
        operated_by: &str,
    ) -> Result<bool, Error> {
        validate_operator(operated_by)?;
        let (_guard, _) = self.ctx.guard_account(account_id).await?;

        let now = self.ctx.clock().now();
        let Some(event) =
            unlock_event(&self.ctx, account_id, LockReason::AdminUnlock, operated_by, now).await?
        else {
            tracing::debug!(account_id = %account_id, "Unlock requested for an unlocked account");
            return Ok(false);
        };

        let notification = unlocked_notification(&event);
        let mut changes = ChangeSet::new();
        changes.lock_event(event);
        self.ctx.commit(changes).await?;

        tracing::info!(account_id = %account_id, operated_by, "Account unlocked");
        self.ctx.publish(vec![notification]).await;
        Ok(true)
    }
}
