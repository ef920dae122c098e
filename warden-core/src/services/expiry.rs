//! Inactivity expiry.
//!
//! Expiry is projected from the expiry history and the latest successful login. The
//! only write this service makes on its own is the `Expire` event, the first time an
//! evaluation finds the account inactive for too long.

use chrono::{DateTime, Utc};

use crate::{
    AccountId, Error,
    events::SecurityEvent,
    history::{ExpiryEvent, ExpiryReason},
    policy::{ExpiryDecision, ExpiryPolicy},
    repositories::{ChangeSet, ExpiryHistoryRepository, LoginHistoryRepository, RepositoryProvider},
    services::ServiceContext,
};

/// Result of evaluating one account, plus the event to append if it just expired.
#[derive(Debug, Clone)]
pub(crate) struct ExpiryCheck {
    pub decision: ExpiryDecision,
    pub pending: Option<ExpiryEvent>,
}

impl ExpiryCheck {
    pub fn is_expired(&self) -> bool {
        self.decision.is_expired()
    }

    pub fn notification(&self) -> Option<SecurityEvent> {
        self.pending.as_ref().map(|event| SecurityEvent::AccountExpired {
            account_id: event.account_id.clone(),
            timestamp: event.occurred_at,
        })
    }
}

/// Evaluate without taking the account guard. The caller must hold it if it commits.
pub(crate) async fn check_expiry<R: RepositoryProvider>(
    ctx: &ServiceContext<R>,
    account_id: &AccountId,
    now: DateTime<Utc>,
) -> Result<ExpiryCheck, Error> {
    let repositories = ctx.repositories();
    let expiry_events = repositories.expiry_history().all(account_id).await?;
    let last_success_at = repositories
        .login_history()
        .latest_success(account_id)
        .await?
        .map(|e| e.occurred_at);

    let decision = ctx
        .config()
        .expiry_policy()
        .evaluate(&expiry_events, last_success_at, now);
    let pending = (decision == ExpiryDecision::ExpireNow)
        .then(|| ExpiryEvent::expire(account_id.clone(), ExpiryReason::Inactive, now));

    Ok(ExpiryCheck { decision, pending })
}

/// Service for inactivity expiry
pub struct ExpiryService<R: RepositoryProvider> {
    ctx: ServiceContext<R>,
}

impl<R: RepositoryProvider> ExpiryService<R> {
    pub fn new(ctx: ServiceContext<R>) -> Self {
        Self { ctx }
    }

    /// Whether the latest expiry event is an `Expire`. Does not evaluate inactivity.
    pub async fn is_expired(&self, account_id: &AccountId) -> Result<bool, Error> {
        let events = self
            .ctx
            .repositories()
            .expiry_history()
            .all(account_id)
            .await?;
        Ok(ExpiryPolicy::is_expired(&events))
    }

    /// Returns whether the account is expired, recording the expiry if it happens now.
    ///
    /// Calling this repeatedly appends at most one `Expire` event. Unknown accounts
    /// fail with `AuthError::AccountNotFound`.
    pub async fn evaluate_and_expire_if_needed(
        &self,
        account_id: &AccountId,
    ) -> Result<bool, Error> {
        let (_guard, _) = self.ctx.guard_account(account_id).await?;
        let now = self.ctx.clock().now();

        let check = check_expiry(&self.ctx, account_id, now).await?;
        if let Some(event) = check.pending.clone() {
            let mut changes = ChangeSet::new();
            changes.expiry_event(event);
            self.ctx.commit(changes).await?;

            tracing::info!(account_id = %account_id, "Account expired after inactivity");
            self.ctx
                .publish(check.notification().into_iter().collect())
                .await;
        }

        Ok(check.is_expired())
    }

    /// Reactivate an expired account. Returns `false` when it was not expired.
    pub async fn unexpire_if_expired(
        &self,
        account_id: &AccountId,
        operated_by: &str,
    ) -> Result<bool, Error> {
        crate::validation::validate_operator(operated_by)?;
        let (_guard, _) = self.ctx.guard_account(account_id).await?;

        let now = self.ctx.clock().now();
        let Some(event) = unexpire_event(&self.ctx, account_id, operated_by, now).await? else {
            tracing::debug!(account_id = %account_id, "Unexpire requested for an active account");
            return Ok(false);
        };

        let mut changes = ChangeSet::new();
        changes.expiry_event(event);
        self.ctx.commit(changes).await?;

        tracing::info!(account_id = %account_id, operated_by, "Account unexpired");
        self.ctx
            .publish(vec![SecurityEvent::AccountUnexpired {
                account_id: account_id.clone(),
                operated_by: operated_by.to_string(),
                timestamp: now,
            }])
            .await;
        Ok(true)
    }
}

/// The `Unexpire` event to append, if the account is currently expired.
pub(crate) async fn unexpire_event<R: RepositoryProvider>(
    ctx: &ServiceContext<R>,
    account_id: &AccountId,
    operated_by: &str,
    now: DateTime<Utc>,
) -> Result<Option<ExpiryEvent>, Error> {
    let events = ctx.repositories().expiry_history().all(account_id).await?;
    Ok(ExpiryPolicy::unexpire_transition(
        account_id,
        &events,
        operated_by,
        now,
    ))
}
