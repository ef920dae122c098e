use crate::{
    AccountId, Error,
    history::{EventLog, LoginAttemptEvent, Recorded},
};
use async_trait::async_trait;

/// Repository for the login attempt history
#[async_trait]
pub trait LoginHistoryRepository: Send + Sync + 'static {
    /// Append one attempt, assigning its sequence number
    async fn append(&self, event: LoginAttemptEvent) -> Result<Recorded<LoginAttemptEvent>, Error>;

    /// The `limit` most recent attempts for an account
    async fn recent(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<EventLog<LoginAttemptEvent>, Error>;

    /// The most recent successful attempt for an account
    async fn latest_success(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<Recorded<LoginAttemptEvent>>, Error>;
}
