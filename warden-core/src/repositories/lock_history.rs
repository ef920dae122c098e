use crate::{
    AccountId, Error,
    history::{EventLog, LockEvent, Recorded},
};
use async_trait::async_trait;

/// Repository for lock and unlock events
#[async_trait]
pub trait LockHistoryRepository: Send + Sync + 'static {
    async fn append(&self, event: LockEvent) -> Result<Recorded<LockEvent>, Error>;

    /// The `limit` most recent lock events for an account
    async fn recent(&self, account_id: &AccountId, limit: usize)
    -> Result<EventLog<LockEvent>, Error>;
}
