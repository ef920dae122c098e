use crate::{
    AccountId, Error,
    history::{EventLog, ExpiryEvent, Recorded},
};
use async_trait::async_trait;

/// Repository for expiry and unexpiry events
#[async_trait]
pub trait ExpiryHistoryRepository: Send + Sync + 'static {
    async fn append(&self, event: ExpiryEvent) -> Result<Recorded<ExpiryEvent>, Error>;

    /// Every expiry event recorded for an account
    async fn all(&self, account_id: &AccountId) -> Result<EventLog<ExpiryEvent>, Error>;
}
