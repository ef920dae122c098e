use crate::{
    AccountId, Error,
    history::{PasswordChangeEvent, Recorded},
};
use async_trait::async_trait;

/// Repository for password change history
#[async_trait]
pub trait PasswordHistoryRepository: Send + Sync + 'static {
    async fn append(
        &self,
        event: PasswordChangeEvent,
    ) -> Result<Recorded<PasswordChangeEvent>, Error>;

    /// The `limit` most recent changes for an account, newest first
    async fn recent(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<Vec<Recorded<PasswordChangeEvent>>, Error>;

    /// The most recent change for an account
    async fn latest(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<Recorded<PasswordChangeEvent>>, Error>;
}
