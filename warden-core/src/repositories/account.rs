use crate::{Account, AccountId, Error};
use async_trait::async_trait;

/// Repository for account data access
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Find an account by its immutable ID
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error>;

    /// Find an account by its login id
    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<Account>, Error>;

    /// Insert or replace an account
    ///
    /// Fails with `StorageError::Constraint` when another account already uses the login id.
    async fn save(&self, account: &Account) -> Result<Account, Error>;
}
