use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{Account, AccountId, Error, repositories::AccountRepository};

use crate::store::MemoryStore;

pub struct MemoryAccountRepository {
    store: Arc<MemoryStore>,
}

impl MemoryAccountRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        Ok(self.store.state.read().await.account(id))
    }

    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<Account>, Error> {
        Ok(self.store.state.read().await.account_by_login_id(login_id))
    }

    async fn save(&self, account: &Account) -> Result<Account, Error> {
        self.store.state.write().await.save_account(account.clone())
    }
}
