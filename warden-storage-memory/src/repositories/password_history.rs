use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{
    AccountId, Error,
    history::{PasswordChangeEvent, Recorded},
    repositories::PasswordHistoryRepository,
};

use crate::store::MemoryStore;

pub struct MemoryPasswordHistoryRepository {
    store: Arc<MemoryStore>,
}

impl MemoryPasswordHistoryRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PasswordHistoryRepository for MemoryPasswordHistoryRepository {
    async fn append(
        &self,
        event: PasswordChangeEvent,
    ) -> Result<Recorded<PasswordChangeEvent>, Error> {
        Ok(self.store.state.write().await.append_password_change(event))
    }

    async fn recent(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<Vec<Recorded<PasswordChangeEvent>>, Error> {
        let state = self.store.state.read().await;
        Ok(state
            .password_changes(account_id)
            .take_newest(limit)
            .into_entries())
    }

    async fn latest(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<Recorded<PasswordChangeEvent>>, Error> {
        let state = self.store.state.read().await;
        Ok(state
            .password_changes(account_id)
            .into_entries()
            .into_iter()
            .next())
    }
}
