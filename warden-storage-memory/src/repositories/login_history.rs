use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{
    AccountId, Error,
    history::{EventLog, LoginAttemptEvent, LoginResult, Recorded},
    repositories::LoginHistoryRepository,
};

use crate::store::MemoryStore;

pub struct MemoryLoginHistoryRepository {
    store: Arc<MemoryStore>,
}

impl MemoryLoginHistoryRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LoginHistoryRepository for MemoryLoginHistoryRepository {
    async fn append(&self, event: LoginAttemptEvent) -> Result<Recorded<LoginAttemptEvent>, Error> {
        Ok(self.store.state.write().await.append_login_attempt(event))
    }

    async fn recent(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<EventLog<LoginAttemptEvent>, Error> {
        let state = self.store.state.read().await;
        Ok(state.login_attempts(account_id).take_newest(limit))
    }

    async fn latest_success(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<Recorded<LoginAttemptEvent>>, Error> {
        let state = self.store.state.read().await;
        Ok(state
            .login_attempts(account_id)
            .into_entries()
            .into_iter()
            .find(|e| e.result == LoginResult::Success))
    }
}
