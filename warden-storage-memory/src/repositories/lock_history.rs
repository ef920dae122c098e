use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{
    AccountId, Error,
    history::{EventLog, LockEvent, Recorded},
    repositories::LockHistoryRepository,
};

use crate::store::MemoryStore;

pub struct MemoryLockHistoryRepository {
    store: Arc<MemoryStore>,
}

impl MemoryLockHistoryRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LockHistoryRepository for MemoryLockHistoryRepository {
    async fn append(&self, event: LockEvent) -> Result<Recorded<LockEvent>, Error> {
        Ok(self.store.state.write().await.append_lock_event(event))
    }

    async fn recent(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<EventLog<LockEvent>, Error> {
        let state = self.store.state.read().await;
        Ok(state.lock_events(account_id).take_newest(limit))
    }
}
