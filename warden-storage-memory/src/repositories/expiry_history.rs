use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{
    AccountId, Error,
    history::{EventLog, ExpiryEvent, Recorded},
    repositories::ExpiryHistoryRepository,
};

use crate::store::MemoryStore;

pub struct MemoryExpiryHistoryRepository {
    store: Arc<MemoryStore>,
}

impl MemoryExpiryHistoryRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ExpiryHistoryRepository for MemoryExpiryHistoryRepository {
    async fn append(&self, event: ExpiryEvent) -> Result<Recorded<ExpiryEvent>, Error> {
        Ok(self.store.state.write().await.append_expiry_event(event))
    }

    async fn all(&self, account_id: &AccountId) -> Result<EventLog<ExpiryEvent>, Error> {
        Ok(self.store.state.read().await.expiry_events(account_id))
    }
}
