use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{ChangeSet, Error, repositories::JournalRepository};

use crate::store::MemoryStore;

pub struct MemoryJournalRepository {
    store: Arc<MemoryStore>,
}

impl MemoryJournalRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JournalRepository for MemoryJournalRepository {
    async fn commit(&self, changes: ChangeSet) -> Result<(), Error> {
        let mut state = self.store.state.write().await;
        state.apply(changes)
    }
}
