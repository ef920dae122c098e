//! In-memory storage backend for warden
//!
//! Every repository shares one [`store::MemoryStore`]. A single `RwLock` guards all
//! of it, which makes a journal commit atomic and gives every appended event a
//! sequence number unique across the store.
//!
//! State lives only as long as the provider. This backend suits tests, demos and
//! single-process deployments that rebuild their state on start.
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_core::{SecurityConfig, ServiceContext, services::LoginService};
//! use warden_storage_memory::MemoryRepositoryProvider;
//!
//! let repositories = Arc::new(MemoryRepositoryProvider::new());
//! let login = LoginService::new(ServiceContext::new(repositories, SecurityConfig::default()));
//! ```

pub mod repositories;
pub mod store;

pub use repositories::{
    MemoryAccountRepository, MemoryExpiryHistoryRepository, MemoryJournalRepository,
    MemoryLockHistoryRepository, MemoryLoginHistoryRepository, MemoryPasswordHistoryRepository,
};
pub use store::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{
    Error,
    repositories::{
        AccountRepositoryProvider, ExpiryHistoryRepositoryProvider, JournalRepositoryProvider,
        LockHistoryRepositoryProvider, LoginHistoryRepositoryProvider,
        PasswordHistoryRepositoryProvider, RepositoryProvider,
    },
};

/// Repository provider implementation for in-memory storage
///
/// This struct implements all the individual repository provider traits
/// as well as the unified `RepositoryProvider` trait.
pub struct MemoryRepositoryProvider {
    store: Arc<MemoryStore>,
    account: Arc<MemoryAccountRepository>,
    login_history: Arc<MemoryLoginHistoryRepository>,
    lock_history: Arc<MemoryLockHistoryRepository>,
    expiry_history: Arc<MemoryExpiryHistoryRepository>,
    password_history: Arc<MemoryPasswordHistoryRepository>,
    journal: Arc<MemoryJournalRepository>,
}

impl Default for MemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let account = Arc::new(MemoryAccountRepository::new(store.clone()));
        let login_history = Arc::new(MemoryLoginHistoryRepository::new(store.clone()));
        let lock_history = Arc::new(MemoryLockHistoryRepository::new(store.clone()));
        let expiry_history = Arc::new(MemoryExpiryHistoryRepository::new(store.clone()));
        let password_history = Arc::new(MemoryPasswordHistoryRepository::new(store.clone()));
        let journal = Arc::new(MemoryJournalRepository::new(store.clone()));

        Self {
            store,
            account,
            login_history,
            lock_history,
            expiry_history,
            password_history,
            journal,
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

// Implement individual provider traits

impl AccountRepositoryProvider for MemoryRepositoryProvider {
    type AccountRepo = MemoryAccountRepository;

    fn account(&self) -> &Self::AccountRepo {
        &self.account
    }
}

impl LoginHistoryRepositoryProvider for MemoryRepositoryProvider {
    type LoginHistoryRepo = MemoryLoginHistoryRepository;

    fn login_history(&self) -> &Self::LoginHistoryRepo {
        &self.login_history
    }
}

impl LockHistoryRepositoryProvider for MemoryRepositoryProvider {
    type LockHistoryRepo = MemoryLockHistoryRepository;

    fn lock_history(&self) -> &Self::LockHistoryRepo {
        &self.lock_history
    }
}

impl ExpiryHistoryRepositoryProvider for MemoryRepositoryProvider {
    type ExpiryHistoryRepo = MemoryExpiryHistoryRepository;

    fn expiry_history(&self) -> &Self::ExpiryHistoryRepo {
        &self.expiry_history
    }
}

impl PasswordHistoryRepositoryProvider for MemoryRepositoryProvider {
    type PasswordHistoryRepo = MemoryPasswordHistoryRepository;

    fn password_history(&self) -> &Self::PasswordHistoryRepo {
        &self.password_history
    }
}

impl JournalRepositoryProvider for MemoryRepositoryProvider {
    type JournalRepo = MemoryJournalRepository;

    fn journal(&self) -> &Self::JournalRepo {
        &self.journal
    }
}

// Implement the unified RepositoryProvider trait

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn health_check(&self) -> Result<(), Error> {
        // taking the write lock proves no writer is wedged
        let _state = self.store.state.write().await;
        Ok(())
    }
}
