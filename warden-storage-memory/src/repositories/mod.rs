//! Repository implementations for in-memory storage

pub mod account;
pub mod expiry_history;
pub mod journal;
pub mod lock_history;
pub mod login_history;
pub mod password_history;

pub use account::MemoryAccountRepository;
pub use expiry_history::MemoryExpiryHistoryRepository;
pub use journal::MemoryJournalRepository;
pub use lock_history::MemoryLockHistoryRepository;
pub use login_history::MemoryLoginHistoryRepository;
pub use password_history::MemoryPasswordHistoryRepository;
