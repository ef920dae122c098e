//! Repository traits for data access layer
//!
//! This module defines the repository interfaces that services use to interact with storage.
//! Storage owns ordering: every appended event gets a monotonic sequence number, and
//! reads come back newest first.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each history
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus a health check

pub mod account;
pub mod expiry_history;
pub mod journal;
pub mod lock_history;
pub mod login_history;
pub mod password_history;

pub use account::AccountRepository;
pub use expiry_history::ExpiryHistoryRepository;
pub use journal::{ChangeSet, JournalRepository};
pub use lock_history::LockHistoryRepository;
pub use login_history::LoginHistoryRepository;
pub use password_history::PasswordHistoryRepository;

use async_trait::async_trait;

use crate::Error;

// ============================================================================
// Individual Repository Provider Traits
// ============================================================================

/// Provider trait for account repository access.
pub trait AccountRepositoryProvider: Send + Sync + 'static {
    /// The account repository implementation type
    type AccountRepo: AccountRepository;

    /// Get the account repository
    fn account(&self) -> &Self::AccountRepo;
}

/// Provider trait for login history access.
pub trait LoginHistoryRepositoryProvider: Send + Sync + 'static {
    type LoginHistoryRepo: LoginHistoryRepository;

    fn login_history(&self) -> &Self::LoginHistoryRepo;
}

/// Provider trait for lock history access.
pub trait LockHistoryRepositoryProvider: Send + Sync + 'static {
    type LockHistoryRepo: LockHistoryRepository;

    fn lock_history(&self) -> &Self::LockHistoryRepo;
}

/// Provider trait for expiry history access.
pub trait ExpiryHistoryRepositoryProvider: Send + Sync + 'static {
    type ExpiryHistoryRepo: ExpiryHistoryRepository;

    fn expiry_history(&self) -> &Self::ExpiryHistoryRepo;
}

/// Provider trait for password history access.
pub trait PasswordHistoryRepositoryProvider: Send + Sync + 'static {
    type PasswordHistoryRepo: PasswordHistoryRepository;

    fn password_history(&self) -> &Self::PasswordHistoryRepo;
}

/// Provider trait for the atomic write path.
pub trait JournalRepositoryProvider: Send + Sync + 'static {
    type JournalRepo: JournalRepository;

    fn journal(&self) -> &Self::JournalRepo;
}

// ============================================================================
// Unified Repository Provider Trait
// ============================================================================

/// Provider trait that storage implementations must implement to provide all repositories.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement the `RepositoryProvider` trait with `health_check()`
///
/// `JournalRepository::commit` must be atomic, and the append methods must assign
/// strictly increasing sequence numbers per backend.
#[async_trait]
pub trait RepositoryProvider:
    AccountRepositoryProvider
    + LoginHistoryRepositoryProvider
    + LockHistoryRepositoryProvider
    + ExpiryHistoryRepositoryProvider
    + PasswordHistoryRepositoryProvider
    + JournalRepositoryProvider
{
    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
