//! Per-account serialization of evaluate-then-append.
//!
//! Two concurrent failures for the same account must not both see five prior
//! failures and both skip the lock. Every service that reads a history and then
//! writes to it holds the account's guard across both steps.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::AccountId;

/// Registry of async mutexes keyed by account.
///
/// An entry lives only while some task holds or waits on it, so the registry
/// stays as small as the set of accounts currently being worked on.
///
/// Guards are not reentrant: a task holding an account's guard must not ask
/// for it again.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

/// Exclusive access to one account, released on drop.
#[derive(Debug)]
pub struct AccountGuard<'a> {
    registry: &'a AccountLocks,
    account_id: AccountId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AccountGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // only the registry's own reference left: nobody holds or waits on it
        self.registry
            .locks
            .remove_if(&self.account_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one account.
    pub async fn acquire(&self, account_id: &AccountId) -> AccountGuard<'_> {
        // clone the Arc out so the shard lock is released before awaiting
        let lock = self
            .locks
            .entry(account_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        AccountGuard {
            registry: self,
            account_id: account_id.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_is_serialized() {
        let locks = Arc::new(AccountLocks::new());
        let alice = AccountId::new("acct_alice");

        let guard = locks.acquire(&alice).await;

        let waiter = {
            let locks = locks.clone();
            let alice = alice.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&alice).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_accounts_do_not_contend() {
        let locks = AccountLocks::new();
        let _alice = locks.acquire(&AccountId::new("acct_alice")).await;
        let _bob = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&AccountId::new("acct_bob")),
        )
        .await
        .expect("bob should not wait on alice");
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_entries_are_removed() {
        let locks = AccountLocks::new();
        let held = locks.acquire(&AccountId::new("acct_alice")).await;
        drop(locks.acquire(&AccountId::new("acct_bob")).await);
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_survives_while_a_waiter_is_queued() {
        let locks = Arc::new(AccountLocks::new());
        let alice = AccountId::new("acct_alice");
        let guard = locks.acquire(&alice).await;

        let waiter = {
            let locks = locks.clone();
            let alice = alice.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&alice).await;
                assert_eq!(locks.len(), 1);
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // the waiter still refers to the mutex, so releasing keeps the entry
        drop(guard);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_many_accounts_leave_nothing_behind() {
        let locks = AccountLocks::new();
        for i in 0..1000 {
            let _guard = locks.acquire(&AccountId::new(&format!("acct_{i}"))).await;
        }
        assert!(locks.is_empty());
    }
}
