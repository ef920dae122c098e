//! Shared state behind every in-memory repository.

use std::collections::HashMap;

use tokio::sync::RwLock;
use warden_core::{
    Account, AccountId, ChangeSet, Error, ExpiryEvent, LockEvent, LoginAttemptEvent,
    PasswordChangeEvent, Recorded,
    error::StorageError,
    history::{EventLog, Timestamped},
};

type Histories<T> = HashMap<AccountId, Vec<Recorded<T>>>;

#[derive(Debug, Default)]
pub(crate) struct State {
    sequence: u64,
    accounts: HashMap<AccountId, Account>,
    login_attempts: Histories<LoginAttemptEvent>,
    lock_events: Histories<LockEvent>,
    expiry_events: Histories<ExpiryEvent>,
    password_changes: Histories<PasswordChangeEvent>,
}

impl State {
    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn record<T: Timestamped + Clone>(
        sequence: u64,
        histories: &mut Histories<T>,
        event: T,
    ) -> Recorded<T> {
        let recorded = Recorded::new(sequence, event);
        histories
            .entry(recorded.account_id().clone())
            .or_default()
            .push(recorded.clone());
        recorded
    }

    pub fn account(&self, account_id: &AccountId) -> Option<Account> {
        self.accounts.get(account_id).cloned()
    }

    pub fn account_by_login_id(&self, login_id: &str) -> Option<Account> {
        self.accounts
            .values()
            .find(|a| a.login_id == login_id)
            .cloned()
    }

    /// Fails without side effects when another account holds the login id.
    pub fn check_account(&self, account: &Account) -> Result<(), Error> {
        let taken = self
            .accounts
            .values()
            .any(|other| other.login_id == account.login_id && other.id != account.id);
        if taken {
            tracing::error!(account_id = %account.id, "Login id already in use by another account");
            return Err(StorageError::Constraint(format!(
                "login id {} is already in use",
                account.login_id
            ))
            .into());
        }
        Ok(())
    }

    pub fn save_account(&mut self, account: Account) -> Result<Account, Error> {
        self.check_account(&account)?;
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    pub fn append_login_attempt(
        &mut self,
        event: LoginAttemptEvent,
    ) -> Recorded<LoginAttemptEvent> {
        let sequence = self.next_sequence();
        Self::record(sequence, &mut self.login_attempts, event)
    }

    pub fn append_lock_event(&mut self, event: LockEvent) -> Recorded<LockEvent> {
        let sequence = self.next_sequence();
        Self::record(sequence, &mut self.lock_events, event)
    }

    pub fn append_expiry_event(&mut self, event: ExpiryEvent) -> Recorded<ExpiryEvent> {
        let sequence = self.next_sequence();
        Self::record(sequence, &mut self.expiry_events, event)
    }

    pub fn append_password_change(
        &mut self,
        event: PasswordChangeEvent,
    ) -> Recorded<PasswordChangeEvent> {
        let sequence = self.next_sequence();
        Self::record(sequence, &mut self.password_changes, event)
    }

    pub fn login_attempts(&self, account_id: &AccountId) -> EventLog<LoginAttemptEvent> {
        Self::log(&self.login_attempts, account_id)
    }

    pub fn lock_events(&self, account_id: &AccountId) -> EventLog<LockEvent> {
        Self::log(&self.lock_events, account_id)
    }

    pub fn expiry_events(&self, account_id: &AccountId) -> EventLog<ExpiryEvent> {
        Self::log(&self.expiry_events, account_id)
    }

    pub fn password_changes(&self, account_id: &AccountId) -> EventLog<PasswordChangeEvent> {
        Self::log(&self.password_changes, account_id)
    }

    fn log<T: Timestamped + Clone>(
        histories: &Histories<T>,
        account_id: &AccountId,
    ) -> EventLog<T> {
        EventLog::new(histories.get(account_id).cloned().unwrap_or_default())
    }

    /// Apply a whole change set. The account check runs before anything is written.
    pub fn apply(&mut self, changes: ChangeSet) -> Result<(), Error> {
        let ChangeSet {
            account,
            login_attempts,
            lock_events,
            expiry_events,
            password_changes,
        } = changes;

        if let Some(account) = &account {
            self.check_account(account)?;
        }

        if let Some(account) = account {
            self.accounts.insert(account.id.clone(), account);
        }
        for event in login_attempts {
            self.append_login_attempt(event);
        }
        for event in lock_events {
            self.append_lock_event(event);
        }
        for event in expiry_events {
            self.append_expiry_event(event);
        }
        for event in password_changes {
            self.append_password_change(event);
        }
        Ok(())
    }
}

/// One lock over all state, so a commit is never observed half applied.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}
