use crate::{
    Account, Error,
    history::{ExpiryEvent, LockEvent, LoginAttemptEvent, PasswordChangeEvent},
};
use async_trait::async_trait;

/// Everything one decision writes.
///
/// A change set is committed as a unit: the attempt and any lock or expiry it
/// triggered are recorded together, or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub account: Option<Account>,
    pub login_attempts: Vec<LoginAttemptEvent>,
    pub lock_events: Vec<LockEvent>,
    pub expiry_events: Vec<ExpiryEvent>,
    pub password_changes: Vec<PasswordChangeEvent>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_account(&mut self, account: Account) -> &mut Self {
        self.account = Some(account);
        self
    }

    pub fn login_attempt(&mut self, event: LoginAttemptEvent) -> &mut Self {
        self.login_attempts.push(event);
        self
    }

    pub fn lock_event(&mut self, event: LockEvent) -> &mut Self {
        self.lock_events.push(event);
        self
    }

    pub fn expiry_event(&mut self, event: ExpiryEvent) -> &mut Self {
        self.expiry_events.push(event);
        self
    }

    pub fn password_change(&mut self, event: PasswordChangeEvent) -> &mut Self {
        self.password_changes.push(event);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.account.is_none()
            && self.login_attempts.is_empty()
            && self.lock_events.is_empty()
            && self.expiry_events.is_empty()
            && self.password_changes.is_empty()
    }
}

/// Atomic write path shared by every service.
#[async_trait]
pub trait JournalRepository: Send + Sync + 'static {
    /// Apply the account update and append every event, all or nothing.
    async fn commit(&self, changes: ChangeSet) -> Result<(), Error>;
}
