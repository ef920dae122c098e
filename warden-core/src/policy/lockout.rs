//! Consecutive-failure lockout.
//!
//! Lock state is never stored as a flag. It is the `locked` value of the most
//! recent [`LockEvent`] for the account, or unlocked when there is none.

use chrono::{DateTime, Utc};

use crate::{
    AccountId,
    history::{EventLog, LockEvent, LockReason, LoginAttemptEvent, Position},
};

pub const DEFAULT_FAIL_THRESHOLD: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    fail_threshold: u32,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FAIL_THRESHOLD)
    }
}

impl LockoutPolicy {
    pub fn new(fail_threshold: u32) -> Self {
        Self {
            fail_threshold: fail_threshold.max(1),
        }
    }

    pub fn fail_threshold(&self) -> u32 {
        self.fail_threshold
    }

    /// Consecutive failures at the head of `history`, counted after the last unlock.
    pub fn consecutive_failures(
        history: &EventLog<LoginAttemptEvent>,
        lock_events: &EventLog<LockEvent>,
    ) -> u32 {
        history.count_consecutive_failures_since(Self::last_unlock(lock_events))
    }

    pub fn is_lockout(&self, consecutive_failures: u32) -> bool {
        consecutive_failures >= self.fail_threshold
    }

    pub fn state(lock_events: &EventLog<LockEvent>) -> LockState {
        if Self::is_locked(lock_events) {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    pub fn is_locked(lock_events: &EventLog<LockEvent>) -> bool {
        lock_events.latest().is_some_and(|e| e.locked)
    }

    /// Position of the most recent unlock. Failures at or before it do not count.
    pub fn last_unlock(lock_events: &EventLog<LockEvent>) -> Option<Position> {
        lock_events
            .iter()
            .find(|e| !e.locked)
            .map(|e| e.position())
    }

    /// The lock event to append when a failure brings the run to
    /// `consecutive_failures`, if any.
    pub fn lock_after_failure(
        &self,
        account_id: &AccountId,
        consecutive_failures: u32,
        lock_events: &EventLog<LockEvent>,
        operated_by: &str,
        at: DateTime<Utc>,
    ) -> Option<LockEvent> {
        if Self::is_locked(lock_events) || !self.is_lockout(consecutive_failures) {
            return None;
        }
        Some(LockEvent::lock(
            account_id.clone(),
            LockReason::LoginFailThreshold,
            operated_by,
            at,
        ))
    }

    /// Explicit lock. `None` when already locked.
    pub fn lock_transition(
        account_id: &AccountId,
        lock_events: &EventLog<LockEvent>,
        reason: LockReason,
        operated_by: &str,
        at: DateTime<Utc>,
    ) -> Option<LockEvent> {
        (!Self::is_locked(lock_events))
            .then(|| LockEvent::lock(account_id.clone(), reason, operated_by, at))
    }

    /// Explicit unlock. `None` when already unlocked, so no redundant event is written.
    pub fn unlock_transition(
        account_id: &AccountId,
        lock_events: &EventLog<LockEvent>,
        reason: LockReason,
        operated_by: &str,
        at: DateTime<Utc>,
    ) -> Option<LockEvent> {
        Self::is_locked(lock_events)
            .then(|| LockEvent::unlock(account_id.clone(), reason, operated_by, at))
    }
}
