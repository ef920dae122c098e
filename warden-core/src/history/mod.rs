//! Append-only account histories and the analyses run over them.
//!
//! An [`EventLog`] is an immutable, time-ordered view over [`Recorded`] events.
//! Ordering is `(occurred_at, sequence)` descending: the newest event comes first
//! and events sharing a timestamp are ordered by the sequence number the storage
//! assigned at append time.

pub mod records;

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use records::{
    ExpiryEvent, ExpiryEventType, ExpiryReason, LockEvent, LockReason, LoginAttemptEvent,
    LoginResult, PasswordChangeEvent, PasswordChangeType, SYSTEM_OPERATOR, Timestamped,
};

/// An event as stored, with its monotonic sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recorded<T> {
    /// Assigned at append time, increasing across every history of the store.
    pub sequence: u64,
    pub event: T,
}

/// Where a stored event sits in time. Orders by timestamp, then by sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub occurred_at: DateTime<Utc>,
    pub sequence: u64,
}

impl<T> Recorded<T> {
    pub fn new(sequence: u64, event: T) -> Self {
        Self { sequence, event }
    }

    pub fn into_inner(self) -> T {
        self.event
    }
}

impl<T: Timestamped> Recorded<T> {
    pub fn position(&self) -> Position {
        Position {
            occurred_at: self.occurred_at(),
            sequence: self.sequence,
        }
    }
}

impl<T> Deref for Recorded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.event
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog<T> {
    // newest first
    entries: Vec<Recorded<T>>,
}

impl<T> Default for EventLog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Timestamped> EventLog<T> {
    pub fn new(mut entries: Vec<Recorded<T>>) -> Self {
        entries.sort_by(|a, b| {
            (b.occurred_at(), b.sequence).cmp(&(a.occurred_at(), a.sequence))
        });
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a log from events in append order, numbering them from 1.
    pub fn from_events(events: impl IntoIterator<Item = T>) -> Self {
        Self::new(
            events
                .into_iter()
                .enumerate()
                .map(|(i, event)| Recorded::new(i as u64 + 1, event))
                .collect(),
        )
    }

    /// A new log that also contains `event`. The receiver is left untouched.
    pub fn append(&self, event: T) -> Self
    where
        T: Clone,
    {
        let mut entries = self.entries.clone();
        entries.push(Recorded::new(self.next_sequence(), event));
        Self::new(entries)
    }

    pub fn next_sequence(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.sequence)
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Keep only the `limit` newest entries.
    pub fn take_newest(mut self, limit: usize) -> Self {
        self.entries.truncate(limit);
        self
    }

    pub fn latest(&self) -> Option<&Recorded<T>> {
        self.entries.first()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Recorded<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Recorded<T>> {
        self.entries
    }
}

impl EventLog<LoginAttemptEvent> {
    /// Length of the unbroken run of `Fail` results at the head of the log.
    ///
    /// The walk stops, without counting, at the first non-`Fail` result or at the
    /// first event positioned at or before `boundary_exclusive`. Events sharing the
    /// boundary's timestamp are compared by sequence.
    pub fn count_consecutive_failures_since(&self, boundary_exclusive: Option<Position>) -> u32 {
        let mut count = 0;
        for entry in self.iter() {
            if boundary_exclusive.is_some_and(|boundary| entry.position() <= boundary) {
                break;
            }
            if entry.result != LoginResult::Fail {
                break;
            }
            count += 1;
        }
        count
    }

    /// When the most recent successful login happened.
    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.successes().next()
    }

    /// When the login before the most recent successful one happened.
    ///
    /// The newest `Success` is "this login"; the one before it is the previous
    /// login shown to the user.
    pub fn find_previous_success_at(&self) -> Option<DateTime<Utc>> {
        self.successes().nth(1)
    }

    fn successes(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.iter()
            .filter(|e| e.result == LoginResult::Success)
            .map(|e| e.occurred_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountId;
    use chrono::Duration;

    fn attempt(result: LoginResult, at: DateTime<Utc>) -> LoginAttemptEvent {
        LoginAttemptEvent::new(AccountId::new("acct_alice"), result, at)
    }

    fn log_of(start: DateTime<Utc>, results: &[LoginResult]) -> EventLog<LoginAttemptEvent> {
        EventLog::from_events(
            results
                .iter()
                .enumerate()
                .map(|(i, r)| attempt(*r, start + Duration::seconds(i as i64))),
        )
    }

    #[test]
    fn test_empty_log_counts_zero() {
        let log = EventLog::<LoginAttemptEvent>::empty();
        assert_eq!(log.count_consecutive_failures_since(None), 0);
        assert_eq!(log.find_previous_success_at(), None);
        assert!(log.latest().is_none());
    }

    #[test]
    fn test_counts_only_the_trailing_run_of_failures() {
        use LoginResult::*;
        let log = log_of(Utc::now(), &[Fail, Fail, Success, Fail, Fail, Fail]);
        assert_eq!(log.count_consecutive_failures_since(None), 3);
    }

    #[test]
    fn test_non_fail_results_break_the_run() {
        use LoginResult::*;
        let log = log_of(Utc::now(), &[Fail, Fail, Locked, Fail]);
        assert_eq!(log.count_consecutive_failures_since(None), 1);
    }

    #[test]
    fn test_boundary_is_exclusive() {
        use LoginResult::*;
        let start = Utc::now();
        let log = log_of(start, &[Fail, Fail, Fail, Fail]);

        // events at start+0..start+3 with sequences 1..4; the boundary excludes the first two
        let boundary = Position {
            occurred_at: start + Duration::seconds(1),
            sequence: 2,
        };
        assert_eq!(log.count_consecutive_failures_since(Some(boundary)), 2);
        let later = Position {
            occurred_at: start + Duration::seconds(10),
            sequence: 0,
        };
        assert_eq!(log.count_consecutive_failures_since(Some(later)), 0);
    }

    #[test]
    fn test_boundary_on_a_shared_timestamp_uses_the_sequence() {
        let now = Utc::now();
        let log = EventLog::new(
            [3, 7, 8, 9]
                .into_iter()
                .map(|sequence| Recorded::new(sequence, attempt(LoginResult::Fail, now)))
                .collect(),
        );

        let boundary = Position {
            occurred_at: now,
            sequence: 5,
        };
        assert_eq!(log.count_consecutive_failures_since(Some(boundary)), 3);
    }

    #[test]
    fn test_previous_success_is_second_newest() {
        use LoginResult::*;
        let start = Utc::now();
        let log = log_of(start, &[Success, Fail, Success, Fail, Success]);
        assert_eq!(log.last_success_at(), Some(start + Duration::seconds(4)));
        assert_eq!(
            log.find_previous_success_at(),
            Some(start + Duration::seconds(2))
        );

        let single = log_of(start, &[Fail, Success]);
        assert_eq!(single.find_previous_success_at(), None);
    }

    #[test]
    fn test_append_does_not_mutate_original() {
        let now = Utc::now();
        let log = EventLog::from_events([attempt(LoginResult::Fail, now)]);
        let appended = log.append(attempt(LoginResult::Fail, now));

        assert_eq!(log.len(), 1);
        assert_eq!(appended.len(), 2);
        assert_eq!(appended.count_consecutive_failures_since(None), 2);
    }

    #[test]
    fn test_sequence_breaks_timestamp_ties() {
        let now = Utc::now();
        let log = EventLog::from_events([
            attempt(LoginResult::Fail, now),
            attempt(LoginResult::Success, now),
        ]);
        let latest = log.latest().unwrap();
        assert_eq!(latest.result, LoginResult::Success);
        assert_eq!(latest.sequence, 2);

        let appended = log.append(attempt(LoginResult::Fail, now));
        assert_eq!(appended.latest().unwrap().result, LoginResult::Fail);
        assert_eq!(appended.latest().unwrap().sequence, 3);
    }

    #[test]
    fn test_take_newest() {
        use LoginResult::*;
        let log = log_of(Utc::now(), &[Success, Fail, Fail]).take_newest(2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.count_consecutive_failures_since(None), 2);
        assert_eq!(log.last_success_at(), None);
    }
}
