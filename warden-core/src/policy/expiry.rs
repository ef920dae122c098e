//! Inactivity (dormancy) expiry.

use chrono::{DateTime, Duration, Utc};

use crate::{
    AccountId,
    history::{EventLog, ExpiryEvent, ExpiryEventType, ExpiryReason},
};

pub const DEFAULT_EXPIRY_DAYS: i64 = 90;

/// What an expiry evaluation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryDecision {
    /// The latest expiry event is already `Expire`; nothing to append.
    AlreadyExpired,
    /// Inactive for too long; an `Expire` event must be appended.
    ExpireNow,
    /// Never logged in and never re-enabled: no baseline to measure from.
    NoBaseline,
    Active,
}

impl ExpiryDecision {
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::AlreadyExpired | Self::ExpireNow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    expiry_duration: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_EXPIRY_DAYS))
    }
}

impl ExpiryPolicy {
    pub fn new(expiry_duration: Duration) -> Self {
        Self { expiry_duration }
    }

    pub fn expiry_duration(&self) -> Duration {
        self.expiry_duration
    }

    pub fn is_expired(expiry_events: &EventLog<ExpiryEvent>) -> bool {
        expiry_events
            .latest()
            .is_some_and(|e| e.event_type == ExpiryEventType::Expire)
    }

    pub fn last_unexpire_at(expiry_events: &EventLog<ExpiryEvent>) -> Option<DateTime<Utc>> {
        expiry_events
            .iter()
            .find(|e| e.event_type == ExpiryEventType::Unexpire)
            .map(|e| e.occurred_at)
    }

    /// The later of the last successful login and the last administrative re-enable.
    pub fn baseline(
        last_success_at: Option<DateTime<Utc>>,
        last_unexpire_at: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        last_success_at.max(last_unexpire_at)
    }

    pub fn evaluate(
        &self,
        expiry_events: &EventLog<ExpiryEvent>,
        last_success_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ExpiryDecision {
        if Self::is_expired(expiry_events) {
            return ExpiryDecision::AlreadyExpired;
        }

        let Some(base_at) = Self::baseline(last_success_at, Self::last_unexpire_at(expiry_events))
        else {
            return ExpiryDecision::NoBaseline;
        };

        if now - base_at > self.expiry_duration {
            ExpiryDecision::ExpireNow
        } else {
            ExpiryDecision::Active
        }
    }

    /// Administrative re-enable. `None` unless currently expired.
    pub fn unexpire_transition(
        account_id: &AccountId,
        expiry_events: &EventLog<ExpiryEvent>,
        operated_by: &str,
        at: DateTime<Utc>,
    ) -> Option<ExpiryEvent> {
        Self::is_expired(expiry_events).then(|| {
            ExpiryEvent::unexpire(account_id.clone(), ExpiryReason::AdminEnable, operated_by, at)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("acct_alice")
    }

    #[test]
    fn test_no_baseline_never_expires() {
        let policy = ExpiryPolicy::default();
        let decision = policy.evaluate(&EventLog::empty(), None, Utc::now());
        assert_eq!(decision, ExpiryDecision::NoBaseline);
        assert!(!decision.is_expired());
    }

    #[test]
    fn test_ninety_day_boundary() {
        let policy = ExpiryPolicy::default();
        let base = Utc::now();
        let log = EventLog::empty();

        let just_before = base + Duration::days(90) - Duration::seconds(1);
        assert_eq!(
            policy.evaluate(&log, Some(base), just_before),
            ExpiryDecision::Active
        );

        let exactly = base + Duration::days(90);
        assert_eq!(
            policy.evaluate(&log, Some(base), exactly),
            ExpiryDecision::Active
        );

        let just_after = base + Duration::days(90) + Duration::seconds(1);
        assert_eq!(
            policy.evaluate(&log, Some(base), just_after),
            ExpiryDecision::ExpireNow
        );
    }

    #[test]
    fn test_already_expired_short_circuits() {
        let policy = ExpiryPolicy::default();
        let now = Utc::now();
        let log =
            EventLog::from_events([ExpiryEvent::expire(alice(), ExpiryReason::Inactive, now)]);

        // a recent login does not matter once the latest event is Expire
        assert_eq!(
            policy.evaluate(&log, Some(now), now),
            ExpiryDecision::AlreadyExpired
        );
    }

    #[test]
    fn test_unexpire_moves_the_baseline() {
        let policy = ExpiryPolicy::default();
        let login = Utc::now();
        let expired_at = login + Duration::days(91);
        let unexpired_at = login + Duration::days(100);
        let log = EventLog::from_events([
            ExpiryEvent::expire(alice(), ExpiryReason::Inactive, expired_at),
            ExpiryEvent::unexpire(alice(), ExpiryReason::AdminEnable, "admin", unexpired_at),
        ]);

        assert!(!ExpiryPolicy::is_expired(&log));
        assert_eq!(
            policy.evaluate(&log, Some(login), unexpired_at + Duration::days(1)),
            ExpiryDecision::Active
        );
        assert_eq!(
            policy.evaluate(&log, Some(login), unexpired_at + Duration::days(91)),
            ExpiryDecision::ExpireNow
        );
    }

    #[test]
    fn test_unexpire_transition_is_a_no_op_when_active() {
        let now = Utc::now();
        assert!(
            ExpiryPolicy::unexpire_transition(&alice(), &EventLog::empty(), "admin", now).is_none()
        );

        let expired =
            EventLog::from_events([ExpiryEvent::expire(alice(), ExpiryReason::Inactive, now)]);
        let event = ExpiryPolicy::unexpire_transition(&alice(), &expired, "admin", now).unwrap();
        assert_eq!(event.event_type, ExpiryEventType::Unexpire);
        assert_eq!(event.reason, ExpiryReason::AdminEnable);
        assert_eq!(event.operated_by.as_deref(), Some("admin"));
    }
}
