//! Forced password changes and reuse prevention, derived from password-change history.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    crypto::PasswordHasher,
    error::AuthError,
    history::{PasswordChangeEvent, PasswordChangeType, Recorded},
};

pub const DEFAULT_PASSWORD_EXPIRY_DAYS: i64 = 90;
pub const DEFAULT_REUSE_DEPTH: usize = 3;

/// Why, if at all, the account must pick a new password before continuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PasswordChangeRequirement {
    None,
    Expired,
    AdminReset,
    InitialRegister,
}

impl PasswordChangeRequirement {
    pub fn is_required(&self) -> bool {
        *self != Self::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHistoryGuard {
    password_expiry: Duration,
    reuse_depth: usize,
}

impl Default for PasswordHistoryGuard {
    fn default() -> Self {
        Self::new(
            Duration::days(DEFAULT_PASSWORD_EXPIRY_DAYS),
            DEFAULT_REUSE_DEPTH,
        )
    }
}

impl PasswordHistoryGuard {
    pub fn new(password_expiry: Duration, reuse_depth: usize) -> Self {
        Self {
            password_expiry,
            reuse_depth,
        }
    }

    pub fn reuse_depth(&self) -> usize {
        self.reuse_depth
    }

    pub fn requirement_of(
        &self,
        latest: Option<&PasswordChangeEvent>,
        now: DateTime<Utc>,
    ) -> PasswordChangeRequirement {
        // no history at all: force a change
        let Some(latest) = latest else {
            return PasswordChangeRequirement::InitialRegister;
        };

        match latest.change_type {
            PasswordChangeType::AdminReset => PasswordChangeRequirement::AdminReset,
            PasswordChangeType::InitialRegister => PasswordChangeRequirement::InitialRegister,
            PasswordChangeType::UserChange if now - latest.changed_at > self.password_expiry => {
                PasswordChangeRequirement::Expired
            }
            PasswordChangeType::UserChange => PasswordChangeRequirement::None,
        }
    }

    pub fn is_password_change_required(
        &self,
        latest: Option<&PasswordChangeEvent>,
        now: DateTime<Utc>,
    ) -> bool {
        self.requirement_of(latest, now).is_required()
    }

    /// Rejects `raw_password` when it matches any of the newest `reuse_depth` entries.
    ///
    /// `recent` must be ordered newest first.
    pub fn ensure_not_reused(
        &self,
        hasher: &dyn PasswordHasher,
        raw_password: &str,
        recent: &[Recorded<PasswordChangeEvent>],
    ) -> Result<(), Error> {
        for entry in recent.iter().take(self.reuse_depth) {
            if hasher.verify(raw_password, &entry.encoded_password)? {
                return Err(AuthError::PasswordReuseNotAllowed.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountId;

    struct PlainTextHasher;

    impl PasswordHasher for PlainTextHasher {
        fn hash(&self, raw_password: &str) -> Result<String, Error> {
            Ok(format!("plain:{raw_password}"))
        }

        fn verify(&self, raw_password: &str, encoded: &str) -> Result<bool, Error> {
            Ok(encoded == format!("plain:{raw_password}"))
        }
    }

    fn change(kind: PasswordChangeType, raw: &str, at: DateTime<Utc>) -> PasswordChangeEvent {
        PasswordChangeEvent::new(
            AccountId::new("acct_alice"),
            format!("plain:{raw}"),
            kind,
            "alice",
            at,
        )
    }

    #[test]
    fn test_requirement_without_history() {
        let guard = PasswordHistoryGuard::default();
        assert_eq!(
            guard.requirement_of(None, Utc::now()),
            PasswordChangeRequirement::InitialRegister
        );
    }

    #[test]
    fn test_requirement_follows_latest_change_type() {
        let guard = PasswordHistoryGuard::default();
        let now = Utc::now();

        let reset = change(PasswordChangeType::AdminReset, "x", now);
        assert_eq!(
            guard.requirement_of(Some(&reset), now),
            PasswordChangeRequirement::AdminReset
        );

        let initial = change(PasswordChangeType::InitialRegister, "x", now);
        assert_eq!(
            guard.requirement_of(Some(&initial), now),
            PasswordChangeRequirement::InitialRegister
        );
    }

    #[test]
    fn test_user_change_expires_after_ninety_days() {
        let guard = PasswordHistoryGuard::default();
        let changed_at = Utc::now();
        let user = change(PasswordChangeType::UserChange, "x", changed_at);

        assert_eq!(
            guard.requirement_of(Some(&user), changed_at + Duration::days(90)),
            PasswordChangeRequirement::None
        );
        assert!(!guard.is_password_change_required(Some(&user), changed_at));
        assert_eq!(
            guard.requirement_of(
                Some(&user),
                changed_at + Duration::days(90) + Duration::seconds(1)
            ),
            PasswordChangeRequirement::Expired
        );
    }

    #[test]
    fn test_reuse_window_covers_three_entries() {
        let guard = PasswordHistoryGuard::default();
        let now = Utc::now();
        let recent: Vec<_> = ["pass4", "pass3", "pass2", "pass1"]
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                Recorded::new(4 - i as u64, change(PasswordChangeType::UserChange, raw, now))
            })
            .collect();

        for raw in ["pass4", "pass3", "pass2"] {
            let err = guard
                .ensure_not_reused(&PlainTextHasher, raw, &recent)
                .unwrap_err();
            assert!(matches!(err, Error::Auth(AuthError::PasswordReuseNotAllowed)));
        }
        assert!(
            guard
                .ensure_not_reused(&PlainTextHasher, "pass1", &recent)
                .is_ok()
        );
        assert!(
            guard
                .ensure_not_reused(&PlainTextHasher, "fresh5", &recent)
                .is_ok()
        );
    }
}
