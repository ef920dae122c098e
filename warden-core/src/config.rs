//! Tunables for lockout, expiry and password rules.
//!
//! [`SecurityConfig`] derives serde so it can sit inside an application's own
//! configuration file. Durations are written as whole days.
//!
//! ```rust
//! use chrono::Duration;
//! use warden_core::SecurityConfig;
//!
//! let config = SecurityConfig::default()
//!     .with_fail_threshold(10)
//!     .with_account_expiry(Duration::days(30));
//! assert_eq!(config.fail_threshold, 10);
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::policy::{
    CompositePasswordPolicy, ExpiryPolicy, LockoutPolicy, PasswordHistoryGuard, expiry,
    lockout, password, password_history,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Consecutive failures, counted since the last unlock, that lock an account
    pub fail_threshold: u32,
    /// Inactivity after which an account expires
    #[serde(with = "duration_days")]
    pub account_expiry: Duration,
    /// Age after which a user-chosen password must be changed
    #[serde(with = "duration_days")]
    pub password_expiry: Duration,
    /// How many previous passwords may not be reused
    pub password_reuse_depth: usize,
    pub min_password_length: usize,
    /// Most recent login attempts fetched per evaluation
    pub login_history_window: usize,
    /// Most recent lock events fetched per evaluation
    pub lock_history_window: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            fail_threshold: lockout::DEFAULT_FAIL_THRESHOLD,
            account_expiry: Duration::days(expiry::DEFAULT_EXPIRY_DAYS),
            password_expiry: Duration::days(password_history::DEFAULT_PASSWORD_EXPIRY_DAYS),
            password_reuse_depth: password_history::DEFAULT_REUSE_DEPTH,
            min_password_length: password::DEFAULT_MIN_LENGTH,
            login_history_window: 50,
            lock_history_window: 10,
        }
    }
}

impl SecurityConfig {
    pub fn with_fail_threshold(mut self, fail_threshold: u32) -> Self {
        self.fail_threshold = fail_threshold;
        self
    }

    pub fn with_account_expiry(mut self, account_expiry: Duration) -> Self {
        self.account_expiry = account_expiry;
        self
    }

    pub fn with_password_expiry(mut self, password_expiry: Duration) -> Self {
        self.password_expiry = password_expiry;
        self
    }

    pub fn with_password_reuse_depth(mut self, depth: usize) -> Self {
        self.password_reuse_depth = depth;
        self
    }

    pub fn with_min_password_length(mut self, min_length: usize) -> Self {
        self.min_password_length = min_length;
        self
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(self.fail_threshold)
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(self.account_expiry)
    }

    pub fn password_policy(&self) -> CompositePasswordPolicy {
        CompositePasswordPolicy::standard(self.min_password_length)
    }

    pub fn history_guard(&self) -> PasswordHistoryGuard {
        PasswordHistoryGuard::new(self.password_expiry, self.password_reuse_depth)
    }

    /// Login attempts to fetch: never fewer than the threshold needs.
    pub fn login_window(&self) -> usize {
        self.login_history_window.max(self.fail_threshold as usize)
    }
}

mod duration_days {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_days())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let days = i64::deserialize(deserializer)?;
        Duration::try_days(days).ok_or_else(|| {
            serde::de::Error::custom(format!("duration of {days} days is out of range"))
        })
    }
}
