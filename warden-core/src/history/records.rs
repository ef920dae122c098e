//! The four kinds of fact an account accumulates.
//!
//! Records are immutable and never reference one another. Current lock, expiry and
//! password-change state is always derived from them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, error::ValidationError};

/// Operator recorded on events the engine appends on its own.
pub const SYSTEM_OPERATOR: &str = "system";

/// Anything that happened to one account at one instant.
pub trait Timestamped {
    fn account_id(&self) -> &AccountId;
    fn occurred_at(&self) -> DateTime<Utc>;
}

macro_rules! code_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(Self::$variant),)+
                    other => Err(ValidationError::InvalidField(format!(
                        concat!("Unknown ", stringify!($name), ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

code_enum!(
    /// Outcome recorded for one login attempt.
    LoginResult {
        Success => "SUCCESS",
        Fail => "FAIL",
        Locked => "LOCKED",
        Disabled => "DISABLED",
        Expired => "EXPIRED",
    }
);

code_enum!(
    ExpiryEventType {
        Expire => "EXPIRE",
        Unexpire => "UNEXPIRE",
    }
);

code_enum!(
    PasswordChangeType {
        InitialRegister => "INITIAL_REGISTER",
        AdminReset => "ADMIN_RESET",
        UserChange => "USER_CHANGE",
    }
);

/// Reason codes are free-form; the engine only writes the well-known ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LockReason {
    LoginFailThreshold,
    AdminLock,
    AdminUnlock,
    PasswordReset,
    Other(String),
}

impl LockReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::LoginFailThreshold => "LOGIN_FAIL_THRESHOLD",
            Self::AdminLock => "ADMIN_LOCK",
            Self::AdminUnlock => "ADMIN_UNLOCK",
            Self::PasswordReset => "PASSWORD_RESET",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for LockReason {
    fn from(code: String) -> Self {
        match code.as_str() {
            "LOGIN_FAIL_THRESHOLD" => Self::LoginFailThreshold,
            "ADMIN_LOCK" => Self::AdminLock,
            "ADMIN_UNLOCK" => Self::AdminUnlock,
            "PASSWORD_RESET" => Self::PasswordReset,
            _ => Self::Other(code),
        }
    }
}

impl From<LockReason> for String {
    fn from(reason: LockReason) -> Self {
        reason.as_str().to_string()
    }
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExpiryReason {
    /// Inactivity beyond the configured expiry duration.
    Inactive,
    AdminEnable,
    Other(String),
}

impl ExpiryReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inactive => "INACTIVE_90D",
            Self::AdminEnable => "ADMIN_ENABLE",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for ExpiryReason {
    fn from(code: String) -> Self {
        match code.as_str() {
            "INACTIVE_90D" => Self::Inactive,
            "ADMIN_ENABLE" => Self::AdminEnable,
            _ => Self::Other(code),
        }
    }
}

impl From<ExpiryReason> for String {
    fn from(reason: ExpiryReason) -> Self {
        reason.as_str().to_string()
    }
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One login attempt, including attempts rejected before the credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttemptEvent {
    pub account_id: AccountId,
    pub occurred_at: DateTime<Utc>,
    pub result: LoginResult,
}

impl LoginAttemptEvent {
    pub fn new(account_id: AccountId, result: LoginResult, occurred_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            occurred_at,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEvent {
    pub account_id: AccountId,
    pub occurred_at: DateTime<Utc>,
    pub locked: bool,
    pub reason: LockReason,
    pub operated_by: String,
}

impl LockEvent {
    pub fn lock(
        account_id: AccountId,
        reason: LockReason,
        operated_by: &str,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            occurred_at,
            locked: true,
            reason,
            operated_by: operated_by.to_string(),
        }
    }

    pub fn unlock(
        account_id: AccountId,
        reason: LockReason,
        operated_by: &str,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            occurred_at,
            locked: false,
            reason,
            operated_by: operated_by.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryEvent {
    pub account_id: AccountId,
    pub event_type: ExpiryEventType,
    pub reason: ExpiryReason,
    pub occurred_at: DateTime<Utc>,
    /// `None` when the engine expired the account on its own.
    pub operated_by: Option<String>,
}

impl ExpiryEvent {
    pub fn expire(account_id: AccountId, reason: ExpiryReason, occurred_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            event_type: ExpiryEventType::Expire,
            reason,
            occurred_at,
            operated_by: None,
        }
    }

    pub fn unexpire(
        account_id: AccountId,
        reason: ExpiryReason,
        operated_by: &str,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            event_type: ExpiryEventType::Unexpire,
            reason,
            occurred_at,
            operated_by: Some(operated_by.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChangeEvent {
    pub account_id: AccountId,
    pub encoded_password: String,
    pub change_type: PasswordChangeType,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

impl PasswordChangeEvent {
    pub fn new(
        account_id: AccountId,
        encoded_password: String,
        change_type: PasswordChangeType,
        changed_by: &str,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            encoded_password,
            change_type,
            changed_at,
            changed_by: changed_by.to_string(),
        }
    }
}

impl Timestamped for LoginAttemptEvent {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Timestamped for LockEvent {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Timestamped for ExpiryEvent {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Timestamped for PasswordChangeEvent {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.changed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_result_codes() {
        assert_eq!(LoginResult::Fail.as_str(), "FAIL");
        assert_eq!(
            "EXPIRED".parse::<LoginResult>().unwrap(),
            LoginResult::Expired
        );
        assert!("fail".parse::<LoginResult>().is_err());
    }

    #[test]
    fn test_lock_reason_round_trips_unknown_codes() {
        assert_eq!(
            LockReason::from("LOGIN_FAIL_THRESHOLD".to_string()),
            LockReason::LoginFailThreshold
        );
        let custom = LockReason::from("FRAUD_REVIEW".to_string());
        assert_eq!(custom, LockReason::Other("FRAUD_REVIEW".to_string()));
        assert_eq!(custom.to_string(), "FRAUD_REVIEW");
    }

    #[test]
    fn test_serialized_codes() {
        let event =
            ExpiryEvent::expire(AccountId::new("acct_1"), ExpiryReason::Inactive, Utc::now());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "EXPIRE");
        assert_eq!(json["reason"], "INACTIVE_90D");
        assert!(json["operated_by"].is_null());
    }

    #[test]
    fn test_password_change_timestamp() {
        let at = Utc::now();
        let event = PasswordChangeEvent::new(
            AccountId::new("acct_1"),
            "hash".to_string(),
            PasswordChangeType::UserChange,
            "alice",
            at,
        );
        assert_eq!(event.occurred_at(), at);
    }
}
