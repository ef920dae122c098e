//! Accounts and their administrative lifecycle
//!
//! An account is an immutable value. Every transition returns a new value and the
//! caller decides whether to persist it.
//!
//! | Field           | Type       | Description                                              |
//! | --------------- | ---------- | -------------------------------------------------------- |
//! | `id`            | `AccountId`| Assigned on creation, never changes.                     |
//! | `login_id`      | `String`   | Business key used to sign in. May change.                |
//! | `password_hash` | `String`   | Opaque output of the configured `PasswordHasher`.        |
//! | `enabled`       | `bool`     | Administrative switch.                                   |
//! | `deleted`       | `bool`     | Logical delete. Terminal.                                |
//!
//! Lock and expiry state are deliberately absent: they are derived from event
//! histories, see [`crate::policy`].
use crate::{
    Error,
    error::utilities::RequiredFieldExt,
    id::{generate_prefixed_id, validate_prefixed_id},
    validation::validate_login_id,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for an account
/// This value should be treated as opaque
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("acct"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for an account ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "acct")
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub login_id: String,
    pub password_hash: String,
    pub enabled: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn builder() -> AccountBuilder {
        AccountBuilder::default()
    }

    /// Whether the administrative flags allow this account to sign in at all.
    pub fn can_login(&self) -> bool {
        self.enabled && !self.deleted
    }

    pub fn enable(&self, at: DateTime<Utc>) -> Self {
        if self.deleted {
            return self.clone();
        }
        Self {
            enabled: true,
            updated_at: at,
            ..self.clone()
        }
    }

    pub fn disable(&self, at: DateTime<Utc>) -> Self {
        Self {
            enabled: false,
            updated_at: at,
            ..self.clone()
        }
    }

    /// Logically delete the account. There is no way back.
    pub fn delete(&self, at: DateTime<Utc>) -> Self {
        Self {
            deleted: true,
            enabled: false,
            updated_at: at,
            ..self.clone()
        }
    }

    pub fn with_password_hash(&self, password_hash: String, at: DateTime<Utc>) -> Self {
        Self {
            password_hash,
            updated_at: at,
            ..self.clone()
        }
    }

    pub fn with_login_id(&self, login_id: &str, at: DateTime<Utc>) -> Result<Self, Error> {
        validate_login_id(login_id)?;
        Ok(Self {
            login_id: login_id.to_string(),
            updated_at: at,
            ..self.clone()
        })
    }
}

pub struct AccountBuilder {
    id: Option<AccountId>,
    login_id: Option<String>,
    password_hash: Option<String>,
    enabled: bool,
    deleted: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Default for AccountBuilder {
    fn default() -> Self {
        Self {
            id: None,
            login_id: None,
            password_hash: None,
            enabled: true,
            deleted: false,
            created_at: None,
            updated_at: None,
        }
    }
}

impl AccountBuilder {
    pub fn id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn login_id(mut self, login_id: impl Into<String>) -> Self {
        self.login_id = Some(login_id.into());
        self
    }

    pub fn password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = Some(password_hash.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn build(self) -> Result<Account, Error> {
        let login_id = self.login_id.require_field("Login id")?;
        validate_login_id(&login_id)?;
        let password_hash = self.password_hash.require_field("Password hash")?;

        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Ok(Account {
            id: self.id.unwrap_or_default(),
            login_id,
            password_hash,
            enabled: self.enabled && !self.deleted,
            deleted: self.deleted,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        })
    }
}
