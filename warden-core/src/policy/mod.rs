//! Pure derivations over account histories.
//!
//! Policies never touch storage and never mutate anything. Services feed them
//! event logs, act on what they return, and commit the result.

pub mod expiry;
pub mod lockout;
pub mod password;
pub mod password_history;

pub use expiry::{ExpiryDecision, ExpiryPolicy};
pub use lockout::{LockState, LockoutPolicy};
pub use password::{
    AlphaNumeric, CompositePasswordPolicy, MinLength, NotSameAsLoginId, PasswordPolicy,
    PasswordRule, Required, Violation,
};
pub use password_history::{PasswordChangeRequirement, PasswordHistoryGuard};
