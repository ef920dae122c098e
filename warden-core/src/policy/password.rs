//! Composable password rules.
//!
//! Each rule inspects the candidate on its own. A policy runs every rule, so a
//! caller can show all defects at once instead of one per attempt.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::PasswordPolicyViolation;

pub const DEFAULT_MIN_LENGTH: usize = 5;

static ALPHA_NUMERIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]+$").expect("Invalid alphanumeric regex pattern"));

/// A message key plus positional arguments. Rendering is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub key: &'static str,
    pub args: Vec<String>,
}

impl Violation {
    pub fn new(key: &'static str, args: Vec<String>) -> Self {
        Self { key, args }
    }
}

pub trait PasswordRule: Send + Sync + 'static {
    fn validate(&self, candidate: Option<&str>, login_id: &str) -> Option<Violation>;
}

pub struct Required;

impl PasswordRule for Required {
    fn validate(&self, candidate: Option<&str>, _login_id: &str) -> Option<Violation> {
        match candidate {
            Some(c) if !c.trim().is_empty() => None,
            _ => Some(Violation::new("password.required", vec![])),
        }
    }
}

pub struct MinLength(pub usize);

impl PasswordRule for MinLength {
    fn validate(&self, candidate: Option<&str>, _login_id: &str) -> Option<Violation> {
        let candidate = candidate?;
        (candidate.trim().chars().count() < self.0)
            .then(|| Violation::new("password.min_length", vec![self.0.to_string()]))
    }
}

pub struct AlphaNumeric;

impl PasswordRule for AlphaNumeric {
    fn validate(&self, candidate: Option<&str>, _login_id: &str) -> Option<Violation> {
        let candidate = candidate?;
        (!ALPHA_NUMERIC_REGEX.is_match(candidate.trim()))
            .then(|| Violation::new("password.alpha_numeric", vec![]))
    }
}

pub struct NotSameAsLoginId;

impl PasswordRule for NotSameAsLoginId {
    fn validate(&self, candidate: Option<&str>, login_id: &str) -> Option<Violation> {
        let candidate = candidate?;
        (candidate.trim() == login_id).then(|| {
            Violation::new("password.same_as_login_id", vec![login_id.to_string()])
        })
    }
}

pub trait PasswordPolicy: Send + Sync + 'static {
    /// Fails with every violated rule, or succeeds when none is violated.
    fn validate_password(
        &self,
        candidate: Option<&str>,
        login_id: &str,
    ) -> Result<(), PasswordPolicyViolation>;
}

pub struct CompositePasswordPolicy {
    rules: Vec<Box<dyn PasswordRule>>,
}

impl Default for CompositePasswordPolicy {
    fn default() -> Self {
        Self::standard(DEFAULT_MIN_LENGTH)
    }
}

impl CompositePasswordPolicy {
    pub fn new(rules: Vec<Box<dyn PasswordRule>>) -> Self {
        Self { rules }
    }

    /// Required, MinLength, AlphaNumeric and NotSameAsLoginId.
    pub fn standard(min_length: usize) -> Self {
        Self::new(vec![
            Box::new(Required),
            Box::new(MinLength(min_length)),
            Box::new(AlphaNumeric),
            Box::new(NotSameAsLoginId),
        ])
    }

    pub fn with_rule(mut self, rule: impl PasswordRule) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn violations(&self, candidate: Option<&str>, login_id: &str) -> Vec<Violation> {
        self.rules
            .iter()
            .filter_map(|rule| rule.validate(candidate, login_id))
            .collect()
    }
}

impl PasswordPolicy for CompositePasswordPolicy {
    fn validate_password(
        &self,
        candidate: Option<&str>,
        login_id: &str,
    ) -> Result<(), PasswordPolicyViolation> {
        let violations = self.violations(candidate, login_id);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(PasswordPolicyViolation::new(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(err: &PasswordPolicyViolation) -> Vec<&'static str> {
        err.violations().iter().map(|v| v.key).collect()
    }

    #[test]
    fn test_short_password_equal_to_login_id() {
        let policy = CompositePasswordPolicy::default();
        let err = policy.validate_password(Some("a"), "a").unwrap_err();
        assert_eq!(
            keys(&err),
            vec!["password.min_length", "password.same_as_login_id"]
        );
        assert_eq!(err.violations()[0].args, vec!["5".to_string()]);
    }

    #[test]
    fn test_missing_password_reports_required_only() {
        let policy = CompositePasswordPolicy::default();
        let err = policy.validate_password(None, "alice").unwrap_err();
        assert_eq!(keys(&err), vec!["password.required"]);
    }

    #[test]
    fn test_blank_password() {
        let policy = CompositePasswordPolicy::default();
        let err = policy.validate_password(Some("   "), "alice").unwrap_err();
        assert_eq!(
            keys(&err),
            vec!["password.required", "password.min_length", "password.alpha_numeric"]
        );
    }

    #[test]
    fn test_symbols_are_rejected() {
        let policy = CompositePasswordPolicy::default();
        let err = policy
            .validate_password(Some("pass-word"), "alice")
            .unwrap_err();
        assert_eq!(keys(&err), vec!["password.alpha_numeric"]);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let policy = CompositePasswordPolicy::default();
        assert!(policy.validate_password(Some("  abc12  "), "alice").is_ok());

        let err = policy
            .validate_password(Some(" alice "), "alice")
            .unwrap_err();
        assert_eq!(keys(&err), vec!["password.same_as_login_id"]);
    }

    #[test]
    fn test_min_length_counts_characters() {
        assert!(MinLength(5).validate(Some("abcde"), "x").is_none());
        assert!(MinLength(5).validate(Some("abcd"), "x").is_some());
        assert!(MinLength(5).validate(None, "x").is_none());
    }

    #[test]
    fn test_custom_rule() {
        struct NoDigitsOnly;
        impl PasswordRule for NoDigitsOnly {
            fn validate(&self, candidate: Option<&str>, _login_id: &str) -> Option<Violation> {
                let c = candidate?;
                c.chars()
                    .all(|ch| ch.is_ascii_digit())
                    .then(|| Violation::new("password.digits_only", vec![]))
            }
        }

        let policy = CompositePasswordPolicy::default().with_rule(NoDigitsOnly);
        let err = policy
            .validate_password(Some("123456"), "alice")
            .unwrap_err();
        assert_eq!(keys(&err), vec!["password.digits_only"]);
    }
}
