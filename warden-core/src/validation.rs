use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Login ids are business keys chosen by people: letters, digits and a few separators.
static LOGIN_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._@+-]*$").expect("Invalid login id regex pattern")
});

/// Validates a login id
///
/// # Login Id Requirements
///
/// - Cannot be empty
/// - Maximum 64 characters
/// - Starts with a letter or digit, then letters, digits or `._@+-`
///
/// # Examples
///
/// ```rust
/// use warden_core::validation::validate_login_id;
///
/// assert!(validate_login_id("alice").is_ok());
/// assert!(validate_login_id("alice@example.com").is_ok());
/// assert!(validate_login_id(" alice").is_err());
/// ```
pub fn validate_login_id(login_id: &str) -> Result<(), ValidationError> {
    if login_id.is_empty() {
        return Err(ValidationError::MissingField(
            "Login id is required".to_string(),
        ));
    }

    if login_id.chars().count() > 64 {
        return Err(ValidationError::InvalidLoginId(
            "Login id must be no more than 64 characters long".to_string(),
        ));
    }

    if LOGIN_ID_REGEX.is_match(login_id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLoginId(format!(
            "Invalid login id format: {login_id}"
        )))
    }
}

/// Validates the operator name recorded on administrative events
pub fn validate_operator(operator: &str) -> Result<(), ValidationError> {
    if operator.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Operator is required".to_string(),
        ));
    }

    if operator.len() > 128 {
        return Err(ValidationError::InvalidField(
            "Operator must be no more than 128 characters long".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_login_id_valid() {
        assert!(validate_login_id("alice").is_ok());
        assert!(validate_login_id("bob.smith").is_ok());
        assert!(validate_login_id("user+tag@example.com").is_ok());
        assert!(validate_login_id("007").is_ok());
    }

    #[test]
    fn test_validate_login_id_invalid() {
        assert!(matches!(
            validate_login_id(""),
            Err(ValidationError::MissingField(_))
        ));
        assert!(validate_login_id("has space").is_err());
        assert!(validate_login_id(".leading-dot").is_err());
        assert!(validate_login_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_operator() {
        assert!(validate_operator("admin").is_ok());
        assert!(validate_operator("   ").is_err());
        assert!(validate_operator(&"a".repeat(129)).is_err());
    }
}
