//! Prefixed identifier generation
//!
//! Account identifiers look like `acct_{random}` where the random part is 96 bits
//! of OS entropy encoded as URL-safe base64 without padding.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

/// Generate a prefixed ID with 96 bits of entropy
///
/// # Panics
///
/// Panics if the OS random number generator fails.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");

    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);

    format!("{prefix}_{encoded}")
}

/// Validate that a prefixed ID has the expected format
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    match BASE64_URL_SAFE_NO_PAD.decode(random_part) {
        Ok(decoded) => decoded.len() >= 12,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prefixed_id() {
        let id = generate_prefixed_id("acct");
        assert!(id.starts_with("acct_"));

        let id2 = generate_prefixed_id("acct");
        assert_ne!(id, id2);
    }

    #[test]
    fn test_validate_prefixed_id() {
        let id = generate_prefixed_id("acct");
        assert!(validate_prefixed_id(&id, "acct"));
        assert!(!validate_prefixed_id(&id, "usr"));

        assert!(!validate_prefixed_id("acct", "acct"));
        assert!(!validate_prefixed_id("acct_", "acct"));
        assert!(!validate_prefixed_id("acct_invalid!", "acct"));
    }

    #[test]
    fn test_id_is_url_safe() {
        let id = generate_prefixed_id("acct");
        assert!(
            id.chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        );
    }
}
