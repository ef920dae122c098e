//! Password hashing seam
//!
//! The engine treats hashing as an opaque one-way function. [`Argon2PasswordHasher`]
//! is the default, backed by the `password-auth` crate, which produces
//! self-describing PHC strings so `verify` needs no extra parameters.

use crate::Error;

/// One-way password encoding with a comparison function.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Encode a raw password for storage.
    fn hash(&self, raw_password: &str) -> Result<String, Error>;

    /// Check a raw password against a stored encoding.
    fn verify(&self, raw_password: &str, encoded: &str) -> Result<bool, Error>;
}

/// Argon2id hasher using `password-auth` defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, raw_password: &str) -> Result<String, Error> {
        Ok(password_auth::generate_hash(raw_password))
    }

    fn verify(&self, raw_password: &str, encoded: &str) -> Result<bool, Error> {
        Ok(password_auth::verify_password(raw_password, encoded).is_ok())
    }
}
