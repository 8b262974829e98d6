//! Password hashing utilities
//!
//! bcrypt embeds a per-call random salt in the output, so hashing the same
//! plaintext twice yields different strings that both verify.

use bcrypt::{hash, DEFAULT_COST};

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Verify a password against a stored hash.
///
/// A malformed stored hash is a verification failure, not an error: from
/// the caller's point of view the credentials simply do not match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}
