//! Password hashing/verification using Argon2id.
//!
//! The aggregate never sees plaintext passwords on the persistence path;
//! commands carry PHC-format hashes produced here.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use shopcore_core::{DomainError, DomainResult};

/// Hash a plaintext password into a PHC-format Argon2id string.
pub fn hash_password(password: &str) -> DomainResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::invariant(format!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored PHC-format hash.
///
/// Returns `Ok(false)` on mismatch; a malformed stored hash is an invariant
/// violation (the store should never contain one).
pub fn verify_password(password: &str, hash: &str) -> DomainResult<bool> {
    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|e| DomainError::invariant(format!("stored password hash is malformed: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DomainError::invariant(format!("password verify error: {e}"))),
    }
}
