//! Single-use opaque tokens (password reset, email verification).
//!
//! The plaintext is delivered out-of-band (email) and never stored; only a
//! SHA-256 digest is persisted, compared against a digest of whatever the
//! caller later presents.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// A freshly issued token: the plaintext to deliver and the digest to store.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub plaintext: String,
    pub digest: String,
}

/// Generate a 32-byte random token.
pub fn issue() -> IssuedToken {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let plaintext = hex::encode(bytes);
    let digest = digest_of(&plaintext);
    IssuedToken { plaintext, digest }
}

/// SHA-256 hex digest of a presented token value.
pub fn digest_of(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
