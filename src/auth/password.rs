//! One-way password hashing and verification.
//!
//! argon2id with default parameters, per-password random salt, PHC-string
//! digests. The work factor makes offline brute force expensive; treat both
//! functions as blocking and keep them off the async dispatch path
//! (`tokio::task::spawn_blocking` in handlers).

use crate::error::ApiResult;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a plaintext password into a salted PHC-format digest.
pub fn hash(plaintext: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();
    Ok(digest)
}

/// Verify a plaintext password against a stored digest.
///
/// An unparseable digest verifies as false rather than erroring — a stored
/// digest the verifier cannot read is equivalent to a wrong password.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let digest = hash("correct horse battery staple").unwrap();
        assert!(verify("correct horse battery staple", &digest));
    }

    #[test]
    fn wrong_password_fails() {
        let digest = hash("correct horse battery staple").unwrap();
        assert!(!verify("incorrect horse", &digest));
    }

    #[test]
    fn digests_are_salted() {
        let a = hash("same password").unwrap();
        let b = hash("same password").unwrap();
        assert_ne!(a, b);
        assert!(verify("same password", &a));
        assert!(verify("same password", &b));
    }

    #[test]
    fn garbage_digest_never_verifies() {
        assert!(!verify("anything", "not-a-phc-string"));
        assert!(!verify("anything", ""));
    }
}
