//! Credential hashing: Argon2id with a per-hash random salt and fixed cost.

use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::RngCore;

use crate::auth::{AuthError, AuthResult};

const SALT_LEN: usize = 16;
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new() -> AuthResult<Self> {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Produce a PHC-encoded hash. Two calls with the same input never return the same string.
    pub fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)?;

        let encoded = self.argon2.hash_password(plaintext.as_bytes(), &salt)?;
        Ok(encoded.to_string())
    }

    /// `Ok(false)` on mismatch. Errors only when `hashed` is not a valid PHC string.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hashed)?;
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_matching_password_only() {
        let hasher = CredentialHasher::new().expect("hasher");
        let hashed = hasher.hash("Str0ng!Pass").expect("hash");

        assert!(hasher.verify("Str0ng!Pass", &hashed).expect("verify runs"));
        assert!(!hasher.verify("Str0ng!Pass2", &hashed).expect("verify runs"));
    }

    #[test]
    fn salts_every_hash() {
        let hasher = CredentialHasher::new().expect("hasher");
        let first = hasher.hash("Str0ng!Pass").expect("first hash");
        let second = hasher.hash("Str0ng!Pass").expect("second hash");

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("Str0ng!Pass"));
    }

    #[test]
    fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        let hasher = CredentialHasher::new().expect("hasher");
        let err = hasher
            .verify("Str0ng!Pass", "not-a-phc-string")
            .expect_err("malformed hash");
        assert!(matches!(err, AuthError::PasswordHash(_)));
    }
}
