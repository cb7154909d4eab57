//! Argon2id hashes for the `users.password_hash` column.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("cannot hash account password: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

pub struct PasswordService;

impl PasswordService {
    /// PHC string (`$argon2id$...`) with a fresh salt per call.
    pub fn hash(plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// `Ok(false)` on a mismatch. A stored value that is not a PHC string
    /// is an error so the login path can report the broken account.
    pub fn verify(plain: &str, stored: &str) -> Result<bool, PasswordError> {
        let phc = PasswordHash::new(stored).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &phc)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash("kadus123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordService::verify("kadus123", &hash).unwrap());
        assert!(!PasswordService::verify("salah", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_a_new_salt() {
        let first = PasswordService::hash("warga123").unwrap();
        let second = PasswordService::hash("warga123").unwrap();
        assert_ne!(first, second);
        assert!(PasswordService::verify("warga123", &second).unwrap());
    }

    #[test]
    fn test_plaintext_column_is_malformed() {
        match PasswordService::verify("x", "plaintext") {
            Err(PasswordError::MalformedHash(_)) => {}
            other => panic!("expected malformed hash, got {:?}", other),
        }
    }
}
