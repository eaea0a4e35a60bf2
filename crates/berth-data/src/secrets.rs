//! Argon2 helpers for API-key secrets.

use argon2::Argon2;
use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    rand_core::OsRng,
};

use crate::error::{DataError, Result};

/// Hash secret material for storage.
///
/// # Errors
///
/// Returns `SecretHash` if the hasher rejects the input.
pub fn hash_secret(input: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(input.as_bytes(), &salt)
        .map_err(|detail| DataError::SecretHash {
            operation: "secrets.hash",
            detail,
        })?;
    Ok(hash.to_string())
}

/// Check `candidate` against a stored hash.
///
/// # Errors
///
/// Returns `SecretHash` when the stored hash cannot be parsed.
pub fn verify_secret(expected_hash: &str, candidate: &str) -> Result<bool> {
    let parsed = PasswordHash::new(expected_hash).map_err(|detail| DataError::SecretHash {
        operation: "secrets.parse",
        detail,
    })?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(detail) => Err(DataError::SecretHash {
            operation: "secrets.verify",
            detail,
        }),
    }
}
