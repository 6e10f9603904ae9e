//! Argon2id password hashing.
//!
//! Hashes are PHC strings, so the salt and parameters travel with the hash.
//! Both operations are CPU-bound and run on the blocking pool.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use super::AuthError;

/// Well-formed Argon2id hash with the default cost parameters that no
/// password verifies against. Login checks it when there is no account to
/// check, so an unknown e-mail costs as much as a wrong password.
pub const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$a2FuYmFuLWR1bW15LXNsdA$wj/PqYqibxl2iH8GwWhhNRe/bd1ryz+J/THKGpfSQOw";

/// Hashes a password with a fresh random salt.
///
/// # Errors
///
/// Returns `AuthError::Internal` if hashing fails or the blocking task panics.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|error| AuthError::Internal(error.to_string()))?
}

/// Checks a password against a stored PHC hash.
///
/// A malformed stored hash verifies as `false`.
///
/// # Errors
///
/// Returns `AuthError::Internal` if the blocking task panics.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || verify_blocking(&password, &hash))
        .await
        .map_err(|error| AuthError::Internal(error.to_string()))
}

fn hash_blocking(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| AuthError::Internal(error.to_string()))
}

fn verify_blocking(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
