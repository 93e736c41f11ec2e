use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::ServiceError;

/// Hashes `password` with Argon2id on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    })
    .await
    .map_err(|e| ServiceError::InternalError(format!("password hashing task failed: {e}")))?
}

/// Checks `password` against a stored PHC string. A malformed stored hash
/// counts as a mismatch.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&stored_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| ServiceError::InternalError(format!("password verification task failed: {e}")))
}
