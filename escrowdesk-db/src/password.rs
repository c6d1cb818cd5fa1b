//! Salted password hashing (bcrypt).
//!
//! Hashes are 60 characters and fit the `VARCHAR(64)` password column.
//! bcrypt is deliberately slow, so work runs on the blocking pool.

use crate::error::Result;

/// bcrypt cost factor (2^10 rounds)
pub const HASH_COST: u32 = 10;

/// bcrypt reads at most this many bytes of input; the rest is ignored.
pub const PASSWORD_MAX_BYTES: usize = 72;

/// Hash `password` with a fresh random salt.
///
/// Only the first [`PASSWORD_MAX_BYTES`] bytes take part in the hash, so
/// callers storing credentials should reject longer input first
/// (`UserRepo::create` does).
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await??;
    Ok(hash)
}

/// Check `password` against a stored hash.
///
/// A malformed stored hash is an error, not a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    #[tokio::test]
    async fn hash_is_salted_and_verifiable() {
        let first = hash_password("secret").await.unwrap();
        let second = hash_password("secret").await.unwrap();

        assert_eq!(first.len(), 60);
        assert!(first.starts_with("$2b$10$"));
        assert_ne!(first, "secret");
        assert_ne!(first, second, "salt must differ between hashes");

        assert!(verify_password("secret", &first).await.unwrap());
        assert!(verify_password("secret", &second).await.unwrap());
        assert!(!verify_password("Secret", &first).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let err = verify_password("secret", "not-a-hash").await.unwrap_err();
        assert!(matches!(err, DbError::PasswordHash(_)));
    }
}
