//! Password hashing and credential verification.
//!
//! Credentials are stored as Argon2 PHC strings. Verification fails the same way
//! for an unknown name and for a wrong password.

use std::sync::OnceLock;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::db::{Database, StoreError};

const SALT_LEN: usize = 16;

/// Errors from hashing or verifying credentials.
#[derive(Debug)]
pub enum CredentialError {
    /// Unknown name or wrong password
    InvalidCredentials,
    /// Hashing failed or the blocking task was lost
    Hashing(String),
    /// The account store failed
    Store(StoreError),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::InvalidCredentials => write!(f, "Invalid credentials"),
            CredentialError::Hashing(e) => write!(f, "Password hashing failed: {}", e),
            CredentialError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CredentialError {}

impl From<StoreError> for CredentialError {
    fn from(e: StoreError) -> Self {
        CredentialError::Store(e)
    }
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    rand::RngCore::fill_bytes(&mut rand::rng(), &mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CredentialError::Hashing(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

/// Check a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash a password on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| CredentialError::Hashing(e.to_string()))?
}

/// Hash verified when the name is unknown, so both failure paths do the same work.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("bookshelf-dummy-password").unwrap_or_default())
}

/// Verify a name/password pair. Returns the account ID on success.
pub async fn verify_credentials(
    db: &Database,
    name: &str,
    password: &str,
) -> Result<i64, CredentialError> {
    let found = db.accounts().find_credentials(name).await?;

    let password = password.to_string();
    let (account_id, stored) = match found {
        Some((id, hash)) => (Some(id), hash),
        None => (None, String::new()),
    };

    let matches = tokio::task::spawn_blocking(move || {
        let stored = if account_id.is_some() {
            stored.as_str()
        } else {
            dummy_hash()
        };
        verify_password(&password, stored)
    })
    .await
    .map_err(|e| CredentialError::Hashing(e.to_string()))?;

    match account_id {
        Some(id) if matches => Ok(id),
        _ => Err(CredentialError::InvalidCredentials),
    }
}
