//! Revocation list for session tokens that were logged out before expiry.
//!
//! Only the signature segment of a token is stored. Entries are kept until the
//! token would have expired on its own, after which the cleanup task drops them.

use std::time::Duration;

use sqlx::sqlite::SqlitePool;

use super::{StoreError, bounded};

pub struct RevokedTokenStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl RevokedTokenStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Add a token signature to the revocation list. Revoking twice is a no-op.
    pub async fn revoke(&self, signature: &str, expires_at: u64) -> Result<(), StoreError> {
        bounded(
            self.timeout,
            sqlx::query("INSERT OR IGNORE INTO revoked_tokens (signature, expires_at) VALUES (?, ?)")
                .bind(signature)
                .bind(expires_at as i64)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    /// Check whether a token signature has been revoked.
    pub async fn is_revoked(&self, signature: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = bounded(
            self.timeout,
            sqlx::query_as("SELECT 1 FROM revoked_tokens WHERE signature = ?")
                .bind(signature)
                .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.is_some())
    }

    /// Delete entries whose token has expired as of `now` (Unix seconds).
    pub async fn delete_expired(&self, now: u64) -> Result<u64, StoreError> {
        let result = bounded(
            self.timeout,
            sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= ?")
                .bind(now as i64)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }
}
