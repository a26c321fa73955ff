use std::time::Duration;

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use super::{StoreError, bounded};

#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
    timeout: Duration,
}

/// A stored account. The credential hash never leaves the store through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Account fields as written by create and update. `credential` is a password hash.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub credential: String,
}

impl AccountStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// List all accounts ordered by ID.
    pub async fn list(&self) -> Result<Vec<Account>, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as("SELECT id, name, email FROM users ORDER BY id").fetch_all(&self.pool),
        )
        .await
    }

    /// Get an account by ID.
    pub async fn get(&self, id: i64) -> Result<Option<Account>, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as("SELECT id, name, email FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    /// Create an account. Returns the new account ID.
    pub async fn create(&self, account: &NewAccount) -> Result<i64, StoreError> {
        let result = bounded(
            self.timeout,
            sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
                .bind(&account.name)
                .bind(&account.email)
                .bind(&account.credential)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Create several accounts in one transaction. Either all are inserted or none.
    pub async fn create_many(&self, accounts: &[NewAccount]) -> Result<Vec<i64>, StoreError> {
        bounded(self.timeout, async {
            let mut tx = self.pool.begin().await?;
            let mut ids = Vec::with_capacity(accounts.len());
            for account in accounts {
                let result =
                    sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
                        .bind(&account.name)
                        .bind(&account.email)
                        .bind(&account.credential)
                        .execute(&mut *tx)
                        .await?;
                ids.push(result.last_insert_rowid());
            }
            tx.commit().await?;
            Ok::<_, sqlx::Error>(ids)
        })
        .await
    }

    /// Replace name, email and credential. Returns false if the account does not exist.
    pub async fn update(&self, id: i64, account: &NewAccount) -> Result<bool, StoreError> {
        let result = bounded(
            self.timeout,
            sqlx::query("UPDATE users SET name = ?, email = ?, password = ? WHERE id = ?")
                .bind(&account.name)
                .bind(&account.email)
                .bind(&account.credential)
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an account and, through the foreign key, its books.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = bounded(
            self.timeout,
            sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Look up the ID and stored credential hash for an exact account name.
    pub async fn find_credentials(&self, name: &str) -> Result<Option<(i64, String)>, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as("SELECT id, password FROM users WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool),
        )
        .await
    }
}
