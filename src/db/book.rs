use std::time::Duration;

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use super::{StoreError, bounded};

#[derive(Clone)]
pub struct BookStore {
    pool: SqlitePool,
    timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub label: String,
    pub author: String,
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub label: String,
    pub author: String,
}

impl BookStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// List the books owned by a user, oldest first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Book>, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as(
                "SELECT id, label, author, user_id FROM books WHERE user_id = ? ORDER BY id",
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await
    }

    /// Add a book for a user. Returns the new book ID.
    pub async fn create(&self, user_id: i64, book: &NewBook) -> Result<i64, StoreError> {
        let result = bounded(
            self.timeout,
            sqlx::query("INSERT INTO books (label, author, user_id) VALUES (?, ?, ?)")
                .bind(&book.label)
                .bind(&book.author)
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Add several books for a user in one transaction.
    pub async fn create_many(&self, user_id: i64, books: &[NewBook]) -> Result<Vec<i64>, StoreError> {
        bounded(self.timeout, async {
            let mut tx = self.pool.begin().await?;
            let mut ids = Vec::with_capacity(books.len());
            for book in books {
                let result =
                    sqlx::query("INSERT INTO books (label, author, user_id) VALUES (?, ?, ?)")
                        .bind(&book.label)
                        .bind(&book.author)
                        .bind(user_id)
                        .execute(&mut *tx)
                        .await?;
                ids.push(result.last_insert_rowid());
            }
            tx.commit().await?;
            Ok::<_, sqlx::Error>(ids)
        })
        .await
    }
}
