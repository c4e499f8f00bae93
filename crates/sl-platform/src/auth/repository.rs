//! User Repository
//!
//! SQLite persistence for accounts, unique on username and email.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::auth::entity::User;
use crate::shared::error::{PlatformError, Result};

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Users schema initialized");
        Ok(())
    }

    pub async fn exists_by_username(&self, username: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Insert a user. A concurrent registration that wins the unique index
    /// surfaces as a validation error, same as the pre-checks.
    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<User> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await;

        let id = match result {
            Ok(id) => id,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(PlatformError::validation("Username or email already exists"));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn repo() -> UserRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = UserRepository::new(pool);
        repo.init_schema().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = repo().await;
        let created = repo.insert("alice", "alice@example.com", "hash", Utc::now()).await.unwrap();

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "alice@example.com");
        assert!(repo.exists_by_username("alice").await.unwrap());
        assert!(repo.exists_by_email("alice@example.com").await.unwrap());
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_validation_error() {
        let repo = repo().await;
        repo.insert("alice", "alice@example.com", "hash", Utc::now()).await.unwrap();

        let err = repo.insert("alice", "other@example.com", "hash", Utc::now()).await.unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }
}
