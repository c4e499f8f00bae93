//! User entity

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Registered account. Only the auth service reads this table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
