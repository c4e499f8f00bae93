//! SQLite mapping store
//!
//! One `{domain}_mappings` table per resource domain. Code uniqueness is a
//! `UNIQUE` constraint and usage counts are bumped with a single
//! `UPDATE ... RETURNING`, so concurrent writers never lose updates.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use crate::{DomainStats, Mapping, MappingError, MappingStore, NewMapping, ResourceRef, Result, ShortCode};

#[derive(Debug, FromRow)]
struct MappingRow {
    id: i64,
    code: String,
    resource: String,
    owner: Option<String>,
    usage_counter: i64,
    created_at: DateTime<Utc>,
}

impl MappingRow {
    fn into_mapping<R: ResourceRef>(self) -> Result<Mapping<R>> {
        Ok(Mapping {
            id: self.id,
            code: ShortCode::parse(&self.code)
                .ok_or_else(|| MappingError::Storage(format!("Malformed stored code: {}", self.code)))?,
            resource: serde_json::from_str(&self.resource)?,
            owner: self.owner,
            usage_counter: self.usage_counter,
            created_at: self.created_at,
        })
    }
}

pub struct SqliteMappingStore<R> {
    pool: SqlitePool,
    mappings_table: String,
    failures_table: String,
    _resource: PhantomData<fn() -> R>,
}

impl<R: ResourceRef> SqliteMappingStore<R> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            mappings_table: format!("{}_mappings", R::DOMAIN),
            failures_table: format!("{}_lookup_failures", R::DOMAIN),
            _resource: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the domain's tables and indexes if missing.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {t} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                resource TEXT NOT NULL,
                owner TEXT,
                usage_counter INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
            t = self.mappings_table
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{t}_owner ON {t} (owner)",
            t = self.mappings_table
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {t} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL
            )
            "#,
            t = self.failures_table
        ))
        .execute(&self.pool)
        .await?;

        info!(domain = R::DOMAIN, "SQLite mapping schema initialized");
        Ok(())
    }

    fn select_columns(&self) -> String {
        format!(
            "SELECT id, code, resource, owner, usage_counter, created_at FROM {}",
            self.mappings_table
        )
    }

    fn collect(rows: Vec<MappingRow>) -> Result<Vec<Mapping<R>>> {
        rows.into_iter().map(MappingRow::into_mapping).collect()
    }
}

#[async_trait]
impl<R: ResourceRef> MappingStore<R> for SqliteMappingStore<R> {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(&format!(
            "SELECT 1 FROM {} WHERE code = ?",
            self.mappings_table
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, mapping: NewMapping<R>) -> Result<Mapping<R>> {
        let resource = serde_json::to_string(&mapping.resource)?;

        let inserted = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            INSERT INTO {} (code, resource, owner, usage_counter, created_at)
            VALUES (?, ?, ?, 0, ?)
            RETURNING id
            "#,
            self.mappings_table
        ))
        .bind(mapping.code.as_str())
        .bind(&resource)
        .bind(mapping.owner.as_deref())
        .bind(mapping.created_at)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(id) => Ok(Mapping::from_new(id, mapping)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(MappingError::DuplicateCode(mapping.code.into_inner()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, code: &ShortCode) -> Result<Option<Mapping<R>>> {
        let row = sqlx::query_as::<_, MappingRow>(&format!("{} WHERE code = ?", self.select_columns()))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(MappingRow::into_mapping).transpose()
    }

    async fn increment_usage(&self, code: &ShortCode) -> Result<Option<i64>> {
        let counter = sqlx::query_scalar::<_, i64>(&format!(
            "UPDATE {} SET usage_counter = usage_counter + 1 WHERE code = ? RETURNING usage_counter",
            self.mappings_table
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(counter)
    }

    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Mapping<R>>> {
        let rows = sqlx::query_as::<_, MappingRow>(&format!(
            "{} WHERE owner = ? ORDER BY id",
            self.select_columns()
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Self::collect(rows)
    }

    async fn list_all(&self) -> Result<Vec<Mapping<R>>> {
        let rows = sqlx::query_as::<_, MappingRow>(&format!("{} ORDER BY id", self.select_columns()))
            .fetch_all(&self.pool)
            .await?;
        Self::collect(rows)
    }

    async fn record_lookup_failure(&self, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(&format!("INSERT INTO {} (timestamp) VALUES (?)", self.failures_table))
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<DomainStats> {
        let (total_mappings, total_usage) = sqlx::query_as::<_, (i64, i64)>(&format!(
            "SELECT COUNT(*), COALESCE(SUM(usage_counter), 0) FROM {}",
            self.mappings_table
        ))
        .fetch_one(&self.pool)
        .await?;

        let total_lookup_failures: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.failures_table))
                .fetch_one(&self.pool)
                .await?;

        Ok(DomainStats {
            total_mappings,
            total_usage,
            total_lookup_failures,
        })
    }
}
