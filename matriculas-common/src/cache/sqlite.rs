//! SQLite-backed key-value store (uncapped cache tier)
//!
//! Values live in the `cache_entries` table. Every sqlx failure surfaces as
//! [`Error::CacheBackend`], since this tier has no fallback.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::KeyValueStore;
use crate::{Error, Result};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap a pool whose schema was created by [`crate::db::init_database`]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Keys currently stored, in key order
    pub async fn keys(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT key FROM cache_entries ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)
    }
}

fn backend_error(e: sqlx::Error) -> Error {
    Error::CacheBackend(e.to_string())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, stored_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM cache_entries")
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }
}
