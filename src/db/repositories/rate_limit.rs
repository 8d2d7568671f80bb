//! Rate limit repository
//!
//! Single-row reads and upserts against the `rate_limits` table. There is no
//! conditional-increment here: the limiter does a plain read-modify-write, so
//! concurrent admits for one identifier can race and overrun the limit. Rows
//! are never deleted; a long-lived deployment needs an external TTL job.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::RateLimitEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Rate limit repository trait
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Get the entry for an identifier
    async fn get(&self, identifier: &str) -> Result<Option<RateLimitEntry>>;

    /// Insert or replace the entry for its identifier
    async fn put(&self, entry: &RateLimitEntry) -> Result<()>;
}

/// SQLx-based rate limit repository implementation
pub struct SqlxRateLimitRepository {
    pool: DynDatabasePool,
}

impl SqlxRateLimitRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RateLimitRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RateLimitRepository for SqlxRateLimitRepository {
    async fn get(&self, identifier: &str) -> Result<Option<RateLimitEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), identifier).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), identifier).await,
        }
    }

    async fn put(&self, entry: &RateLimitEntry) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => put_sqlite(self.pool.as_sqlite().unwrap(), entry).await,
            DatabaseDriver::Mysql => put_mysql(self.pool.as_mysql().unwrap(), entry).await,
        }
    }
}

const SELECT_ENTRY: &str =
    "SELECT identifier, attempts, last_attempt FROM rate_limits WHERE identifier = ?";

async fn get_sqlite(pool: &SqlitePool, identifier: &str) -> Result<Option<RateLimitEntry>> {
    let row = sqlx::query(SELECT_ENTRY)
        .bind(identifier)
        .fetch_optional(pool)
        .await
        .context("Failed to get rate limit entry")?;

    Ok(row.map(|row| RateLimitEntry {
        identifier: row.get("identifier"),
        attempts: row.get("attempts"),
        last_attempt: row.get("last_attempt"),
    }))
}

async fn get_mysql(pool: &MySqlPool, identifier: &str) -> Result<Option<RateLimitEntry>> {
    let row = sqlx::query(SELECT_ENTRY)
        .bind(identifier)
        .fetch_optional(pool)
        .await
        .context("Failed to get rate limit entry")?;

    Ok(row.map(|row| RateLimitEntry {
        identifier: row.get("identifier"),
        attempts: row.get("attempts"),
        last_attempt: row.get("last_attempt"),
    }))
}

async fn put_sqlite(pool: &SqlitePool, entry: &RateLimitEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO rate_limits (identifier, attempts, last_attempt)
        VALUES (?, ?, ?)
        ON CONFLICT(identifier) DO UPDATE SET
            attempts = excluded.attempts,
            last_attempt = excluded.last_attempt
        "#,
    )
    .bind(&entry.identifier)
    .bind(entry.attempts)
    .bind(entry.last_attempt)
    .execute(pool)
    .await
    .context("Failed to upsert rate limit entry")?;

    Ok(())
}

async fn put_mysql(pool: &MySqlPool, entry: &RateLimitEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO rate_limits (identifier, attempts, last_attempt)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE
            attempts = VALUES(attempts),
            last_attempt = VALUES(last_attempt)
        "#,
    )
    .bind(&entry.identifier)
    .bind(entry.attempts)
    .bind(entry.last_attempt)
    .execute(pool)
    .await
    .context("Failed to upsert rate limit entry")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::access_code::tests::setup_pool;
    use chrono::Utc;

    #[tokio::test]
    async fn test_get_missing_entry() {
        let pool = setup_pool().await;
        let repo = SqlxRateLimitRepository::new(pool);
        assert!(repo.get("1.2.3.4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let pool = setup_pool().await;
        let repo = SqlxRateLimitRepository::new(pool);

        let entry = RateLimitEntry::fresh("1.2.3.4", Utc::now());
        repo.put(&entry).await.expect("Put failed");

        let found = repo
            .get("1.2.3.4")
            .await
            .expect("Get failed")
            .expect("Entry should exist");
        assert_eq!(found.attempts, 1);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_entry() {
        let pool = setup_pool().await;
        let repo = SqlxRateLimitRepository::new(pool);

        let now = Utc::now();
        repo.put(&RateLimitEntry::fresh("1.2.3.4", now)).await.unwrap();

        let updated = RateLimitEntry {
            identifier: "1.2.3.4".to_string(),
            attempts: 5,
            last_attempt: now,
        };
        repo.put(&updated).await.expect("Upsert failed");

        let found = repo.get("1.2.3.4").await.unwrap().unwrap();
        assert_eq!(found.attempts, 5);
    }

    #[tokio::test]
    async fn test_entries_are_per_identifier() {
        let pool = setup_pool().await;
        let repo = SqlxRateLimitRepository::new(pool);

        let now = Utc::now();
        repo.put(&RateLimitEntry::fresh("1.1.1.1", now)).await.unwrap();
        repo.put(&RateLimitEntry::fresh("unknown-ip", now)).await.unwrap();

        assert_eq!(repo.get("1.1.1.1").await.unwrap().unwrap().attempts, 1);
        assert_eq!(repo.get("unknown-ip").await.unwrap().unwrap().attempts, 1);
        assert!(repo.get("2.2.2.2").await.unwrap().is_none());
    }
}
