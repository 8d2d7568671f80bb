//! Access code repository
//!
//! Read-only lookups against the `access_codes` table. Codes are provisioned
//! and deactivated by an external registration process; the onboarding core
//! only performs equality lookups on active codes.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AccessCode, FormRole};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Access code repository trait
#[async_trait]
pub trait AccessCodeRepository: Send + Sync {
    /// Look up an active code by exact match. Inactive codes yield `None`.
    async fn find_active(&self, code: &str) -> Result<Option<AccessCode>>;
}

/// SQLx-based access code repository implementation
pub struct SqlxAccessCodeRepository {
    pool: DynDatabasePool,
}

impl SqlxAccessCodeRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AccessCodeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AccessCodeRepository for SqlxAccessCodeRepository {
    async fn find_active(&self, code: &str) -> Result<Option<AccessCode>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_active_sqlite(self.pool.as_sqlite().unwrap(), code).await
            }
            DatabaseDriver::Mysql => find_active_mysql(self.pool.as_mysql().unwrap(), code).await,
        }
    }
}

const SELECT_ACTIVE: &str = r#"
    SELECT code, role, company_id, is_active, created_at
    FROM access_codes
    WHERE code = ? AND is_active = 1
"#;

async fn find_active_sqlite(pool: &SqlitePool, code: &str) -> Result<Option<AccessCode>> {
    let row = sqlx::query(SELECT_ACTIVE)
        .bind(code)
        .fetch_optional(pool)
        .await
        .context("Failed to look up access code")?;

    match row {
        Some(row) => Ok(Some(row_to_access_code(
            row.get("code"),
            row.get("role"),
            row.get("company_id"),
            row.get("is_active"),
            row.get("created_at"),
        )?)),
        None => Ok(None),
    }
}

async fn find_active_mysql(pool: &MySqlPool, code: &str) -> Result<Option<AccessCode>> {
    let row = sqlx::query(SELECT_ACTIVE)
        .bind(code)
        .fetch_optional(pool)
        .await
        .context("Failed to look up access code")?;

    match row {
        Some(row) => Ok(Some(row_to_access_code(
            row.get("code"),
            row.get("role"),
            row.get("company_id"),
            row.get("is_active"),
            row.get("created_at"),
        )?)),
        None => Ok(None),
    }
}

fn row_to_access_code(
    code: String,
    role: String,
    company_id: String,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
) -> Result<AccessCode> {
    let role: FormRole = role
        .parse()
        .map_err(|_| anyhow!("Unknown role in access_codes row: {}", role))?;

    Ok(AccessCode {
        code,
        role,
        company_id,
        is_active,
        created_at,
    })
}
