//! Company repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Company;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Company repository trait
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Get a company by id
    async fn get(&self, id: &str) -> Result<Option<Company>>;
}

/// SQLx-based company repository implementation
pub struct SqlxCompanyRepository {
    pool: DynDatabasePool,
}

impl SqlxCompanyRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CompanyRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CompanyRepository for SqlxCompanyRepository {
    async fn get(&self, id: &str) -> Result<Option<Company>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const SELECT_COMPANY: &str = "SELECT id, name, email, created_at FROM companies WHERE id = ?";

async fn get_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Company>> {
    let row = sqlx::query(SELECT_COMPANY)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get company")?;

    Ok(row.map(|row| Company {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }))
}

async fn get_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Company>> {
    let row = sqlx::query(SELECT_COMPANY)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get company")?;

    Ok(row.map(|row| Company {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::access_code::tests::{seed_company, setup_pool};

    #[tokio::test]
    async fn test_get_company() {
        let pool = setup_pool().await;
        seed_company(&pool, "acme").await;

        let repo = SqlxCompanyRepository::new(pool);
        let company = repo
            .get("acme")
            .await
            .expect("Lookup failed")
            .expect("Company should exist");

        assert_eq!(company.name, "acme S.L.");
        assert_eq!(company.email, "info@acme.example");
    }

    #[tokio::test]
    async fn test_get_missing_company() {
        let pool = setup_pool().await;
        let repo = SqlxCompanyRepository::new(pool);
        assert!(repo.get("ghost").await.unwrap().is_none());
    }
}
