//! Contact request repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, SqlitePool};
use std::sync::Arc;

/// Contact request repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Store an inbound contact request
    async fn insert(&self, name: &str, email: &str, message: &str) -> Result<()>;
}

/// SQLx-based contact repository implementation
pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_CONTACT: &str =
    "INSERT INTO contact_requests (name, email, message) VALUES (?, ?, ?)";

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn insert(&self, name: &str, email: &str, message: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                insert_sqlite(self.pool.as_sqlite().unwrap(), name, email, message).await
            }
            DatabaseDriver::Mysql => {
                insert_mysql(self.pool.as_mysql().unwrap(), name, email, message).await
            }
        }
    }
}

async fn insert_sqlite(pool: &SqlitePool, name: &str, email: &str, message: &str) -> Result<()> {
    sqlx::query(INSERT_CONTACT)
        .bind(name)
        .bind(email)
        .bind(message)
        .execute(pool)
        .await
        .context("Failed to insert contact request")?;
    Ok(())
}

async fn insert_mysql(pool: &MySqlPool, name: &str, email: &str, message: &str) -> Result<()> {
    sqlx::query(INSERT_CONTACT)
        .bind(name)
        .bind(email)
        .bind(message)
        .execute(pool)
        .await
        .context("Failed to insert contact request")?;
    Ok(())
}
