//! Database migrations module
//!
//! Code-based migrations for the Alta onboarding system. All migrations are
//! embedded as SQL strings, with one variant per supported driver, so the
//! binary can bring up a fresh database on its own.
//!
//! Each migration is a `Migration` struct with a unique `version`, a
//! human-readable `name`, and `up_sqlite`/`up_mysql` SQL.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the Alta onboarding system.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: Create companies table (tenants owning the two tracks)
    Migration {
        version: 1,
        name: "create_companies",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS companies (
                id VARCHAR(64) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS companies (
                id VARCHAR(64) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    // Migration 2: Create access_codes table. Codes are written by an
    // external registration process; this system only reads them.
    Migration {
        version: 2,
        name: "create_access_codes",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS access_codes (
                code VARCHAR(64) PRIMARY KEY,
                role VARCHAR(20) NOT NULL,
                company_id VARCHAR(64) NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (company_id) REFERENCES companies(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_access_codes_company ON access_codes(company_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS access_codes (
                code VARCHAR(64) PRIMARY KEY,
                role VARCHAR(20) NOT NULL,
                company_id VARCHAR(64) NOT NULL,
                is_active TINYINT NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (company_id) REFERENCES companies(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_access_codes_company ON access_codes(company_id);
        "#,
    },
    // Migration 3: Create rate_limits table. One row per identifier,
    // updated in place; rows are never pruned (external TTL job expected).
    Migration {
        version: 3,
        name: "create_rate_limits",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS rate_limits (
                identifier VARCHAR(64) PRIMARY KEY,
                attempts INTEGER NOT NULL DEFAULT 1,
                last_attempt TIMESTAMP NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS rate_limits (
                identifier VARCHAR(64) PRIMARY KEY,
                attempts BIGINT NOT NULL DEFAULT 1,
                last_attempt TIMESTAMP NOT NULL
            );
        "#,
    },
    // Migration 4: Create submissions table, keyed by (company_id, role)
    Migration {
        version: 4,
        name: "create_submissions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS submissions (
                company_id VARCHAR(64) NOT NULL,
                role VARCHAR(20) NOT NULL,
                answers TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (company_id, role),
                FOREIGN KEY (company_id) REFERENCES companies(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS submissions (
                company_id VARCHAR(64) NOT NULL,
                role VARCHAR(20) NOT NULL,
                answers TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                PRIMARY KEY (company_id, role),
                FOREIGN KEY (company_id) REFERENCES companies(id) ON DELETE CASCADE
            );
        "#,
    },
    // Migration 5: Create contact_requests table
    Migration {
        version: 5,
        name: "create_contact_requests",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS contact_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS contact_requests (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
];

/// Run all pending migrations
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    name VARCHAR(255) NOT NULL UNIQUE,
                    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            )
            .execute(pool.as_sqlite().unwrap())
            .await?;
        }
        DatabaseDriver::Mysql => {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS _migrations (
                    version INT PRIMARY KEY,
                    name VARCHAR(255) NOT NULL UNIQUE,
                    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            )
            .execute(pool.as_mysql().unwrap())
            .await?;
        }
    }
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    let mut records = Vec::new();

    match pool.driver() {
        DatabaseDriver::Sqlite => {
            let rows =
                sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
                    .fetch_all(pool.as_sqlite().unwrap())
                    .await?;
            for row in rows {
                records.push(MigrationRecord {
                    version: row.get("version"),
                    name: row.get("name"),
                    applied_at: row.get("applied_at"),
                });
            }
        }
        DatabaseDriver::Mysql => {
            let rows =
                sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
                    .fetch_all(pool.as_mysql().unwrap())
                    .await?;
            for row in rows {
                records.push(MigrationRecord {
                    version: row.get("version"),
                    name: row.get("name"),
                    applied_at: row.get("applied_at"),
                });
            }
        }
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            apply_migration_sqlite(pool.as_sqlite().unwrap(), migration).await
        }
        DatabaseDriver::Mysql => apply_migration_mysql(pool.as_mysql().unwrap(), migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split a migration's SQL into individual statements
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
