//! Submission repository
//!
//! Upserts and reads of questionnaire answer sets, keyed by
//! `(company_id, role)`. Answers are stored as a JSON array in a TEXT column;
//! last write wins, no row-level locking.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{FormRole, Submission, SubmissionStatus};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Submission repository trait
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Insert or replace the answer set for `(company_id, role)`
    async fn upsert(&self, submission: &Submission) -> Result<()>;

    /// Get the answer set for `(company_id, role)`
    async fn get(&self, company_id: &str, role: FormRole) -> Result<Option<Submission>>;
}

/// SQLx-based submission repository implementation
pub struct SqlxSubmissionRepository {
    pool: DynDatabasePool,
}

impl SqlxSubmissionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SubmissionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SubmissionRepository for SqlxSubmissionRepository {
    async fn upsert(&self, submission: &Submission) -> Result<()> {
        let answers = serde_json::to_string(&submission.answers)
            .context("Failed to serialize answers")?;

        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                upsert_sqlite(self.pool.as_sqlite().unwrap(), submission, &answers).await
            }
            DatabaseDriver::Mysql => {
                upsert_mysql(self.pool.as_mysql().unwrap(), submission, &answers).await
            }
        }
    }

    async fn get(&self, company_id: &str, role: FormRole) -> Result<Option<Submission>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_sqlite(self.pool.as_sqlite().unwrap(), company_id, role).await
            }
            DatabaseDriver::Mysql => {
                get_mysql(self.pool.as_mysql().unwrap(), company_id, role).await
            }
        }
    }
}

const SELECT_SUBMISSION: &str = r#"
    SELECT company_id, role, answers, status, created_at, updated_at
    FROM submissions
    WHERE company_id = ? AND role = ?
"#;

async fn upsert_sqlite(pool: &SqlitePool, submission: &Submission, answers: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO submissions (company_id, role, answers, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(company_id, role) DO UPDATE SET
            answers = excluded.answers,
            status = excluded.status,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&submission.company_id)
    .bind(submission.role.to_string())
    .bind(answers)
    .bind(submission.status.to_string())
    .bind(submission.created_at)
    .bind(submission.updated_at)
    .execute(pool)
    .await
    .context("Failed to upsert submission")?;

    Ok(())
}

async fn upsert_mysql(pool: &MySqlPool, submission: &Submission, answers: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO submissions (company_id, role, answers, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            answers = VALUES(answers),
            status = VALUES(status),
            updated_at = VALUES(updated_at)
        "#,
    )
    .bind(&submission.company_id)
    .bind(submission.role.to_string())
    .bind(answers)
    .bind(submission.status.to_string())
    .bind(submission.created_at)
    .bind(submission.updated_at)
    .execute(pool)
    .await
    .context("Failed to upsert submission")?;

    Ok(())
}

async fn get_sqlite(
    pool: &SqlitePool,
    company_id: &str,
    role: FormRole,
) -> Result<Option<Submission>> {
    let row = sqlx::query(SELECT_SUBMISSION)
        .bind(company_id)
        .bind(role.to_string())
        .fetch_optional(pool)
        .await
        .context("Failed to get submission")?;

    match row {
        Some(row) => Ok(Some(row_to_submission(
            row.get("company_id"),
            row.get("role"),
            row.get("answers"),
            row.get("status"),
            row.get("created_at"),
            row.get("updated_at"),
        )?)),
        None => Ok(None),
    }
}

async fn get_mysql(
    pool: &MySqlPool,
    company_id: &str,
    role: FormRole,
) -> Result<Option<Submission>> {
    let row = sqlx::query(SELECT_SUBMISSION)
        .bind(company_id)
        .bind(role.to_string())
        .fetch_optional(pool)
        .await
        .context("Failed to get submission")?;

    match row {
        Some(row) => Ok(Some(row_to_submission(
            row.get("company_id"),
            row.get("role"),
            row.get("answers"),
            row.get("status"),
            row.get("created_at"),
            row.get("updated_at"),
        )?)),
        None => Ok(None),
    }
}

fn row_to_submission(
    company_id: String,
    role: String,
    answers: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<Submission> {
    let role: FormRole = role
        .parse()
        .map_err(|_| anyhow!("Unknown role in submissions row: {}", role))?;
    let status: SubmissionStatus = status
        .parse()
        .map_err(|_| anyhow!("Unknown status in submissions row: {}", status))?;
    let answers: Vec<String> =
        serde_json::from_str(&answers).context("Failed to parse stored answers")?;

    Ok(Submission {
        company_id,
        role,
        answers,
        status,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::access_code::tests::{seed_company, setup_pool};

    fn submission(company: &str, role: FormRole, answers: Vec<String>) -> Submission {
        let now = Utc::now();
        Submission {
            company_id: company.to_string(),
            role,
            answers,
            status: SubmissionStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let pool = setup_pool().await;
        seed_company(&pool, "acme").await;
        let repo = SqlxSubmissionRepository::new(pool);

        let s = submission("acme", FormRole::Commercial, vec!["uno".into(), "dos".into()]);
        repo.upsert(&s).await.expect("Upsert failed");

        let found = repo
            .get("acme", FormRole::Commercial)
            .await
            .expect("Get failed")
            .expect("Submission should exist");

        assert_eq!(found.answers, vec!["uno".to_string(), "dos".to_string()]);
        assert_eq!(found.status, SubmissionStatus::Draft);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_answers() {
        let pool = setup_pool().await;
        seed_company(&pool, "acme").await;
        let repo = SqlxSubmissionRepository::new(pool);

        repo.upsert(&submission("acme", FormRole::Technical, vec!["a".into()]))
            .await
            .unwrap();

        let mut replacement = submission("acme", FormRole::Technical, vec!["b".into(), "c".into()]);
        replacement.status = SubmissionStatus::Submitted;
        repo.upsert(&replacement).await.unwrap();

        let found = repo.get("acme", FormRole::Technical).await.unwrap().unwrap();
        assert_eq!(found.answers.len(), 2);
        assert_eq!(found.status, SubmissionStatus::Submitted);
    }

    #[tokio::test]
    async fn test_tracks_are_independent_rows() {
        let pool = setup_pool().await;
        seed_company(&pool, "acme").await;
        let repo = SqlxSubmissionRepository::new(pool);

        repo.upsert(&submission("acme", FormRole::Commercial, vec!["c".into()]))
            .await
            .unwrap();

        assert!(repo.get("acme", FormRole::Technical).await.unwrap().is_none());
        assert!(repo.get("acme", FormRole::Commercial).await.unwrap().is_some());
    }
}
