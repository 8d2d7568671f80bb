//! Questionnaire submission logic
//!
//! Owns draft saves, final submits, and the finalize pipeline. The track
//! check (the caller's session role must match the form being written) runs
//! before anything is validated or persisted.
//!
//! Finalize is a sequential pipeline with no surrounding transaction:
//! persist answers, check completeness of both tracks, evaluate the profile,
//! generate the proposal, send it by email. The first failing step aborts
//! the rest; steps already done are not rolled back, so a crash between
//! persist and email leaves persisted answers with no proposal sent.

use crate::db::repositories::{CompanyRepository, SubmissionRepository};
use crate::models::{FormRole, Submission, SubmissionStatus};
use crate::services::proposal::{ProposalBackend, ProposalDocument};
use crate::services::sanitize::sanitize_answers;
use crate::services::Mailer;
use anyhow::anyhow;
use chrono::Utc;
use std::sync::Arc;

/// Error types for submission operations
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Request shape is wrong (answer count, unknown action)
    #[error("{0}")]
    Validation(String),

    /// Session role does not authorize this form or action
    #[error("Acción no permitida para este rol")]
    Forbidden,

    /// Commercial questionnaire has unanswered questions
    #[error("El formulario comercial está incompleto")]
    IncompleteCommercial,

    /// Technical questionnaire is missing or has unanswered questions
    #[error("El formulario técnico está incompleto")]
    IncompleteTechnical,

    /// An external pipeline step failed after validation passed
    #[error(transparent)]
    Pipeline(anyhow::Error),

    /// Storage failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Questionnaire submission service
pub struct SubmissionService {
    submissions: Arc<dyn SubmissionRepository>,
    companies: Arc<dyn CompanyRepository>,
    backend: Arc<dyn ProposalBackend>,
    mailer: Arc<dyn Mailer>,
}

impl SubmissionService {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        companies: Arc<dyn CompanyRepository>,
        backend: Arc<dyn ProposalBackend>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            submissions,
            companies,
            backend,
            mailer,
        }
    }

    /// Read the caller's saved answers for its own track.
    pub async fn get_progress(
        &self,
        company_id: &str,
        session_role: FormRole,
        form_role: FormRole,
    ) -> Result<Option<Submission>, SubmissionError> {
        if session_role != form_role {
            return Err(SubmissionError::Forbidden);
        }
        Ok(self.submissions.get(company_id, form_role).await?)
    }

    /// Store a draft answer set. Partial arrays are fine; the stored array
    /// may be shorter than the questionnaire.
    pub async fn save_progress(
        &self,
        company_id: &str,
        session_role: FormRole,
        form_role: FormRole,
        answers: &[String],
    ) -> Result<Submission, SubmissionError> {
        if session_role != form_role {
            return Err(SubmissionError::Forbidden);
        }
        if answers.len() > form_role.question_count() {
            return Err(SubmissionError::Validation(format!(
                "Se esperaban como máximo {} respuestas",
                form_role.question_count()
            )));
        }

        self.write(company_id, form_role, answers, SubmissionStatus::Draft)
            .await
    }

    /// Store a full answer set and mark it submitted. The array must have
    /// exactly one slot per question; blank answers are accepted here and
    /// only counted at finalize.
    pub async fn submit_form(
        &self,
        company_id: &str,
        session_role: FormRole,
        form_role: FormRole,
        answers: &[String],
    ) -> Result<Submission, SubmissionError> {
        if session_role != form_role {
            return Err(SubmissionError::Forbidden);
        }
        if answers.len() != form_role.question_count() {
            return Err(SubmissionError::Validation(format!(
                "Se esperaban {} respuestas, llegaron {}",
                form_role.question_count(),
                answers.len()
            )));
        }

        self.write(company_id, form_role, answers, SubmissionStatus::Submitted)
            .await
    }

    /// Run the finalize pipeline for a commercial session.
    ///
    /// Order matters: the commercial answers are persisted first, then both
    /// completeness checks run before any external call is made, so an
    /// incomplete questionnaire never reaches the evaluation service.
    pub async fn finalize(
        &self,
        company_id: &str,
        session_role: FormRole,
        answers: &[String],
    ) -> Result<ProposalDocument, SubmissionError> {
        if session_role != FormRole::Commercial {
            return Err(SubmissionError::Forbidden);
        }
        if answers.len() != FormRole::Commercial.question_count() {
            return Err(SubmissionError::Validation(format!(
                "Se esperaban {} respuestas, llegaron {}",
                FormRole::Commercial.question_count(),
                answers.len()
            )));
        }

        let commercial = self
            .write(
                company_id,
                FormRole::Commercial,
                answers,
                SubmissionStatus::Submitted,
            )
            .await?;

        if !commercial.is_complete() {
            return Err(SubmissionError::IncompleteCommercial);
        }

        let technical = self
            .submissions
            .get(company_id, FormRole::Technical)
            .await?
            .filter(|s| s.is_complete())
            .ok_or(SubmissionError::IncompleteTechnical)?;

        let evaluation = self
            .backend
            .evaluate_profile(company_id, &commercial.answers, &technical.answers)
            .await
            .map_err(SubmissionError::Pipeline)?;

        let proposal = self
            .backend
            .generate_proposal(company_id, &evaluation)
            .await
            .map_err(SubmissionError::Pipeline)?;

        let company = self
            .companies
            .get(company_id)
            .await?
            .ok_or_else(|| SubmissionError::Pipeline(anyhow!("Unknown company {}", company_id)))?;

        self.mailer
            .send_proposal(&company.email, &company.name, &proposal.body)
            .await
            .map_err(SubmissionError::Pipeline)?;

        tracing::info!("Finalized onboarding for company {}", company_id);

        Ok(proposal)
    }

    async fn write(
        &self,
        company_id: &str,
        role: FormRole,
        answers: &[String],
        status: SubmissionStatus,
    ) -> Result<Submission, SubmissionError> {
        let now = Utc::now();
        let created_at = match self.submissions.get(company_id, role).await? {
            Some(existing) => existing.created_at,
            None => now,
        };

        let submission = Submission {
            company_id: company_id.to_string(),
            role,
            answers: sanitize_answers(answers),
            status,
            created_at,
            updated_at: now,
        };

        self.submissions.upsert(&submission).await?;
        Ok(submission)
    }
}
