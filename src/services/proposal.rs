//! Profile evaluation and proposal generation
//!
//! Both steps call external HTTP services. The `ProposalBackend` trait keeps
//! the finalize pipeline testable without a network; `HttpProposalBackend` is
//! the production implementation.

use crate::config::ServicesConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of evaluating a company's questionnaire answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileEvaluation {
    pub company_id: String,
    pub score: f64,
    pub summary: String,
}

/// Generated proposal document, plain text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProposalDocument {
    pub company_id: String,
    pub body: String,
}

/// External evaluation and proposal generation
#[async_trait]
pub trait ProposalBackend: Send + Sync {
    /// Evaluate the company profile from both answer sets.
    async fn evaluate_profile(
        &self,
        company_id: &str,
        commercial_answers: &[String],
        technical_answers: &[String],
    ) -> Result<ProfileEvaluation>;

    /// Generate the proposal document from an evaluation.
    async fn generate_proposal(
        &self,
        company_id: &str,
        evaluation: &ProfileEvaluation,
    ) -> Result<ProposalDocument>;
}

#[derive(Serialize)]
struct EvaluateRequest<'a> {
    company_id: &'a str,
    commercial_answers: &'a [String],
    technical_answers: &'a [String],
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    company_id: &'a str,
    evaluation: &'a ProfileEvaluation,
}

/// HTTP client for the evaluation and proposal services
pub struct HttpProposalBackend {
    client: reqwest::Client,
    config: ServicesConfig,
}

impl HttpProposalBackend {
    pub fn new(config: ServicesConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ProposalBackend for HttpProposalBackend {
    async fn evaluate_profile(
        &self,
        company_id: &str,
        commercial_answers: &[String],
        technical_answers: &[String],
    ) -> Result<ProfileEvaluation> {
        let request = EvaluateRequest {
            company_id,
            commercial_answers,
            technical_answers,
        };

        let evaluation = self
            .client
            .post(&self.config.evaluation_url)
            .json(&request)
            .send()
            .await
            .context("Evaluation service unreachable")?
            .error_for_status()
            .context("Evaluation service returned an error")?
            .json()
            .await
            .context("Evaluation service returned an invalid body")?;

        Ok(evaluation)
    }

    async fn generate_proposal(
        &self,
        company_id: &str,
        evaluation: &ProfileEvaluation,
    ) -> Result<ProposalDocument> {
        let request = GenerateRequest {
            company_id,
            evaluation,
        };

        let proposal = self
            .client
            .post(&self.config.proposal_url)
            .json(&request)
            .send()
            .await
            .context("Proposal service unreachable")?
            .error_for_status()
            .context("Proposal service returned an error")?
            .json()
            .await
            .context("Proposal service returned an invalid body")?;

        Ok(proposal)
    }
}
