//! Onboarding data API endpoints
//!
//! - GET  /api/v1/onboarding?form_type=... - Read stored answers
//! - POST /api/v1/onboarding               - saveProgress / submitForm / finalize
//!
//! Both routes sit behind `require_session`; the handlers enforce the track
//! rules through `SubmissionService`, which distinguishes 403 (wrong role)
//! from 400 (bad payload).

use axum::{
    extract::{Extension, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{extract_client_ip, ApiError, AppState, CurrentSession};
use crate::models::{FormRole, Submission};
use crate::services::{SubmissionError, ONBOARDING_POLICY};
use axum::http::HeaderMap;

/// Request body for onboarding actions
#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    pub action: String,
    #[serde(rename = "formType")]
    pub form_type: FormRole,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Query parameters for the progress read
#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub form_type: FormRole,
}

/// Response for progress reads and draft saves
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    #[serde(rename = "formType")]
    pub form_type: String,
    pub answers: Vec<String>,
    pub status: String,
    #[serde(rename = "filledCount")]
    pub filled_count: usize,
}

impl From<Submission> for ProgressResponse {
    fn from(submission: Submission) -> Self {
        Self {
            form_type: submission.role.to_string(),
            filled_count: submission.filled_count(),
            status: submission.status.to_string(),
            answers: submission.answers,
        }
    }
}

/// Build the onboarding router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_progress).post(dispatch_action))
}

fn map_submission_error(e: SubmissionError) -> ApiError {
    match e {
        SubmissionError::Validation(msg) => ApiError::validation_error(msg),
        SubmissionError::Forbidden => ApiError::forbidden("Acción no permitida para este rol"),
        SubmissionError::IncompleteCommercial | SubmissionError::IncompleteTechnical => {
            ApiError::validation_error(e.to_string())
        }
        SubmissionError::Pipeline(e) => {
            tracing::error!("Finalize pipeline failed: {}", e);
            ApiError::internal_error("Error al procesar la solicitud")
        }
        SubmissionError::Internal(e) => {
            tracing::error!("Submission storage failed: {}", e);
            ApiError::internal_error("Error interno")
        }
    }
}

/// GET /api/v1/onboarding - Read the caller's stored answers
async fn get_progress(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    headers: HeaderMap,
    Query(query): Query<ProgressQuery>,
) -> Result<impl IntoResponse, ApiError> {
    admit(&state, &headers).await?;

    let submission = state
        .submissions
        .get_progress(&session.0.company_id, session.0.role, query.form_type)
        .await
        .map_err(map_submission_error)?;

    let response = submission.map(ProgressResponse::from).unwrap_or_else(|| {
        ProgressResponse {
            form_type: query.form_type.to_string(),
            answers: Vec::new(),
            status: "draft".to_string(),
            filled_count: 0,
        }
    });

    Ok(Json(response))
}

/// POST /api/v1/onboarding - Dispatch a save, submit, or finalize action
async fn dispatch_action(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    headers: HeaderMap,
    Json(body): Json<OnboardingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    admit(&state, &headers).await?;

    let company_id = &session.0.company_id;
    let role = session.0.role;

    match body.action.as_str() {
        "saveProgress" => {
            let saved = state
                .submissions
                .save_progress(company_id, role, body.form_type, &body.answers)
                .await
                .map_err(map_submission_error)?;
            Ok(Json(serde_json::json!({
                "success": true,
                "filledCount": saved.filled_count(),
            })))
        }
        "submitForm" => {
            let submitted = state
                .submissions
                .submit_form(company_id, role, body.form_type, &body.answers)
                .await
                .map_err(map_submission_error)?;
            Ok(Json(serde_json::json!({
                "success": true,
                "status": submitted.status.to_string(),
            })))
        }
        "finalize" => {
            if body.form_type != FormRole::Commercial {
                return Err(ApiError::forbidden("Acción no permitida para este rol"));
            }
            let proposal = state
                .submissions
                .finalize(company_id, role, &body.answers)
                .await
                .map_err(map_submission_error)?;
            Ok(Json(serde_json::json!({
                "success": true,
                "proposalSent": true,
                "companyId": proposal.company_id,
            })))
        }
        other => Err(ApiError::validation_error(format!(
            "Acción desconocida: {}",
            other
        ))),
    }
}

async fn admit(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let ip = extract_client_ip(headers);
    if !state
        .limiter
        .admit(&format!("onboarding:{}", ip), ONBOARDING_POLICY)
        .await
    {
        return Err(ApiError::rate_limited());
    }
    Ok(())
}
