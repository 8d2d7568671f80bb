//! Authentication API endpoints
//!
//! - POST /api/v1/auth/verify-code - Exchange an access code for a session
//! - GET  /api/v1/auth/session     - Remaining session lifetime and role
//! - POST /api/v1/auth/logout      - Clear the session cookie
//!
//! The verify-code route sleeps a random 50-250 ms before any processing,
//! success and failure alike, so response timing does not leak whether a
//! code exists.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::middleware::{
    clear_session_cookie, extract_client_ip, extract_user_agent, session_cookie, ApiError,
    AppState,
};
use crate::models::FormRole;
use crate::services::{AccessCodeError, VERIFY_CODE_POLICY};

/// Request body for code verification
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
    pub role: FormRole,
}

/// Response for successful code verification
#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub success: bool,
    pub role: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
}

/// Response for the session status check
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify-code", post(verify_code))
        .route("/session", get(session_status))
        .route("/logout", post(logout))
}

/// POST /api/v1/auth/verify-code - Exchange an access code for a session
async fn verify_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let delay = rand::thread_rng().gen_range(50..=250);
    tokio::time::sleep(Duration::from_millis(delay)).await;

    let ip = extract_client_ip(&headers);
    if !state
        .limiter
        .admit(&format!("verify-code:{}", ip), VERIFY_CODE_POLICY)
        .await
    {
        return Err(ApiError::rate_limited());
    }

    let grant = state
        .access_codes
        .verify(&body.code, body.role)
        .await
        .map_err(|e| match e {
            AccessCodeError::InvalidCode => ApiError::unauthorized(),
            AccessCodeError::Internal(e) => {
                tracing::error!("Access code lookup failed: {}", e);
                ApiError::internal_error("Error interno")
            }
        })?;

    let user_agent = extract_user_agent(&headers);
    let (token, claims) = state
        .sessions
        .issue(&grant.company_id, grant.role, &ip, &user_agent);

    tracing::info!(
        "Session issued for company {} ({})",
        grant.company_id,
        grant.role
    );

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&session_cookie(&token, state.secure_cookie)) {
        response_headers.insert(header::SET_COOKIE, value);
    }

    Ok((
        response_headers,
        Json(VerifyCodeResponse {
            success: true,
            role: grant.role.to_string(),
            expires_in: claims.exp - claims.iat,
        }),
    ))
}

/// GET /api/v1/auth/session - Report session state without a fingerprint check
async fn session_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionStatusResponse> {
    let token = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|c| {
                c.trim()
                    .strip_prefix("onboarding_session=")
                    .map(String::from)
            })
        });

    let status = token
        .and_then(|t| {
            let claims = state.sessions.verify(&t).ok()?;
            let remaining = state.sessions.remaining(&t).ok()?;
            Some(SessionStatusResponse {
                authenticated: true,
                role: Some(claims.role.to_string()),
                remaining_seconds: Some(remaining),
            })
        })
        .unwrap_or(SessionStatusResponse {
            authenticated: false,
            role: None,
            remaining_seconds: None,
        });

    Json(status)
}

/// POST /api/v1/auth/logout - Clear the session cookie
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(state.secure_cookie)) {
        headers.insert(header::SET_COOKIE, value);
    }
    (headers, Json(serde_json::json!({ "success": true })))
}
