//! Contact request API endpoint
//!
//! POST /api/v1/contact - Store a contact request (public, rate limited)

use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{extract_client_ip, ApiError, AppState};
use crate::services::{sanitize_answer, CONTACT_POLICY};

/// Request body for a contact request
#[derive(Debug, Deserialize)]
pub struct ContactBody {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Build the contact router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_contact))
}

/// POST /api/v1/contact - Store a contact request
async fn create_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ContactBody>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = extract_client_ip(&headers);
    if !state
        .limiter
        .admit(&format!("contact:{}", ip), CONTACT_POLICY)
        .await
    {
        return Err(ApiError::rate_limited());
    }

    let name = sanitize_answer(body.name.trim());
    let email = body.email.trim();
    let message = sanitize_answer(body.message.trim());

    if name.is_empty() {
        return Err(ApiError::validation_error("El nombre es obligatorio"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation_error("Email no válido"));
    }
    if message.is_empty() {
        return Err(ApiError::validation_error("El mensaje es obligatorio"));
    }

    state
        .contacts
        .insert(&name, email, &message)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store contact request: {}", e);
            ApiError::internal_error("Error interno")
        })?;

    Ok(Json(serde_json::json!({ "success": true })))
}
