//! Shared API state, error envelope, and the session gates
//!
//! Two gates guard authenticated surfaces. `require_session` protects API
//! routes and answers JSON errors; `page_gate` protects the role-scoped page
//! prefixes and answers redirects to `/` so a failed check reveals nothing.
//! Both verify the token and compare the bound fingerprint against the live
//! request on every call; nothing is cached between requests.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::ContactRepository;
use crate::models::SessionClaims;
use crate::services::{
    AccessCodeService, RateLimiter, SessionService, SubmissionService, SESSION_COOKIE,
    SESSION_TTL_SECS,
};

/// Sentinel identifier when no client IP can be determined.
pub const UNKNOWN_IP: &str = "unknown-ip";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub access_codes: Arc<AccessCodeService>,
    pub sessions: Arc<SessionService>,
    pub submissions: Arc<SubmissionService>,
    pub contacts: Arc<dyn ContactRepository>,
    pub limiter: Arc<RateLimiter>,
    pub secure_cookie: bool,
}

/// Verified session claims extracted from the request
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionClaims);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "No autorizado")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn rate_limited() -> Self {
        Self::new(
            "RATE_LIMITED",
            "Demasiados intentos. Inténtalo de nuevo más tarde.",
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Build the session cookie for a freshly issued token.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        SESSION_COOKIE, token, SESSION_TTL_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build an expired cookie that removes the session from the client.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", SESSION_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Extract the session token from the request cookie
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some(token) = cookie.strip_prefix(&format!("{}=", SESSION_COOKIE)) {
            return Some(token.to_string());
        }
    }
    None
}

/// Resolve the client IP for rate limiting and fingerprint checks.
///
/// Proxy headers first; when none is present the identifier falls back to
/// the `unknown-ip` sentinel, which then shares one rate-limit bucket.
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    UNKNOWN_IP.to_string()
}

/// Extract the User-Agent header, empty string when absent.
pub fn extract_user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn verify_request_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<SessionClaims, GateFailure> {
    let token = extract_session_token(headers).ok_or(GateFailure::NoSession)?;

    let claims = state
        .sessions
        .verify(&token)
        .map_err(|_| GateFailure::NoSession)?;

    let ip = extract_client_ip(headers);
    let user_agent = extract_user_agent(headers);
    if !claims.fingerprint_matches(&ip, &user_agent) {
        return Err(GateFailure::FingerprintMismatch);
    }

    Ok(claims)
}

enum GateFailure {
    NoSession,
    FingerprintMismatch,
}

/// Session middleware for API routes: 401 on any failure, cookie cleared
/// when a valid token arrives from the wrong client.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match verify_request_session(&state, request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(CurrentSession(claims));
            next.run(request).await
        }
        Err(GateFailure::NoSession) => ApiError::unauthorized().into_response(),
        Err(GateFailure::FingerprintMismatch) => {
            let mut response = ApiError::unauthorized().into_response();
            if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(state.secure_cookie)) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            response
        }
    }
}

/// Session middleware for the role-scoped page prefixes.
///
/// Every failure answers the same redirect to `/`, including a session whose
/// role does not match the prefix being visited.
pub async fn page_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    match verify_request_session(&state, request.headers()) {
        Ok(claims) if path.starts_with(claims.role.route_prefix()) => {
            request.extensions_mut().insert(CurrentSession(claims));
            next.run(request).await
        }
        Ok(_) => Redirect::to("/").into_response(),
        Err(GateFailure::NoSession) => Redirect::to("/").into_response(),
        Err(GateFailure::FingerprintMismatch) => {
            let mut response = Redirect::to("/").into_response();
            if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(state.secure_cookie)) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", false);
        assert!(cookie.starts_with("onboarding_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=900"));
        assert!(cookie.contains("Path=/"));
        assert!(!cookie.contains("Secure"));

        assert!(session_cookie("tok", true).contains("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(true);
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn test_extract_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; onboarding_session=abc.def; lang=es"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc.def"));

        let empty = HeaderMap::new();
        assert!(extract_session_token(&empty).is_none());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("5.6.7.8"));
        assert_eq!(extract_client_ip(&headers), "1.2.3.4");

        let mut real_only = HeaderMap::new();
        real_only.insert("x-real-ip", HeaderValue::from_static("5.6.7.8"));
        assert_eq!(extract_client_ip(&real_only), "5.6.7.8");

        assert_eq!(extract_client_ip(&HeaderMap::new()), UNKNOWN_IP);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::unauthorized().into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::forbidden("no").into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::validation_error("mal").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::rate_limited().into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::internal_error("boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
