//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints of the onboarding backend:
//! - Auth endpoints (code verification, session status, logout)
//! - Onboarding data endpoints (progress, submit, finalize)
//! - Contact request endpoint
//! - Role-scoped page routes behind the page gate

use axum::{
    extract::Extension,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod contact;
pub mod middleware;
pub mod onboarding;

pub use middleware::{ApiError, AppState, CurrentSession};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Onboarding data routes sit behind the session gate
    let protected_routes = Router::new()
        .nest("/onboarding", onboarding::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ));

    Router::new()
        .nest("/auth", auth::router())
        .nest("/contact", contact::router())
        .merge(protected_routes)
}

/// Build the role-scoped page routes behind the page gate
fn build_page_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/comercial", get(questionnaire_page))
        .route("/tecnico", get(questionnaire_page))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::page_gate,
        ))
}

/// GET /comercial, GET /tecnico - Questionnaire page shell
///
/// The gate has already matched the session role against the prefix, so the
/// handler only reports the questionnaire shape for the caller's track.
async fn questionnaire_page(Extension(session): Extension<CurrentSession>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "formType": session.0.role.to_string(),
        "questions": session.0.role.question_count(),
    }))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true);
    if let Ok(origin) = cors_origin.parse::<HeaderValue>() {
        cors = cors.allow_origin(origin);
    }

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .merge(build_page_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
