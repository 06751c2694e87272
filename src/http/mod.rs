//! Axum surface: public API routes, admin read paths, and the header and
//! CORS policy shared by all of them.

pub mod admin;
pub mod error;
pub mod handlers;

use crate::engine::VerificationEngine;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<VerificationEngine>,
    pub started: Instant,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/challenge", post(handlers::create_challenge))
        .route("/api/verify", post(handlers::verify))
        .route("/api/embed/challenge", post(handlers::create_embed_challenge))
        .route("/api/embed/verify", post(handlers::verify_embed))
        .route("/api/health", get(handlers::health))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/sessions", get(admin::sessions))
        .route("/api/admin/session/:id", get(admin::session))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES + 4096))
        .with_state(state)
}
