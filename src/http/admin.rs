use super::error::ApiError;
use super::AppState;
use crate::admin_stats;
use crate::token::constant_time_eq;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub token: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Single bearer token, from the Authorization header or `?token=`.
/// Comparison is constant-time; an unset token disables the routes.
fn authorize(state: &AppState, headers: &HeaderMap, query: &AdminQuery) -> Result<(), ApiError> {
    let Some(expected) = state.engine.config().admin_token.as_deref() else {
        return Err(ApiError::AdminNotConfigured);
    };

    let from_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let provided = from_header
        .or(query.token.as_deref())
        .ok_or(ApiError::MissingToken)?;

    if constant_time_eq(provided, expected) {
        Ok(())
    } else {
        Err(ApiError::InvalidToken)
    }
}

pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers, &query)?;
    let stats = admin_stats::compute(&state.engine.config().session_log_path());
    Ok(Json(json!({ "ok": true, "stats": stats })))
}

pub async fn sessions(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers, &query)?;
    let limit = query.limit.unwrap_or(50).min(500);
    let offset = query.offset.unwrap_or(0);
    let page = admin_stats::list_sessions(&state.engine.config().session_log_path(), limit, offset);
    Ok(Json(json!({
        "ok": true,
        "total": page.total,
        "limit": limit,
        "offset": offset,
        "sessions": page.rows,
    })))
}

pub async fn session(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers, &query)?;
    let record = admin_stats::find_session(&state.engine.config().session_log_path(), &id)
        .ok_or(ApiError::SessionNotFound)?;
    Ok(Json(json!({ "ok": true, "session": record })))
}
