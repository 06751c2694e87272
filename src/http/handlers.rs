use super::error::ApiError;
use super::{AppState, MAX_BODY_BYTES};
use crate::types::{unix_ms, EmbedSubmission, RequestMeta, VerifySubmission};
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::net::SocketAddr;

/// Proxy-aware client address: Cloudflare header first, then the first
/// token of `x-forwarded-for`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(ip) = headers.get("cf-connecting-ip").and_then(|v| v.to_str().ok()) {
        let ip = ip.trim();
        if !ip.is_empty() {
            return ip.to_string();
        }
    }
    if let Some(fwd) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = fwd.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    peer.ip().to_string()
}

fn request_meta(headers: &HeaderMap, peer: SocketAddr) -> RequestMeta {
    RequestMeta {
        ip: client_ip(headers, peer),
        user_agent: headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string(),
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.len() > MAX_BODY_BYTES {
        return Err(ApiError::BodyTooLarge);
    }
    serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)
}

pub async fn create_challenge(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let issued = state
        .engine
        .issue_standalone(unix_ms())
        .map_err(|_| ApiError::AnalysisFailed)?;
    Ok(Json(json!(issued)))
}

pub async fn create_embed_challenge(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let issued = state
        .engine
        .issue_embed(unix_ms())
        .map_err(|_| ApiError::AnalysisFailed)?;
    Ok(Json(json!(issued)))
}

pub async fn verify(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let sub: VerifySubmission = parse_body(&body)?;
    let meta = request_meta(&headers, peer);
    let response = state.engine.verify_standalone(&sub, &meta, unix_ms())?;
    Ok(Json(json!(response)))
}

pub async fn verify_embed(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let sub: EmbedSubmission = parse_body(&body)?;
    let meta = request_meta(&headers, peer);
    let response = state.engine.verify_embed(&sub, &meta, unix_ms())?;
    Ok(Json(json!(response)))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "uptimeSec": state.started.elapsed().as_secs(),
        "pendingChallenges": state.engine.pending_challenges(),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
