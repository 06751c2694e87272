//! API error taxonomy. Each variant maps one-to-one onto a wire error code
//! and an HTTP status; handlers and the engine share the same enum so the
//! mapping lives in exactly one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("body_too_large")]
    BodyTooLarge,
    #[error("invalid_json")]
    InvalidJson,
    #[error("insufficient_pointer_data")]
    InsufficientPointerData,
    #[error("missing_phases")]
    MissingPhases,
    #[error("missing_canvas")]
    MissingCanvas,
    #[error("missing_elements")]
    MissingElements,
    #[error("invalid_token")]
    InvalidToken,
    #[error("missing_token")]
    MissingToken,
    #[error("admin_not_configured")]
    AdminNotConfigured,
    #[error("challenge_not_found")]
    ChallengeNotFound,
    #[error("session_not_found")]
    SessionNotFound,
    #[error("wrong_challenge_mode")]
    WrongChallengeMode,
    #[error("challenge_already_used")]
    ChallengeAlreadyUsed,
    #[error("challenge_expired")]
    ChallengeExpired,
    #[error("analysis_failed")]
    AnalysisFailed,
    #[error("not_found")]
    NotFound,
}

impl ApiError {
    pub fn code(self) -> &'static str {
        match self {
            ApiError::BodyTooLarge => "body_too_large",
            ApiError::InvalidJson => "invalid_json",
            ApiError::InsufficientPointerData => "insufficient_pointer_data",
            ApiError::MissingPhases => "missing_phases",
            ApiError::MissingCanvas => "missing_canvas",
            ApiError::MissingElements => "missing_elements",
            ApiError::InvalidToken => "invalid_token",
            ApiError::MissingToken => "missing_token",
            ApiError::AdminNotConfigured => "admin_not_configured",
            ApiError::ChallengeNotFound => "challenge_not_found",
            ApiError::SessionNotFound => "session_not_found",
            ApiError::WrongChallengeMode => "wrong_challenge_mode",
            ApiError::ChallengeAlreadyUsed => "challenge_already_used",
            ApiError::ChallengeExpired => "challenge_expired",
            ApiError::AnalysisFailed => "analysis_failed",
            ApiError::NotFound => "not_found",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ApiError::BodyTooLarge
            | ApiError::InvalidJson
            | ApiError::InsufficientPointerData
            | ApiError::MissingPhases
            | ApiError::MissingCanvas
            | ApiError::MissingElements
            | ApiError::WrongChallengeMode => StatusCode::BAD_REQUEST,
            ApiError::InvalidToken | ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::AdminNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ChallengeNotFound | ApiError::SessionNotFound | ApiError::NotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::ChallengeAlreadyUsed => StatusCode::CONFLICT,
            ApiError::ChallengeExpired => StatusCode::GONE,
            ApiError::AnalysisFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "ok": false, "error": self.code() }))).into_response()
    }
}

impl From<crate::store::ConsumeError> for ApiError {
    fn from(err: crate::store::ConsumeError) -> Self {
        match err {
            crate::store::ConsumeError::NotFound => ApiError::ChallengeNotFound,
            crate::store::ConsumeError::WrongMode => ApiError::WrongChallengeMode,
            crate::store::ConsumeError::AlreadyUsed => ApiError::ChallengeAlreadyUsed,
            crate::store::ConsumeError::Expired => ApiError::ChallengeExpired,
        }
    }
}
