//! API error types with structured JSON responses

use crate::runtime::SessionError;
use crate::state_machine::TransitionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{"error": {"code", "message"}}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Transition(e) => {
                let (status, code) = match e {
                    TransitionError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
                    TransitionError::IndexOutOfRange { .. } => {
                        (StatusCode::BAD_REQUEST, "INDEX_OUT_OF_RANGE")
                    }
                    TransitionError::InvalidState { .. } => (StatusCode::CONFLICT, "WRONG_PHASE"),
                    TransitionError::StaleResult { .. } => (StatusCode::CONFLICT, "STALE_RESULT"),
                };
                (status, code, e.to_string())
            }
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Transition(e) => ApiError::Transition(e),
            SessionError::NotFound(id) => ApiError::NotFound(format!("Session {id} not found")),
            SessionError::Closed(_) => ApiError::Internal(err.to_string()),
        }
    }
}
