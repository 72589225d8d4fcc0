//! Response shaping.
//!
//! Expected failures are still HTTP 200: the body carries
//! `status: "error"` so the dashboard keeps rendering.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::voting::VoteError;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: &'static str,
    pub message: String,
    pub timestamp: i64,
}

impl ErrorBody {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: kind,
            message: message.into(),
            timestamp: now_millis(),
        }
    }
}

impl IntoResponse for VoteError {
    fn into_response(self) -> Response {
        match &self {
            VoteError::Storage(_) => tracing::error!(error = %self, "Vote request failed"),
            _ => tracing::debug!(error = %self, kind = self.kind(), "Vote request rejected"),
        }
        (StatusCode::OK, Json(ErrorBody::new(self.kind(), self.to_string()))).into_response()
    }
}

/// Malformed, missing or oversized JSON body.
pub fn rejection_to_vote_error(rejection: JsonRejection) -> VoteError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return VoteError::Validation("request body exceeds the configured size limit".into());
    }
    VoteError::Validation(format!("invalid request body: {}", rejection.body_text()))
}
