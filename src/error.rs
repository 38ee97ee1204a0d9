//! Controller errors and their JSON responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Message returned when a create or update arrives without a title.
pub const TITLE_MISSING: &str = "title is missing";

/// Errors surfaced by [`crate::controller::NoteApiController`].
#[derive(Debug, thiserror::Error)]
pub enum NoteApiError {
    /// Rejected input (400). The message is sent to the client verbatim.
    #[error("{0}")]
    Validation(String),

    /// The note, or the share being revoked, does not exist (404).
    #[error("note not found")]
    NotFound,

    /// The requester lacks the permission the action needs (403).
    #[error("not allowed")]
    Unauthorized,

    /// A collaborator failed (500). Logged, never shown to the client.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl NoteApiError {
    pub fn title_missing() -> Self {
        Self::Validation(TITLE_MISSING.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Extractor rejections are reported as validation errors.

impl From<JsonRejection> for NoteApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for NoteApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for NoteApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl IntoResponse for NoteApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, NoteApiError>;
