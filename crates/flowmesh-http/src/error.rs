//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use flowmesh_core::MeshError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// JSON error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("no graph has been uploaded yet")]
    NoGraph,

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NoGraph => StatusCode::NOT_FOUND,
            ApiError::Mesh(e) if e.is_configuration() => StatusCode::BAD_REQUEST,
            ApiError::Mesh(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NoGraph => "graph_not_found",
            ApiError::Mesh(e) if e.is_configuration() => "invalid_configuration",
            ApiError::Mesh(MeshError::MailboxClosed { .. }) => "mailbox_closed",
            ApiError::Mesh(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }
        let body = ErrorResponse::new(self.error_code(), self.to_string());
        (status, Json(body)).into_response()
    }
}
