//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the JSON
//! error body every handler answers with.

use crate::config::ConfigError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roadmap_core::{NotesError, PortError, ResolutionDebug, SubmissionError};
use serde::Serialize;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from building an outbound HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// `{ok: false, error, debug?}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub debug: Option<ResolutionDebug>,
}

/// A handler failure: a status code plus the JSON error body.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                ok: false,
                error: message.into(),
                debug: None,
            },
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<PortError> for HttpError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => HttpError::new(StatusCode::NOT_FOUND, msg),
            PortError::Unexpected(msg) => HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}

impl From<SubmissionError> for HttpError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Upstream(port) => {
                HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, port.to_string())
            }
            SubmissionError::Unresolvable { message, debug } => HttpError {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody {
                    ok: false,
                    error: message,
                    debug,
                },
            },
            other => HttpError::new(StatusCode::BAD_REQUEST, other.to_string()),
        }
    }
}

impl From<NotesError> for HttpError {
    fn from(err: NotesError) -> Self {
        match err {
            NotesError::Port(port) => port.into(),
            other => HttpError::new(StatusCode::BAD_REQUEST, other.to_string()),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::new(rejection.status(), rejection.body_text())
    }
}
