//! JSON error responses for HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use extraction::{PipelineError, SessionError, StorageError};

/// Handler error rendered as `{error, details}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<Value>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request_with(message: impl Into<String>, details: Value) -> Self {
        Self::BadRequest {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Pipeline(PipelineError::Session(
                SessionError::EmptyBatch | SessionError::TooManyUrls { .. },
            )) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::Session(_)) => StatusCode::CONFLICT,
            ApiError::Storage(_) | ApiError::Pipeline(PipelineError::Storage(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let (error, details) = match self {
            ApiError::BadRequest { message, details } => (message, details),
            ApiError::Storage(e) => ("Storage error".to_string(), Some(Value::String(e.to_string()))),
            ApiError::Pipeline(PipelineError::Storage(e)) => {
                ("Storage error".to_string(), Some(Value::String(e.to_string())))
            }
            other => (other.to_string(), None),
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}
