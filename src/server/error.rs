//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": "<message>"}` with a status
//! chosen by kind.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::pipeline::{CaptureError, Stage};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or empty request data (400).
    #[error("{0}")]
    BadRequest(String),
    /// The session is not in a state that allows the request (409).
    #[error("{0}")]
    Conflict(String),
    /// Nothing to return (404).
    #[error("{0}")]
    NotFound(String),
    /// Upload is neither audio nor a multipart form (415).
    #[error("{0}")]
    UnsupportedMediaType(String),
    /// Upload exceeds `server.max_body_bytes` (413).
    #[error("{0}")]
    TooLarge(String),
    /// A remote stage failed (502).
    #[error("{0}")]
    Upstream(String),
    /// The server itself failed (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a gateway failure, prefixing upstream errors with the stage's
    /// user-visible label.
    pub fn stage(stage: Stage, error: GatewayError) -> Self {
        match error {
            GatewayError::InvalidInput(msg) => ApiError::BadRequest(msg),
            GatewayError::Upstream(msg) => {
                ApiError::Upstream(format!("{}: {msg}", stage.failure_label()))
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CaptureError> for ApiError {
    fn from(e: CaptureError) -> Self {
        ApiError::Conflict(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(e.body_text())
        } else {
            ApiError::BadRequest(e.body_text())
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::warn!("api: {status}: {self}");
        } else {
            log::debug!("api: {status}: {self}");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
