use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Generic message returned to clients for any server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "An internal error occurred during prediction. Please try again.";

#[derive(Debug, Error)]
pub enum AtopixError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    CacheMiss(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AtopixError>;

/// Error category reported to clients in the `error_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    CacheError,
    ServerError,
}

impl AtopixError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::CacheMiss(_) => ErrorKind::CacheError,
            Self::Io(_) | Self::Internal(_) => ErrorKind::ServerError,
        }
    }
}

/// Transport-level error rendered as the tagged JSON failure payload.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    CacheMiss(String),

    /// Full detail stays in the server log; clients get a generic message.
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    error_type: ErrorKind,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::CacheMiss(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::PayloadTooLarge(_) => ErrorKind::ValidationError,
            Self::CacheMiss(_) => ErrorKind::CacheError,
            Self::Internal(_) => ErrorKind::ServerError,
        }
    }

    /// Message safe to show to the client.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::PayloadTooLarge(msg) | Self::CacheMiss(msg) => msg,
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl From<AtopixError> for ApiError {
    fn from(err: AtopixError) -> Self {
        match err {
            AtopixError::Validation(msg) => Self::Validation(msg),
            AtopixError::CacheMiss(msg) => Self::CacheMiss(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(detail) => tracing::error!(error = %detail, "request failed"),
            other => tracing::debug!(error = %other, error_type = ?other.kind(), "request rejected"),
        }

        let body = ErrorBody {
            success: false,
            error: self.public_message(),
            error_type: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}
