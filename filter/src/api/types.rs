//! Shared API types
//!
//! Maps filter errors onto the HTTP error envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::filters::{ErrorKind, FilterError};

/// Standard API error response
#[derive(Debug, PartialEq)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    Cancelled { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => ErrorKind::BadInput.status_code(),
            Self::Cancelled { .. } => ErrorKind::Cancelled.status_code(),
            Self::Internal { .. } => ErrorKind::Internal.status_code(),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::BadInput => Self::bad_request("INVALID_FILTER", message),
            ErrorKind::NotFound => Self::bad_request("PROPERTY_NOT_FOUND", message),
            ErrorKind::UnsupportedForType => Self::bad_request("UNSUPPORTED_CONDITION", message),
            ErrorKind::InvalidValue => Self::bad_request("INVALID_FILTER_VALUE", message),
            ErrorKind::Cancelled => Self::Cancelled { message },
            ErrorKind::Internal => {
                tracing::error!(error = %message, "Filter compilation failed");
                Self::internal("Filter compilation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_type, code, message) = match self {
            Self::BadRequest { code, message } => ("bad_request", code, message),
            Self::Cancelled { message } => ("cancelled", "REQUEST_CANCELLED".to_string(), message),
            Self::Internal { message } => ("internal_error", "INTERNAL".to_string(), message),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
