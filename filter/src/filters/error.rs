//! Filter pipeline errors
//!
//! Every stage fails with a [`FilterError`]. The kind of an error decides the
//! HTTP status at the boundary; the message carries the offending property
//! key and condition so callers can act on it.

use axum::http::StatusCode;
use thiserror::Error;

use crate::data::{PropertyError, PropertyFormat};

use super::types::InternalCondition;

/// Error raised while parsing, validating or emitting a filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Malformed input: bad key syntax, unknown token, undecodable value
    #[error("{0}")]
    BadInput(String),

    /// Property key resolves to nothing in the snapshot
    #[error("property {key:?} not found")]
    NotFound { key: String },

    /// Condition is not legal for the property's format
    #[error(
        "condition {condition} is not supported for property {key:?} of format {format}"
    )]
    UnsupportedForType {
        key: String,
        condition: InternalCondition,
        format: PropertyFormat,
    },

    /// Value failed sanitization
    #[error("invalid value for property {key:?}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error classification, independent of the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    NotFound,
    UnsupportedForType,
    InvalidValue,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadInput => "bad_input",
            Self::NotFound => "not_found",
            Self::UnsupportedForType => "unsupported_for_type",
            Self::InvalidValue => "invalid_value",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }

    /// HTTP status used at the API boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadInput | Self::NotFound | Self::UnsupportedForType | Self::InvalidValue => {
                StatusCode::BAD_REQUEST
            }
            // 499 Client Closed Request
            Self::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT)
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl FilterError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInput(message.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadInput(_) => ErrorKind::BadInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UnsupportedForType { .. } => ErrorKind::UnsupportedForType,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Attach a property key to an error from the property service
    pub fn from_property(key: &str, err: PropertyError) -> Self {
        match err {
            PropertyError::InvalidValue(reason) => Self::invalid_value(key, reason),
            PropertyError::Cancelled => Self::Cancelled,
            PropertyError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<PropertyError> for FilterError {
    fn from(err: PropertyError) -> Self {
        Self::from_property("", err)
    }
}
