//! Error types for Strapi operations.
//!
//! This module provides the single error type shared by every crate in the workspace,
//! including the mapping of failed HTTP responses and the CMS JSON error body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Strapi operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The API answered with a non-success status code
    #[error("API request failed: {status} {status_text}")]
    ApiRequest {
        /// Numeric HTTP status code
        status: u16,
        /// Canonical reason phrase for the status code
        status_text: String,
        /// Error body returned by the CMS, when it could be decoded
        detail: Option<ApiErrorDetail>,
    },

    /// DNS, connection or TLS failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Response body could not be decoded into the requested type
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A filter or populate value could not be serialized to JSON
    #[error("Failed to encode query value: {0}")]
    Encoding(String),

    /// Endpoint path could not be resolved against the base URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Malformed request or query string
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for Strapi operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error object returned by the CMS alongside a failed response.
///
/// The CMS wraps it as `{"data": null, "error": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorDetail {
    /// Status echoed by the CMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Error class name (e.g. `NotFoundError`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-readable error message
    #[serde(default)]
    pub message: String,
    /// Additional error details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorDetail,
}

impl ApiErrorDetail {
    /// Decode the error object from a raw response body.
    ///
    /// Returns `None` when the body is not a CMS error envelope.
    #[must_use]
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error)
    }
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ApiRequest { .. } => "API_REQUEST_FAILED",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Encoding(_) => "ENCODING_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// HTTP status of a failed API request, if this error carries one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ApiRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the API reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiRequest { status: 404, .. })
    }

    /// Returns true if the request never reached a response.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// CMS error body attached to a failed API request.
    #[must_use]
    pub fn detail(&self) -> Option<&ApiErrorDetail> {
        match self {
            Self::ApiRequest { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
