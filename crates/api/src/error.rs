//! API errors and their mapping into each backend's error type

use freetag_donation::GatewayError;
use freetag_rates::RateError;
use freetag_session::SessionError;
use thiserror::Error;

/// Errors from HTTP calls
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP client setup failed: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Request to {path} failed: {reason}")]
    Transport { path: String, reason: String },

    #[error("{path} answered HTTP {status}")]
    Status {
        path: String,
        status: u16,
        /// `error` field of the response body, if any
        message: Option<String>,
    },

    #[error("Invalid response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// Result type for API calls
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub(crate) fn transport(path: &str, e: reqwest::Error) -> Self {
        let reason = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        };
        ApiError::Transport {
            path: path.to_string(),
            reason,
        }
    }

    pub(crate) fn decode(path: &str, reason: impl std::fmt::Display) -> Self {
        ApiError::Decode {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn into_rate_error(self, target: &str) -> RateError {
        RateError::fetch_failed(target, self.to_string())
    }
}

impl From<ApiError> for GatewayError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Status {
                status, message, ..
            } => GatewayError::rejected(status, message),
            ApiError::Decode { .. } => GatewayError::InvalidResponse(e.to_string()),
            other => GatewayError::Network(other.to_string()),
        }
    }
}

impl From<ApiError> for SessionError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Decode { path, reason } => SessionError::InvalidPayload {
                endpoint: path,
                reason,
            },
            other => SessionError::Transport(other.to_string()),
        }
    }
}
