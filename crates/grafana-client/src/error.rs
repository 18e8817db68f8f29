//! Error types for Grafana API operations

use thiserror::Error;

/// Grafana client errors.
#[derive(Debug, Error)]
pub enum GrafanaError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The requested resource does not exist (HTTP 404).
    #[error("{resource} not found")]
    NotFound {
        /// Resource that was looked up.
        resource: String,
    },

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Client configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for Grafana API operations.
pub type GrafanaResult<T> = Result<T, GrafanaError>;

impl GrafanaError {
    /// Whether the error means the resource does not exist.
    ///
    /// This is the only classifier for the expected "not found" signal that
    /// drives create-on-missing and delete-tolerates-missing paths.
    pub fn is_not_found(&self) -> bool {
        match self {
            GrafanaError::NotFound { .. } => true,
            GrafanaError::ApiError { status, .. } => *status == 404,
            GrafanaError::RequestFailed(err) => {
                err.status() == Some(reqwest::StatusCode::NOT_FOUND)
            }
            _ => false,
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GrafanaError::NotFound { .. } => Some(404),
            GrafanaError::ApiError { status, .. } => Some(*status),
            GrafanaError::AuthenticationFailed => Some(401),
            GrafanaError::RequestFailed(err) => err.status().map(|s| s.as_u16()),
            GrafanaError::InvalidResponse(_) | GrafanaError::Config(_) => None,
        }
    }
}
