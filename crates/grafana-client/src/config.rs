//! Grafana client configuration.
//!
//! Provides the endpoint, credentials and timeout settings for the Grafana
//! API. Configuration is loaded from environment variables with defaults
//! matching an in-cluster Grafana deployment.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Reasons a [`GrafanaConfig`] cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a service account token nor a complete admin login is set.
    #[error("no Grafana credentials: set an API token or both admin user and password")]
    MissingCredentials,

    /// A setting holds an unusable value.
    #[error("invalid {key}: {message}")]
    InvalidValue {
        /// Environment variable backing the setting.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Grafana API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrafanaConfig {
    /// Base URL of the Grafana server (e.g., "http://grafana.monitoring.svc.cluster.local").
    pub base_url: String,

    /// Admin user for basic authentication.
    pub username: Option<String>,

    /// Admin password for basic authentication.
    pub password: Option<String>,

    /// Service account token, used instead of basic authentication when set.
    pub api_token: Option<String>,

    /// Organization targeted by requests that are not explicitly scoped.
    ///
    /// Pinning the first organization overrides the server-side user context,
    /// which is required to operate on organizations other than the user's own.
    pub org_id: i64,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Whether to verify TLS certificates (disable only for testing).
    pub verify_tls: bool,
}

impl Default for GrafanaConfig {
    /// Returns default configuration for an in-cluster Grafana.
    fn default() -> Self {
        Self {
            base_url: "http://grafana.monitoring.svc.cluster.local".to_string(),
            username: None,
            password: None,
            api_token: None,
            org_id: 1,
            timeout_secs: 30,
            verify_tls: true,
        }
    }
}

impl GrafanaConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GRAFANA_URL`: Grafana base URL (default: http://grafana.monitoring.svc.cluster.local)
    /// - `GRAFANA_ADMIN_USER`: Admin user for basic auth
    /// - `GRAFANA_ADMIN_PASSWORD`: Admin password for basic auth
    /// - `GRAFANA_API_TOKEN`: Service account token
    /// - `GRAFANA_ORG_ID`: Default organization id (default: 1)
    /// - `GRAFANA_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `GRAFANA_VERIFY_TLS`: Whether to verify TLS (default: true)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            base_url: std::env::var("GRAFANA_URL").unwrap_or(default.base_url),
            username: std::env::var("GRAFANA_ADMIN_USER").ok(),
            password: std::env::var("GRAFANA_ADMIN_PASSWORD").ok(),
            api_token: std::env::var("GRAFANA_API_TOKEN").ok(),
            org_id: std::env::var("GRAFANA_ORG_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.org_id),
            timeout_secs: std::env::var("GRAFANA_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            verify_tls: std::env::var("GRAFANA_VERIFY_TLS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.verify_tls),
        }
    }

    /// Configuration with basic-auth credentials.
    pub fn with_basic_auth(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: Some(username.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Validate that the configuration can reach and authenticate to Grafana.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "GRAFANA_URL",
                message: format!("{:?} is not an http(s) URL", self.base_url),
            });
        }
        if self.org_id <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "GRAFANA_ORG_ID",
                message: "must be a positive organization id".to_string(),
            });
        }

        let has_basic_auth = self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self.password.as_deref().is_some_and(|p| !p.is_empty());
        let has_token = self.api_token.as_deref().is_some_and(|t| !t.is_empty());
        if !has_basic_auth && !has_token {
            return Err(ConfigError::MissingCredentials);
        }

        Ok(())
    }
}
