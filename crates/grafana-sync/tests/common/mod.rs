//! Shared fixture for the convergence tests.

#![allow(dead_code)]

use grafana_client::{GrafanaConfig, GrafanaHttpClient};
use grafana_sync::{GrafanaService, SyncConfig};
use serde_json::Value;
use wiremock::{Match, MockServer, Request};

/// Test fixture providing a mock Grafana server.
pub struct TestFixture {
    /// Mock Grafana server.
    pub server: MockServer,
    /// Engine configuration.
    pub config: SyncConfig,
}

impl TestFixture {
    /// Create a new test fixture with a mock server.
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            config: SyncConfig::default(),
        }
    }

    /// Get a Grafana client configured for the mock server.
    pub fn client(&self) -> GrafanaHttpClient {
        let config = GrafanaConfig {
            timeout_secs: 5,
            verify_tls: false,
            ..GrafanaConfig::with_basic_auth(self.server.uri(), "admin", "secret")
        };
        GrafanaHttpClient::new(config).unwrap()
    }

    /// Get a service configured for the mock server.
    pub fn service(&self) -> GrafanaService<GrafanaHttpClient> {
        GrafanaService::new(self.client(), self.config.clone())
    }

    /// JSON bodies of the received requests matching a method and path.
    pub async fn bodies(&self, method: &str, path: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.to_string() == method && r.url.path() == path)
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    /// Paths of the received requests with the given method, in order.
    pub async fn paths(&self, method: &str) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.to_string() == method)
            .map(|r| r.url.path().to_string())
            .collect()
    }
}

/// Matches requests without the given query parameter.
pub struct MissingQueryParam(pub &'static str);

impl Match for MissingQueryParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

/// Matches requests carrying the given query parameter.
pub struct HasQueryParam(pub &'static str);

impl Match for HasQueryParam {
    fn matches(&self, request: &Request) -> bool {
        request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}
