//! Convergence engine configuration.
//!
//! Backend endpoints and feature switches that shape the generated
//! datasources and SSO mappings. Defaults target the in-cluster gateways.

use grafana_domain::SHARED_ORG_NAME;
use serde::{Deserialize, Serialize};

/// Backend URLs used by the generated datasources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceEndpoints {
    /// Loki gateway.
    pub loki: String,

    /// Mimir Prometheus-compatible query endpoint.
    pub mimir: String,

    /// Mimir Alertmanager.
    pub mimir_alertmanager: String,

    /// Tempo query frontend.
    pub tempo: String,

    /// Mimir cardinality API.
    pub mimir_cardinality: String,
}

impl Default for DatasourceEndpoints {
    fn default() -> Self {
        Self {
            loki: "http://loki-gateway.loki.svc".to_string(),
            mimir: "http://mimir-gateway.mimir.svc/prometheus".to_string(),
            mimir_alertmanager: "http://mimir-alertmanager.mimir.svc:8080".to_string(),
            tempo: "http://tempo-query-frontend.tempo.svc:3200".to_string(),
            mimir_cardinality: "http://mimir-gateway.mimir.svc:8080/prometheus/api/v1/cardinality/"
                .to_string(),
        }
    }
}

impl DatasourceEndpoints {
    /// Load endpoints from environment variables.
    ///
    /// Environment variables:
    /// - `LOKI_URL`
    /// - `MIMIR_URL`
    /// - `MIMIR_ALERTMANAGER_URL`
    /// - `TEMPO_URL`
    /// - `MIMIR_CARDINALITY_URL`
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            loki: std::env::var("LOKI_URL").unwrap_or(default.loki),
            mimir: std::env::var("MIMIR_URL").unwrap_or(default.mimir),
            mimir_alertmanager: std::env::var("MIMIR_ALERTMANAGER_URL")
                .unwrap_or(default.mimir_alertmanager),
            tempo: std::env::var("TEMPO_URL").unwrap_or(default.tempo),
            mimir_cardinality: std::env::var("MIMIR_CARDINALITY_URL")
                .unwrap_or(default.mimir_cardinality),
        }
    }
}

/// SSO providers that receive the org mapping unless configured otherwise.
pub const DEFAULT_SSO_PROVIDERS: &[&str] = &["generic_oauth", "jwt"];

/// Convergence engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Name of the organization every user is mapped into.
    pub shared_org_name: String,

    /// Whether Tempo is deployed; adds the Tempo datasource and Loki trace links.
    pub tracing_enabled: bool,

    /// SSO providers receiving the org mapping.
    pub sso_providers: Vec<String>,

    /// Backend URLs.
    pub endpoints: DatasourceEndpoints,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            shared_org_name: SHARED_ORG_NAME.to_string(),
            tracing_enabled: false,
            sso_providers: DEFAULT_SSO_PROVIDERS.iter().map(|p| p.to_string()).collect(),
            endpoints: DatasourceEndpoints::default(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GRAFANA_SHARED_ORG_NAME`: Shared organization name (default: Shared Org)
    /// - `TRACING_ENABLED`: Whether Tempo is deployed (default: false)
    /// - `GRAFANA_SSO_PROVIDERS`: Comma separated provider list (default: generic_oauth,jwt)
    /// - the endpoint variables of [`DatasourceEndpoints::from_env`]
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            shared_org_name: std::env::var("GRAFANA_SHARED_ORG_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default.shared_org_name),
            tracing_enabled: std::env::var("TRACING_ENABLED")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(default.tracing_enabled),
            sso_providers: std::env::var("GRAFANA_SSO_PROVIDERS")
                .ok()
                .map(|s| parse_list(&s))
                .filter(|providers| !providers.is_empty())
                .unwrap_or(default.sso_providers),
            endpoints: DatasourceEndpoints::from_env(),
        }
    }

    /// Enable or disable tracing datasources.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing_enabled = enabled;
        self
    }

    /// Replace the SSO provider list.
    pub fn with_sso_providers(mut self, providers: Vec<String>) -> Self {
        self.sso_providers = providers;
        self
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.shared_org_name, "Shared Org");
        assert!(!config.tracing_enabled);
        assert_eq!(config.sso_providers, vec!["generic_oauth", "jwt"]);
        assert_eq!(config.endpoints.loki, "http://loki-gateway.loki.svc");
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("generic_oauth, jwt,,"), vec!["generic_oauth", "jwt"]);
        assert!(parse_list(" , ").is_empty());
    }
}
