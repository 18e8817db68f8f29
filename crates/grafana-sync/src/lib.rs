//! # Grafana Sync
//!
//! This crate converges a Grafana instance to a desired state: organizations,
//! folder hierarchies, dashboards, per-tenant datasources and the SSO org
//! mapping.
//!
//! ## Overview
//!
//! The grafana-sync crate handles:
//! - **Organizations**: Upsert by id with name-based adoption, tolerant delete
//! - **Folders**: Path-derived hierarchies and orphan cleanup
//! - **Dashboards**: Validation, placement, managed tagging and publication
//! - **Datasources**: Per-organization generation and two-pass reconciliation
//! - **SSO**: One org mapping expression for all organizations
//!
//! ## Organization scope
//!
//! Folder, dashboard and datasource calls run inside
//! [`within_organization`](org_context::within_organization), which hands out
//! a client handle bound to one organization. Handles are values, so
//! concurrent reconciles of different organizations never see each other's
//! selection.
//!
//! ## Failure policy
//!
//! Not-found answers drive create-on-missing and delete-tolerates-missing
//! paths and are never reported. Other API failures are wrapped with the
//! operation and resource and returned. Nothing is retried here; callers
//! requeue.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use grafana_client::{GrafanaConfig, GrafanaHttpClient};
//! use grafana_domain::{Dashboard, Organization, Tenant};
//! use grafana_sync::{GrafanaService, SyncConfig};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GrafanaHttpClient::new(GrafanaConfig::from_env())?;
//! let service = GrafanaService::new(client, SyncConfig::from_env());
//!
//! let mut org = Organization::new("Test Org").with_tenants(vec![Tenant::data("test")]);
//! service.configure_organization(&mut org).await?;
//! service.setup_organization(&org, &[org.clone()]).await?;
//!
//! let dashboard = Dashboard::new("Test Org", "team-a/networking", json!({"uid": "abc"}));
//! service.configure_dashboard(&dashboard).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dashboards;
pub mod datasources;
pub mod error;
pub mod folders;
pub mod org_context;
pub mod organization;
pub mod service;
pub mod sso;

// Re-export main types for convenience
pub use config::{DatasourceEndpoints, SyncConfig};
pub use dashboards::DashboardPublisher;
pub use datasources::{generate_datasources, DatasourceGenerator};
pub use error::{SyncError, SyncResult};
pub use folders::{required_folder_uids, FolderHierarchy};
pub use org_context::within_organization;
pub use organization::OrganizationSync;
pub use service::{DatasourceStatus, GrafanaService};
pub use sso::{generate_org_mapping, SsoSettingsGenerator};
