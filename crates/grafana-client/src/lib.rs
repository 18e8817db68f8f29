//! # Grafana Client
//!
//! This crate provides the Grafana API capability used by the convergence
//! engine, and an HTTP implementation of it.
//!
//! ## Overview
//!
//! The grafana-client crate handles:
//! - **API**: The [`GrafanaApi`] trait covering organizations, folders,
//!   dashboards, datasources and SSO settings
//! - **Wire models**: Request and response bodies of the Grafana HTTP API
//! - **Errors**: [`GrafanaError`] with a single not-found classifier
//! - **Configuration**: [`GrafanaConfig`] loaded from the environment
//! - **HTTP**: [`GrafanaHttpClient`], a reqwest implementation
//!
//! ## Organization scoping
//!
//! Grafana selects the organization a request operates on through the
//! `X-Grafana-Org-Id` header. Handles carry their own organization id and
//! [`GrafanaApi::with_org_id`] returns a new handle, so one client can serve
//! several organizations concurrently.
//!
//! ```rust,no_run
//! use grafana_client::{GrafanaApi, GrafanaConfig, GrafanaHttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GrafanaHttpClient::new(GrafanaConfig::from_env())?;
//! let scoped = client.with_org_id(4);
//!
//! for folder in scoped.list_folders(None).await? {
//!     println!("{} {}", folder.uid, folder.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod http;

// Re-export main types for convenience
pub use api::{
    CreateFolderCommand, DashboardRecord, DescendantCounts, FolderRecord, GrafanaApi, OrgRecord,
    SaveDashboardCommand, SaveDashboardResponse, SsoSettings, UpdateFolderCommand,
};
pub use config::{ConfigError, GrafanaConfig};
pub use error::{GrafanaError, GrafanaResult};
pub use http::{GrafanaHttpClient, FOLDER_PAGE_SIZE, ORG_ID_HEADER};
