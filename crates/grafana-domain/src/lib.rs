//! # Grafana Domain Model
//!
//! This crate provides the domain model shared by the Grafana convergence
//! engine. It performs no I/O: everything here is a pure function of its
//! inputs, which keeps identity derivation and validation testable in
//! isolation from the Grafana API.
//!
//! ## Overview
//!
//! The grafana-domain crate handles:
//! - **Organizations**: Grafana tenant boundaries with their tenants and role mappings
//! - **Folders**: Path parsing, validation and deterministic UID derivation
//! - **Dashboards**: Validation, parsing at the mapping boundary and managed-tag injection
//! - **Datasources**: The canonical datasource record with merge/override support
//!
//! ## Architecture
//!
//! ```text
//! Organization
//!   ├─ Tenants (data | alerting)
//!   ├─ Role attributes (admins / editors / viewers)
//!   ├─ Datasources (generated per organization)
//!   └─ Dashboards
//!         └─ Folder path ─→ Folder hierarchy (uid = hash of path)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use grafana_domain::{folder, Dashboard};
//! use serde_json::json;
//!
//! let folders = folder::parse_path("team-a/networking");
//! assert_eq!(folders.len(), 2);
//! assert_eq!(folders[1].parent_uid(), folders[0].uid());
//!
//! let dashboard = Dashboard::new("Test Org", "team-a/networking", json!({"uid": "abc"}));
//! assert!(dashboard.validate().is_empty());
//! ```

pub mod dashboard;
pub mod datasource;
pub mod folder;
pub mod organization;

// Re-export main types for convenience
pub use dashboard::{inject_managed_tag, Dashboard, DashboardError, ParsedDashboard, MANAGED_DASHBOARD_TAG};
pub use datasource::{Datasource, DATASOURCE_UID_PREFIX};
pub use folder::{Folder, FolderPathError};
pub use organization::{Organization, Tenant, TenantType, SHARED_ORG_NAME};
