//! The Grafana API capability.
//!
//! [`GrafanaApi`] is the seam between the convergence engine and Grafana. It
//! covers organizations, folders, dashboards, datasources and SSO settings,
//! plus the organization selector. Selection is value based: `with_org_id`
//! hands out a new handle scoped to another organization and leaves the
//! receiver untouched, so handles can be shared freely across tasks.

use async_trait::async_trait;
use grafana_domain::Datasource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::GrafanaResult;

/// A Grafana organization as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRecord {
    /// Organization id.
    pub id: i64,

    /// Organization name.
    pub name: String,
}

/// A Grafana folder as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    /// Folder UID.
    pub uid: String,

    /// Display title.
    pub title: String,

    /// UID of the parent folder, absent for root folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<String>,
}

/// Body of a folder creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderCommand {
    /// Folder UID chosen by the caller.
    pub uid: String,

    /// Display title.
    pub title: String,

    /// Parent folder UID, omitted for root folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<String>,

    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Body of a folder update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFolderCommand {
    /// New title.
    pub title: String,

    /// Skip the version check.
    pub overwrite: bool,
}

/// Number of items of each kind stored below a folder.
pub type DescendantCounts = BTreeMap<String, i64>;

/// A dashboard as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRecord {
    /// Dashboard model.
    pub dashboard: Value,

    /// Grafana metadata (folder, version, ...).
    #[serde(default)]
    pub meta: Value,
}

/// Body of a dashboard save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDashboardCommand {
    /// Dashboard model, keyed by its `uid`.
    pub dashboard: Map<String, Value>,

    /// Target folder UID, omitted for the General folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,

    /// Replace any existing dashboard with the same uid.
    pub overwrite: bool,
}

/// Response of a dashboard save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDashboardResponse {
    /// Dashboard id.
    #[serde(default)]
    pub id: i64,

    /// Dashboard UID.
    #[serde(default)]
    pub uid: String,

    /// Dashboard version after the save.
    #[serde(default)]
    pub version: i64,
}

/// SSO settings of one authentication provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsoSettings {
    /// Settings id.
    #[serde(default)]
    pub id: String,

    /// Provider name (generic_oauth, jwt, ...).
    pub provider: String,

    /// Provider settings, including `org_mapping`.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// Grafana API operations used by the convergence engine.
#[async_trait]
pub trait GrafanaApi: Send + Sync {
    /// Organization targeted by this handle.
    fn org_id(&self) -> i64;

    /// A new handle targeting the given organization.
    fn with_org_id(&self, org_id: i64) -> Self
    where
        Self: Sized;

    // Organizations

    /// Get an organization by id.
    async fn get_org_by_id(&self, org_id: i64) -> GrafanaResult<OrgRecord>;

    /// Get an organization by name.
    async fn get_org_by_name(&self, name: &str) -> GrafanaResult<OrgRecord>;

    /// Create an organization and return its id.
    async fn create_org(&self, name: &str) -> GrafanaResult<i64>;

    /// Rename an organization.
    async fn update_org(&self, org_id: i64, name: &str) -> GrafanaResult<()>;

    /// Delete an organization.
    async fn delete_org(&self, org_id: i64) -> GrafanaResult<()>;

    // Folders

    /// Get a folder by UID.
    async fn get_folder(&self, uid: &str) -> GrafanaResult<FolderRecord>;

    /// Create a folder.
    async fn create_folder(&self, command: &CreateFolderCommand) -> GrafanaResult<FolderRecord>;

    /// Update a folder.
    async fn update_folder(
        &self,
        uid: &str,
        command: &UpdateFolderCommand,
    ) -> GrafanaResult<FolderRecord>;

    /// Delete a folder.
    async fn delete_folder(&self, uid: &str) -> GrafanaResult<()>;

    /// List the folders directly below `parent_uid`, or the root folders.
    async fn list_folders(&self, parent_uid: Option<&str>) -> GrafanaResult<Vec<FolderRecord>>;

    /// Count the items stored below a folder, by kind.
    async fn folder_descendant_counts(&self, uid: &str) -> GrafanaResult<DescendantCounts>;

    // Dashboards

    /// Get a dashboard by UID.
    async fn get_dashboard(&self, uid: &str) -> GrafanaResult<DashboardRecord>;

    /// Create or update a dashboard.
    async fn post_dashboard(
        &self,
        command: &SaveDashboardCommand,
    ) -> GrafanaResult<SaveDashboardResponse>;

    /// Delete a dashboard by UID.
    async fn delete_dashboard(&self, uid: &str) -> GrafanaResult<()>;

    // Datasources

    /// List the datasources of the organization.
    async fn list_datasources(&self) -> GrafanaResult<Vec<Datasource>>;

    /// Create a datasource and return its id.
    async fn add_datasource(&self, datasource: &Datasource) -> GrafanaResult<i64>;

    /// Update the datasource with the given UID and return its id.
    async fn update_datasource(&self, uid: &str, datasource: &Datasource) -> GrafanaResult<i64>;

    /// Delete a datasource by UID.
    async fn delete_datasource(&self, uid: &str) -> GrafanaResult<()>;

    // SSO settings

    /// Get the settings of an SSO provider.
    async fn get_sso_settings(&self, provider: &str) -> GrafanaResult<SsoSettings>;

    /// Replace the settings of an SSO provider.
    async fn update_sso_settings(&self, provider: &str, settings: &SsoSettings) -> GrafanaResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_folder_command_omits_root_parent() {
        let command = CreateFolderCommand {
            uid: "gs-abc".to_string(),
            title: "team-a".to_string(),
            parent_uid: None,
            description: "managed".to_string(),
        };
        let value = serde_json::to_value(&command).unwrap();
        assert!(value.get("parentUid").is_none());

        let nested = CreateFolderCommand {
            parent_uid: Some("gs-root".to_string()),
            ..command
        };
        assert_eq!(serde_json::to_value(&nested).unwrap()["parentUid"], json!("gs-root"));
    }

    #[test]
    fn test_save_dashboard_command_wire_format() {
        let mut dashboard = Map::new();
        dashboard.insert("uid".to_string(), json!("abc"));
        let command = SaveDashboardCommand {
            dashboard,
            folder_uid: Some("gs-folder".to_string()),
            overwrite: true,
        };

        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["folderUid"], json!("gs-folder"));
        assert_eq!(value["overwrite"], json!(true));
        assert_eq!(value["dashboard"]["uid"], json!("abc"));
    }

    #[test]
    fn test_folder_record_reads_parent() {
        let record: FolderRecord = serde_json::from_value(json!({
            "id": 4,
            "uid": "gs-leaf",
            "title": "networking",
            "parentUid": "gs-root"
        }))
        .unwrap();
        assert_eq!(record.parent_uid.as_deref(), Some("gs-root"));
    }
}
