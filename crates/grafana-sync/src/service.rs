//! Grafana service facade.
//!
//! Entry points used by the reconcilers. Each method converges one concern
//! and returns what the caller needs to report in its status.

use grafana_client::GrafanaApi;
use grafana_domain::{Dashboard, Datasource, Organization};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument};

use crate::config::SyncConfig;
use crate::dashboards::DashboardPublisher;
use crate::datasources::DatasourceGenerator;
use crate::error::{SyncError, SyncResult};
use crate::folders::FolderHierarchy;
use crate::org_context::within_organization;
use crate::organization::OrganizationSync;
use crate::sso::SsoSettingsGenerator;

/// A configured datasource as reported in an organization's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceStatus {
    /// Grafana id.
    pub id: i64,

    /// Display name.
    pub name: String,
}

impl From<&Datasource> for DatasourceStatus {
    fn from(datasource: &Datasource) -> Self {
        Self {
            id: datasource.id,
            name: datasource.name.clone(),
        }
    }
}

/// Converges Grafana to the desired organizations and dashboards.
#[derive(Debug, Clone)]
pub struct GrafanaService<C> {
    client: C,
    config: SyncConfig,
}

impl<C: GrafanaApi> GrafanaService<C> {
    /// Create a new service.
    pub fn new(client: C, config: SyncConfig) -> Self {
        Self { client, config }
    }

    /// The client used for unscoped calls.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Service configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Creates or renames the organization and returns its Grafana id.
    ///
    /// `org.id` is updated in place as well.
    pub async fn configure_organization(&self, org: &mut Organization) -> SyncResult<i64> {
        OrganizationSync::new(&self.client).upsert(org).await?;
        Ok(org.id)
    }

    /// Configures the organization's datasources and the SSO org mapping.
    ///
    /// `organizations` is the full list of organizations that should be
    /// reachable through SSO. Both steps run even if the first fails; their
    /// errors are joined.
    #[instrument(skip(self, org, organizations), fields(org_id = org.id, org_name = %org.name))]
    pub async fn setup_organization(
        &self,
        org: &Organization,
        organizations: &[Organization],
    ) -> SyncResult<Vec<DatasourceStatus>> {
        let mut errors = Vec::new();

        let statuses = match self.configure_datasources(org).await {
            Ok(statuses) => statuses,
            Err(err) => {
                errors.push(err);
                Vec::new()
            }
        };

        if let Err(err) = self.configure_sso(organizations).await {
            errors.push(err);
        }

        SyncError::join(errors)?;
        Ok(statuses)
    }

    /// Converges the organization's datasources.
    ///
    /// Returns the configured datasources sorted by id.
    pub async fn configure_datasources(&self, org: &Organization) -> SyncResult<Vec<DatasourceStatus>> {
        let datasources = DatasourceGenerator::new(&self.client, &self.config)
            .configure(org)
            .await?;

        let mut statuses: Vec<DatasourceStatus> =
            datasources.iter().map(DatasourceStatus::from).collect();
        statuses.sort_by_key(|status| status.id);

        info!(count = statuses.len(), "configured datasources");
        Ok(statuses)
    }

    /// Deletes the organization if it was ever created.
    pub async fn delete_organization(&self, org: &Organization) -> SyncResult<()> {
        OrganizationSync::new(&self.client).delete(org).await
    }

    /// Publishes a dashboard.
    pub async fn configure_dashboard(&self, dashboard: &Dashboard) -> SyncResult<()> {
        DashboardPublisher::new(&self.client).publish(dashboard).await
    }

    /// Deletes a dashboard.
    pub async fn delete_dashboard(&self, dashboard: &Dashboard) -> SyncResult<()> {
        DashboardPublisher::new(&self.client).delete(dashboard).await
    }

    /// Removes the organization's managed folders that no dashboard needs.
    ///
    /// `required_uids` must hold every folder still in use, ancestors
    /// included; see [`required_folder_uids`](crate::folders::required_folder_uids).
    pub async fn cleanup_orphaned_folders_for_org(
        &self,
        org: &Organization,
        required_uids: &HashSet<String>,
    ) -> SyncResult<()> {
        within_organization(&self.client, org, |client| async move {
            FolderHierarchy::new(&client).cleanup(required_uids).await
        })
        .await
    }

    /// Writes the SSO org mapping for all organizations.
    pub async fn configure_sso(&self, organizations: &[Organization]) -> SyncResult<()> {
        SsoSettingsGenerator::new(&self.client, &self.config)
            .configure(organizations)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasource_status_from_datasource() {
        let datasource = Datasource {
            id: 7,
            ..Datasource::new("gs-loki", "Loki")
        };

        assert_eq!(
            DatasourceStatus::from(&datasource),
            DatasourceStatus {
                id: 7,
                name: "Loki".to_string()
            }
        );
    }
}
