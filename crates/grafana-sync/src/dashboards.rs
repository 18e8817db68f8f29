//! Dashboard publication.
//!
//! Dashboards are validated, placed in their folder hierarchy, tagged as
//! managed and posted with overwrite semantics, all inside the scope of the
//! organization they belong to.

use grafana_client::{GrafanaApi, SaveDashboardCommand};
use grafana_domain::Dashboard;
use tracing::{info, instrument};

use crate::error::{SyncError, SyncResult};
use crate::folders::FolderHierarchy;
use crate::org_context::within_organization;
use crate::organization::OrganizationSync;

/// Validates a dashboard, reporting every problem at once.
pub fn validate(dashboard: &Dashboard) -> SyncResult<()> {
    let errors = dashboard.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SyncError::InvalidDashboard(errors))
    }
}

/// Publishes and deletes dashboards.
pub struct DashboardPublisher<'a, C> {
    client: &'a C,
}

impl<'a, C: GrafanaApi> DashboardPublisher<'a, C> {
    /// Create a dashboard publisher bound to a client handle.
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Creates or overwrites the dashboard in its organization and folder.
    #[instrument(
        skip(self, dashboard),
        fields(uid = dashboard.uid(), organization = dashboard.organization(), folder_path = dashboard.folder_path())
    )]
    pub async fn publish(&self, dashboard: &Dashboard) -> SyncResult<()> {
        validate(dashboard)?;

        let org = OrganizationSync::new(self.client)
            .find_by_name(dashboard.organization())
            .await?;

        within_organization(self.client, &org, |client| async move {
            let folder_uid = FolderHierarchy::new(&client)
                .ensure_hierarchy(dashboard.folder_path())
                .await?;

            let command = SaveDashboardCommand {
                dashboard: dashboard.publishable_content()?,
                folder_uid,
                overwrite: true,
            };

            let saved = client
                .post_dashboard(&command)
                .await
                .map_err(|e| SyncError::api("publish", "dashboard", dashboard.uid(), e))?;

            info!(version = saved.version, "published dashboard");
            Ok::<_, SyncError>(())
        })
        .await
    }

    /// Deletes the dashboard from its organization. The dashboard must exist.
    #[instrument(
        skip(self, dashboard),
        fields(uid = dashboard.uid(), organization = dashboard.organization())
    )]
    pub async fn delete(&self, dashboard: &Dashboard) -> SyncResult<()> {
        let org = OrganizationSync::new(self.client)
            .find_by_name(dashboard.organization())
            .await?;

        within_organization(self.client, &org, |client| async move {
            client
                .get_dashboard(dashboard.uid())
                .await
                .map_err(|e| SyncError::api("get", "dashboard", dashboard.uid(), e))?;

            client
                .delete_dashboard(dashboard.uid())
                .await
                .map_err(|e| SyncError::api("delete", "dashboard", dashboard.uid(), e))?;

            info!("deleted dashboard");
            Ok::<_, SyncError>(())
        })
        .await
    }
}
