//! Organization convergence.
//!
//! Organizations are matched by id first and by name as a fallback. The name
//! lookup lets a lost id be recovered from Grafana instead of creating a
//! duplicate organization.

use grafana_client::GrafanaApi;
use grafana_domain::Organization;
use tracing::{debug, info, instrument};

use crate::error::{SyncError, SyncResult};

/// Upserts and deletes Grafana organizations.
pub struct OrganizationSync<'a, C> {
    client: &'a C,
}

impl<'a, C: GrafanaApi> OrganizationSync<'a, C> {
    /// Create an organization sync bound to a client handle.
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Creates or renames the organization so Grafana matches `org`.
    ///
    /// On success `org.id` holds the Grafana id, which the caller persists.
    #[instrument(skip(self, org), fields(org_id = org.id, org_name = %org.name))]
    pub async fn upsert(&self, org: &mut Organization) -> SyncResult<()> {
        if org.is_created() {
            match self.client.get_org_by_id(org.id).await {
                Ok(existing) if existing.name == org.name => {
                    debug!("organization up to date");
                    return Ok(());
                }
                Ok(existing) => {
                    info!(old_name = %existing.name, "renaming organization");
                    return self
                        .client
                        .update_org(org.id, &org.name)
                        .await
                        .map_err(|e| SyncError::api("update", "organization", &org.name, e));
                }
                Err(err) if err.is_not_found() => {
                    debug!("organization id not found, looking up by name");
                }
                Err(err) => {
                    return Err(SyncError::api("get", "organization", org.id.to_string(), err))
                }
            }
        }

        match self.client.get_org_by_name(&org.name).await {
            Ok(existing) => {
                info!(adopted_id = existing.id, "adopting existing organization");
                org.id = existing.id;
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                info!("creating organization");
                org.id = self
                    .client
                    .create_org(&org.name)
                    .await
                    .map_err(|e| SyncError::api("create", "organization", &org.name, e))?;
                info!(org_id = org.id, "created organization");
                Ok(())
            }
            Err(err) => Err(SyncError::api("get", "organization", &org.name, err)),
        }
    }

    /// Deletes the organization. Never-created and already deleted
    /// organizations are not an error.
    #[instrument(skip(self, org), fields(org_id = org.id, org_name = %org.name))]
    pub async fn delete(&self, org: &Organization) -> SyncResult<()> {
        if !org.is_created() {
            debug!("organization was never created, nothing to delete");
            return Ok(());
        }

        info!("deleting organization");
        match self.client.delete_org(org.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!("organization already deleted");
                Ok(())
            }
            Err(err) => Err(SyncError::api("delete", "organization", &org.name, err)),
        }
    }

    /// Resolves an organization by name.
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> SyncResult<Organization> {
        match self.client.get_org_by_name(name).await {
            Ok(record) => Ok(Organization::from_grafana(record.id, record.name)),
            Err(err) if err.is_not_found() => Err(SyncError::OrganizationNotFound {
                name: name.to_string(),
            }),
            Err(err) => Err(SyncError::api("get", "organization", name, err)),
        }
    }
}
