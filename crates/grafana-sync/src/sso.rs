//! SSO org mapping.
//!
//! Grafana's OAuth `org_mapping` setting is a single space-separated
//! expression of `"attribute:organization:role"` entries. One malformed entry
//! breaks the whole expression, so the mapping is built and validated in
//! full before any provider is touched.

use grafana_client::GrafanaApi;
use grafana_domain::Organization;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

/// Provider setting holding the mapping expression.
pub const ORG_MAPPING_SETTING: &str = "org_mapping";

/// Grafana organization roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full control of the organization.
    Admin,
    /// Can edit dashboards.
    Editor,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Get the Grafana name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Viewer => "Viewer",
        }
    }
}

/// Builds one quoted mapping entry. Colons in the attribute are escaped.
pub fn mapping_entry(attribute: &str, organization: &str, role: Role) -> String {
    format!(
        "\"{}:{}:{}\"",
        attribute.replace(':', "\\:"),
        organization,
        role.as_str()
    )
}

/// Builds the org mapping expression for all organizations.
///
/// Every user is mapped into the shared organization as admin; each
/// organization then contributes one entry per admin, editor and viewer
/// attribute. An organization without a name or with an empty attribute
/// fails the whole mapping.
pub fn generate_org_mapping(
    shared_org_name: &str,
    organizations: &[Organization],
) -> SyncResult<String> {
    let mut entries = vec![mapping_entry("*", shared_org_name, Role::Admin)];

    for org in organizations {
        if org.name.trim().is_empty() {
            return Err(SyncError::InvalidOrgMapping(format!(
                "organization {} has no name",
                org.id
            )));
        }

        let roles = [
            (Role::Admin, &org.admins),
            (Role::Editor, &org.editors),
            (Role::Viewer, &org.viewers),
        ];

        for (role, attributes) in roles {
            for attribute in attributes {
                if attribute.trim().is_empty() {
                    return Err(SyncError::InvalidOrgMapping(format!(
                        "organization {:?} has an empty {} attribute",
                        org.name,
                        role.as_str().to_lowercase()
                    )));
                }
                entries.push(mapping_entry(attribute, &org.name, role));
            }
        }
    }

    Ok(entries.join(" "))
}

/// Writes the org mapping to the configured SSO providers.
pub struct SsoSettingsGenerator<'a, C> {
    client: &'a C,
    config: &'a SyncConfig,
}

impl<'a, C: GrafanaApi> SsoSettingsGenerator<'a, C> {
    /// Create an SSO settings generator bound to a client handle.
    pub fn new(client: &'a C, config: &'a SyncConfig) -> Self {
        Self { client, config }
    }

    /// Replaces the org mapping of every configured provider.
    ///
    /// Does nothing for an empty organization list. Other provider settings
    /// are preserved.
    #[instrument(skip(self, organizations), fields(organizations = organizations.len()))]
    pub async fn configure(&self, organizations: &[Organization]) -> SyncResult<()> {
        if organizations.is_empty() {
            debug!("no organizations, leaving SSO settings untouched");
            return Ok(());
        }

        let mapping = generate_org_mapping(&self.config.shared_org_name, organizations)?;

        for provider in &self.config.sso_providers {
            let mut settings = self
                .client
                .get_sso_settings(provider)
                .await
                .map_err(|e| SyncError::api("get", "sso settings", provider, e))?;

            settings
                .settings
                .insert(ORG_MAPPING_SETTING.to_string(), Value::String(mapping.clone()));

            info!(provider = %provider, org_mapping = %mapping, "configuring SSO org mapping");
            self.client
                .update_sso_settings(provider, &settings)
                .await
                .map_err(|e| SyncError::api("update", "sso settings", provider, e))?;
        }

        Ok(())
    }
}
