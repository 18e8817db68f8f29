//! Organization domain models
//!
//! This module provides the Organization entity that maps one desired
//! organization onto a Grafana organization. An organization owns a list of
//! tenants, the data-access identities forwarded to the backends, and the
//! attribute lists used to build SSO role mappings.

use serde::{Deserialize, Serialize};

/// Display name of the organization every authenticated user can access.
pub const SHARED_ORG_NAME: &str = "Shared Org";

/// The kind of access a tenant is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantType {
    /// Query access to logs, metrics and traces.
    Data,
    /// Alerting and recording rule management.
    Alerting,
}

impl TenantType {
    /// Get the string representation of the tenant type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantType::Data => "data",
            TenantType::Alerting => "alerting",
        }
    }
}

/// A tenant forwarded to the backends through the tenant header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant name, used verbatim as header value
    pub name: String,

    /// Access types enabled for this tenant
    #[serde(default)]
    pub types: Vec<TenantType>,
}

impl Tenant {
    /// Creates a tenant with the given access types.
    pub fn new(name: impl Into<String>, types: impl IntoIterator<Item = TenantType>) -> Self {
        Self {
            name: name.into(),
            types: types.into_iter().collect(),
        }
    }

    /// Creates a data-only tenant.
    pub fn data(name: impl Into<String>) -> Self {
        Self::new(name, [TenantType::Data])
    }

    /// A tenant is alerting-enabled iff its type set contains `alerting`.
    pub fn is_alerting_enabled(&self) -> bool {
        self.types.contains(&TenantType::Alerting)
    }
}

/// A Grafana organization as described by the desired state.
///
/// `id == 0` means the organization has never been created in Grafana; the
/// id is assigned by the first successful upsert and must be persisted by the
/// caller.
///
/// # Examples
///
/// ```
/// use grafana_domain::{Organization, Tenant, TenantType};
///
/// let org = Organization::new("Team A")
///     .with_tenants(vec![
///         Tenant::data("team-a"),
///         Tenant::new("team-a-rules", [TenantType::Data, TenantType::Alerting]),
///     ])
///     .with_admins(vec!["team-a-admins".to_string()]);
///
/// assert!(!org.is_created());
/// assert_eq!(org.tenant_names(), vec!["team-a", "team-a-rules"]);
/// assert_eq!(org.alerting_tenants().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Organization {
    /// Grafana organization id (0 until created)
    #[serde(default)]
    pub id: i64,

    /// Unique display name
    pub name: String,

    /// Ordered tenant list
    #[serde(default)]
    pub tenants: Vec<Tenant>,

    /// Attributes mapped to the Admin role
    #[serde(default)]
    pub admins: Vec<String>,

    /// Attributes mapped to the Editor role
    #[serde(default)]
    pub editors: Vec<String>,

    /// Attributes mapped to the Viewer role
    #[serde(default)]
    pub viewers: Vec<String>,
}

impl Organization {
    /// Creates an organization that does not exist in Grafana yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates an organization known only by its Grafana id and name.
    pub fn from_grafana(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the Grafana id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Set the tenants.
    pub fn with_tenants(mut self, tenants: Vec<Tenant>) -> Self {
        self.tenants = tenants;
        self
    }

    /// Set the admin attributes.
    pub fn with_admins(mut self, admins: Vec<String>) -> Self {
        self.admins = admins;
        self
    }

    /// Set the editor attributes.
    pub fn with_editors(mut self, editors: Vec<String>) -> Self {
        self.editors = editors;
        self
    }

    /// Set the viewer attributes.
    pub fn with_viewers(mut self, viewers: Vec<String>) -> Self {
        self.viewers = viewers;
        self
    }

    /// Whether the organization has been created in Grafana.
    pub fn is_created(&self) -> bool {
        self.id > 0
    }

    /// Names of all tenants in declaration order, data-only and alerting alike.
    pub fn tenant_names(&self) -> Vec<&str> {
        self.tenants.iter().map(|t| t.name.as_str()).collect()
    }

    /// Tenants with alerting enabled, in declaration order.
    pub fn alerting_tenants(&self) -> impl Iterator<Item = &Tenant> {
        self.tenants.iter().filter(|t| t.is_alerting_enabled())
    }
}

impl std::fmt::Display for Organization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Organization{{id: {}, name: {}}}", self.id, self.name)
    }
}
