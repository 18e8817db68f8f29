//! Datasource model
//!
//! One canonical datasource record is used for desired and existing state
//! alike, and doubles as the Grafana wire representation. The `uid` is the
//! only key used to match existing datasources against desired ones.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Prefix of every operator-managed datasource UID.
///
/// Datasources carrying this prefix are garbage collected when they are no
/// longer desired.
pub const DATASOURCE_UID_PREFIX: &str = "gs-";

/// A Grafana datasource.
///
/// # Examples
///
/// ```
/// use grafana_domain::Datasource;
/// use serde_json::json;
///
/// let base = Datasource::default()
///     .with_json_data("httpMethod", json!("POST"));
/// let merged = base.merge(
///     Datasource::new("gs-mimir", "Mimir").with_json_data("timeInterval", json!("60s")),
/// );
///
/// assert_eq!(merged.uid, "gs-mimir");
/// assert_eq!(merged.json_data.len(), 2);
/// assert!(merged.is_managed());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    /// Grafana id, 0 until created
    #[serde(default)]
    pub id: i64,

    /// Stable match key
    #[serde(default)]
    pub uid: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Plugin type (prometheus, loki, tempo, alertmanager, ...)
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Backend URL
    #[serde(default)]
    pub url: String,

    /// Access mode (proxy or direct)
    #[serde(default)]
    pub access: String,

    /// Whether this is the organization's default datasource
    #[serde(default)]
    pub is_default: bool,

    /// Plugin settings
    #[serde(default, deserialize_with = "null_as_empty")]
    pub json_data: Map<String, Value>,

    /// Encrypted settings; never returned by Grafana on reads
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secure_json_data: BTreeMap<String, String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Datasource {
    /// Creates an empty datasource with the given identity.
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set a plugin setting.
    pub fn with_json_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.json_data.insert(key.into(), value);
        self
    }

    /// Set an encrypted setting.
    pub fn with_secure_json_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secure_json_data.insert(key.into(), value.into());
        self
    }

    /// Whether the datasource is owned by the operator.
    pub fn is_managed(&self) -> bool {
        self.uid.starts_with(DATASOURCE_UID_PREFIX)
    }

    /// Overlays `other` on top of this datasource.
    ///
    /// Non-empty scalar fields of `other` win, `is_default` is set if either
    /// side sets it, and both settings maps are merged key by key with
    /// `other` taking precedence.
    pub fn merge(mut self, other: Datasource) -> Datasource {
        if other.id != 0 {
            self.id = other.id;
        }
        if !other.uid.is_empty() {
            self.uid = other.uid;
        }
        if !other.name.is_empty() {
            self.name = other.name;
        }
        if !other.kind.is_empty() {
            self.kind = other.kind;
        }
        if !other.url.is_empty() {
            self.url = other.url;
        }
        if !other.access.is_empty() {
            self.access = other.access;
        }
        self.is_default |= other.is_default;
        self.json_data.extend(other.json_data);
        self.secure_json_data.extend(other.secure_json_data);
        self
    }
}
