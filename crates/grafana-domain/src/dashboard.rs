//! Dashboard domain model
//!
//! A dashboard is an arbitrary JSON object placed into an organization and,
//! optionally, a folder path. The dashboard UID is read from the content
//! itself so the desired state and Grafana agree on identity.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::folder::{self, FolderPathError};

/// Provenance tag injected into every operator-published dashboard.
pub const MANAGED_DASHBOARD_TAG: &str = "managed-by-obs-operator";

/// Dashboard validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// Content has no `uid` string
    #[error("dashboard UID is missing")]
    MissingUid,

    /// No target organization
    #[error("dashboard organization is missing")]
    MissingOrganization,

    /// Content is absent, not a JSON object or failed to parse
    #[error("invalid JSON format: {0}")]
    InvalidJson(String),

    /// Folder path failed validation
    #[error(transparent)]
    InvalidFolderPath(#[from] FolderPathError),
}

/// A dashboard to publish into a Grafana organization.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    uid: String,
    organization: String,
    folder_path: String,
    content: Value,
}

impl Dashboard {
    /// Creates a dashboard, extracting the UID from the content's `uid` field.
    pub fn new(organization: impl Into<String>, folder_path: impl Into<String>, content: Value) -> Self {
        let uid = content
            .get("uid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            uid,
            organization: organization.into(),
            folder_path: folder_path.into(),
            content,
        }
    }

    /// Dashboard UID as found in the content.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Name of the target organization.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Slash-separated folder path, empty for the General folder.
    pub fn folder_path(&self) -> &str {
        &self.folder_path
    }

    /// Raw dashboard content.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Validates the dashboard, reporting every violation rather than the first.
    ///
    /// Errors are returned in a stable order: uid, organization, content,
    /// folder path.
    pub fn validate(&self) -> Vec<DashboardError> {
        let mut errors = Vec::new();

        if self.uid.is_empty() {
            errors.push(DashboardError::MissingUid);
        }

        if self.organization.is_empty() {
            errors.push(DashboardError::MissingOrganization);
        }

        match &self.content {
            Value::Object(_) => {}
            Value::Null => errors.push(DashboardError::InvalidJson("content is missing".to_string())),
            _ => errors.push(DashboardError::InvalidJson(
                "content is not a JSON object".to_string(),
            )),
        }

        if let Err(err) = folder::validate_path(&self.folder_path) {
            errors.push(err.into());
        }

        errors
    }

    /// Content ready to be posted to Grafana.
    ///
    /// Works on a copy: the `id` field is removed because an id carried over
    /// from another organization or installation conflicts with overwrite
    /// semantics, and the managed tag is appended.
    pub fn publishable_content(&self) -> Result<Map<String, Value>, DashboardError> {
        let mut content = match &self.content {
            Value::Object(map) => map.clone(),
            _ => {
                return Err(DashboardError::InvalidJson(
                    "content is not a JSON object".to_string(),
                ))
            }
        };

        content.remove("id");
        inject_managed_tag(&mut content);

        Ok(content)
    }
}

impl std::fmt::Display for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dashboard{{uid: {}, organization: {}}}",
            self.uid, self.organization
        )
    }
}

/// Outcome of mapping raw dashboard JSON into the domain.
///
/// Invalid JSON is a typed result here instead of an empty dashboard that
/// validation has to rediscover later.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDashboard {
    /// The raw JSON was a valid object
    Parsed(Dashboard),
    /// The raw JSON could not be used as dashboard content
    Invalid {
        /// Organization the dashboard was meant for
        organization: String,
        /// Why parsing failed
        error: DashboardError,
    },
}

impl ParsedDashboard {
    /// Parses raw dashboard JSON for the given organization and folder path.
    pub fn parse(organization: &str, folder_path: &str, raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(content @ Value::Object(_)) => {
                ParsedDashboard::Parsed(Dashboard::new(organization, folder_path, content))
            }
            Ok(_) => ParsedDashboard::Invalid {
                organization: organization.to_string(),
                error: DashboardError::InvalidJson("content is not a JSON object".to_string()),
            },
            Err(err) => ParsedDashboard::Invalid {
                organization: organization.to_string(),
                error: DashboardError::InvalidJson(err.to_string()),
            },
        }
    }

    /// Converts into a result, discarding the organization of invalid input.
    pub fn into_result(self) -> Result<Dashboard, DashboardError> {
        match self {
            ParsedDashboard::Parsed(dashboard) => Ok(dashboard),
            ParsedDashboard::Invalid { error, .. } => Err(error),
        }
    }
}

/// Ensures the managed tag is present in the content's `tags` array.
///
/// Idempotent: the tag is only appended when no exact match exists. A
/// missing, null or non-array `tags` field is treated as empty.
pub fn inject_managed_tag(content: &mut Map<String, Value>) {
    let mut tags = match content.get("tags") {
        Some(Value::Array(tags)) => tags.clone(),
        _ => Vec::new(),
    };

    if tags.iter().any(|tag| tag.as_str() == Some(MANAGED_DASHBOARD_TAG)) {
        return;
    }

    tags.push(Value::String(MANAGED_DASHBOARD_TAG.to_string()));
    content.insert("tags".to_string(), Value::Array(tags));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn tag_count(content: &Map<String, Value>) -> usize {
        content["tags"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|t| t.as_str() == Some(MANAGED_DASHBOARD_TAG))
            .count()
    }

    #[test]
    fn test_new_extracts_uid() {
        let dash = Dashboard::new("Org", "", json!({"uid": "abc", "title": "A"}));
        assert_eq!(dash.uid(), "abc");

        let no_uid = Dashboard::new("Org", "", json!({"uid": 42}));
        assert_eq!(no_uid.uid(), "");
    }

    #[test]
    fn test_validate_valid_dashboard() {
        let dash = Dashboard::new("Org", "team-a/networking", json!({"uid": "abc"}));
        assert!(dash.validate().is_empty());
    }

    #[test]
    fn test_validate_accumulates_in_stable_order() {
        let dash = Dashboard::new("", "", Value::Null);
        let errors = dash.validate();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], DashboardError::MissingUid);
        assert_eq!(errors[1], DashboardError::MissingOrganization);
        assert!(matches!(errors[2], DashboardError::InvalidJson(_)));
    }

    #[test]
    fn test_validate_reports_folder_path() {
        let dash = Dashboard::new("Org", "/team-a", json!({"uid": "abc"}));
        assert_eq!(
            dash.validate(),
            vec![DashboardError::InvalidFolderPath(FolderPathError::InvalidPath)]
        );
    }

    #[test]
    fn test_validate_rejects_non_object_content() {
        let dash = Dashboard::new("Org", "", json!(["not", "an", "object"]));
        let errors = dash.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], DashboardError::MissingUid);
        assert!(matches!(errors[1], DashboardError::InvalidJson(_)));
    }

    #[test]
    fn test_publishable_content_strips_id_and_tags() {
        let dash = Dashboard::new(
            "Org",
            "",
            json!({"id": 12, "uid": "abc", "title": "A", "tags": ["team"]}),
        );

        let content = dash.publishable_content().unwrap();
        assert!(!content.contains_key("id"));
        assert_eq!(content["tags"], json!(["team", MANAGED_DASHBOARD_TAG]));
        // the dashboard itself is untouched
        assert_eq!(dash.content()["id"], json!(12));
    }

    #[test]
    fn test_inject_managed_tag_into_empty_tags() {
        let mut content = object(json!({"uid": "abc"}));
        inject_managed_tag(&mut content);
        assert_eq!(content["tags"], json!([MANAGED_DASHBOARD_TAG]));
    }

    #[test]
    fn test_inject_managed_tag_is_idempotent() {
        let mut content = object(json!({"uid": "abc", "tags": ["existing-tag"]}));
        for _ in 0..5 {
            inject_managed_tag(&mut content);
        }
        assert_eq!(tag_count(&content), 1);
        assert_eq!(content["tags"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_inject_managed_tag_tolerates_bad_tags() {
        for tags in [Value::Null, json!("a-string"), json!(42), json!({"k": "v"})] {
            let mut content = object(json!({"uid": "abc"}));
            content.insert("tags".to_string(), tags);
            inject_managed_tag(&mut content);
            assert_eq!(content["tags"], json!([MANAGED_DASHBOARD_TAG]));
        }
    }

    #[test]
    fn test_parse_valid_dashboard() {
        let parsed = ParsedDashboard::parse("Org", "team-a", r#"{"uid": "abc"}"#);
        let dash = parsed.into_result().unwrap();
        assert_eq!(dash.uid(), "abc");
        assert_eq!(dash.folder_path(), "team-a");
    }

    #[test]
    fn test_parse_invalid_dashboard() {
        match ParsedDashboard::parse("Org", "", "{not json") {
            ParsedDashboard::Invalid { organization, error } => {
                assert_eq!(organization, "Org");
                assert!(matches!(error, DashboardError::InvalidJson(_)));
            }
            other => panic!("expected invalid, got {other:?}"),
        }

        assert!(ParsedDashboard::parse("Org", "", "[1, 2]").into_result().is_err());
    }
}
