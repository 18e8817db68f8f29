//! Error types for convergence operations
//!
//! Grafana API failures are wrapped with the operation that failed and the
//! resource it targeted. Batch operations collect per-item failures into
//! [`SyncError::Aggregate`] instead of stopping at the first one.

use grafana_client::GrafanaError;
use grafana_domain::{DashboardError, FolderPathError};
use thiserror::Error;

/// Convergence error types.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A Grafana API call failed
    #[error("failed to {action} {kind} {id:?}: {source}")]
    Api {
        /// Operation that failed (get, create, update, ...)
        action: &'static str,
        /// Resource kind (folder, dashboard, datasource, ...)
        kind: &'static str,
        /// Resource identifier
        id: String,
        /// Underlying API error
        #[source]
        source: GrafanaError,
    },

    /// The organization does not exist in Grafana
    #[error("organization {name:?} not found")]
    OrganizationNotFound {
        /// Organization name
        name: String,
    },

    /// The dashboard failed validation
    #[error("invalid dashboard: {}", join_messages(.0))]
    InvalidDashboard(Vec<DashboardError>),

    /// A folder path cannot be converged
    #[error("invalid folder path: {0}")]
    InvalidFolderPath(#[from] FolderPathError),

    /// An orphaned folder still holds content and was left in place
    #[error("orphaned folder {uid:?} is not empty, skipping deletion")]
    FolderNotEmpty {
        /// Folder UID
        uid: String,
    },

    /// Two generated datasources of one organization share a uid
    #[error("datasource uid {uid:?} generated for {first:?} and {second:?}")]
    DatasourceUidConflict {
        /// Conflicting uid
        uid: String,
        /// Name of the datasource that claimed the uid first
        first: String,
        /// Name of the datasource that collided with it
        second: String,
    },

    /// An organization cannot be expressed in the SSO org mapping
    #[error("invalid org mapping: {0}")]
    InvalidOrgMapping(String),

    /// Grafana answered with something unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Several independent operations failed
    #[error("{} errors occurred: {}", .0.len(), join_messages(.0))]
    Aggregate(Vec<SyncError>),
}

/// Result type for convergence operations.
pub type SyncResult<T> = Result<T, SyncError>;

fn join_messages<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SyncError {
    /// Wraps a Grafana API error with the failed operation.
    pub fn api(
        action: &'static str,
        kind: &'static str,
        id: impl Into<String>,
        source: GrafanaError,
    ) -> Self {
        SyncError::Api {
            action,
            kind,
            id: id.into(),
            source,
        }
    }

    /// Joins collected errors into one result.
    ///
    /// No errors yields `Ok`, a single error is returned as is and anything
    /// more becomes [`SyncError::Aggregate`].
    pub fn join(mut errors: Vec<SyncError>) -> SyncResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(SyncError::Aggregate(errors)),
        }
    }

    /// Whether the error is a Grafana not-found answer.
    pub fn is_not_found(&self) -> bool {
        match self {
            SyncError::Api { source, .. } => source.is_not_found(),
            SyncError::OrganizationNotFound { .. } => true,
            _ => false,
        }
    }

    /// Number of leaf errors carried by this error.
    pub fn error_count(&self) -> usize {
        match self {
            SyncError::Aggregate(errors) => errors.iter().map(SyncError::error_count).sum(),
            _ => 1,
        }
    }
}

impl From<DashboardError> for SyncError {
    fn from(err: DashboardError) -> Self {
        SyncError::InvalidDashboard(vec![err])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert!(SyncError::join(Vec::new()).is_ok());

        let single = SyncError::join(vec![SyncError::FolderNotEmpty {
            uid: "gs-a".to_string(),
        }])
        .unwrap_err();
        assert!(matches!(single, SyncError::FolderNotEmpty { .. }));

        let many = SyncError::join(vec![
            SyncError::FolderNotEmpty {
                uid: "gs-a".to_string(),
            },
            SyncError::InvalidOrgMapping("empty".to_string()),
        ])
        .unwrap_err();
        assert_eq!(many.error_count(), 2);
        assert!(many.to_string().starts_with("2 errors occurred"));
    }

    #[test]
    fn test_api_error_context() {
        let err = SyncError::api(
            "create",
            "folder",
            "team-a/networking",
            GrafanaError::ApiError {
                status: 412,
                message: "precondition failed".to_string(),
            },
        );

        assert_eq!(
            err.to_string(),
            "failed to create folder \"team-a/networking\": API error (412): precondition failed"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_invalid_dashboard_lists_every_problem() {
        let err = SyncError::InvalidDashboard(vec![
            DashboardError::MissingUid,
            DashboardError::MissingOrganization,
        ]);
        let message = err.to_string();

        assert!(message.contains(&DashboardError::MissingUid.to_string()));
        assert!(message.contains(&DashboardError::MissingOrganization.to_string()));
    }
}
