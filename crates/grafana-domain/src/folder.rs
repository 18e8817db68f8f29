//! Folder hierarchy model
//!
//! Operator-managed folders are identified by a UID derived from their full
//! slash-separated path, never by their title. Renaming a folder in the
//! Grafana UI therefore never changes its identity; the title is reconciled
//! back on the next sync instead.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Prefix of every operator-managed folder UID.
///
/// Shared with datasource UIDs so a single prefix marks operator ownership.
pub const UID_PREFIX: &str = "gs-";

/// Number of hex characters of the path hash kept in a UID.
pub const UID_HASH_LENGTH: usize = 12;

/// Description set on operator-managed folders.
pub const DESCRIPTION: &str = "managed-by: observability-operator";

/// Maximum length of a Grafana folder title.
pub const MAX_TITLE_LENGTH: usize = 189;

/// Maximum nesting depth for folder hierarchies.
pub const MAX_DEPTH: usize = 4;

/// Folder path validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolderPathError {
    /// Leading/trailing slash or empty segment
    #[error("invalid folder path: must not have leading/trailing slashes or empty segments")]
    InvalidPath,

    /// More segments than Grafana supports
    #[error("folder path is too deep: {depth} levels, maximum is {MAX_DEPTH}")]
    TooDeep {
        /// Number of segments in the rejected path
        depth: usize,
    },

    /// A segment longer than the Grafana title limit
    #[error("folder name is too long: {length} characters, maximum is {MAX_TITLE_LENGTH}")]
    NameTooLong {
        /// Length of the offending segment
        length: usize,
    },
}

/// A single folder of a hierarchy, from root to leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    uid: String,
    title: String,
    parent_uid: String,
    full_path: String,
}

impl Folder {
    /// Creates a folder for the given full path. The UID is derived from the path.
    pub fn new(
        full_path: impl Into<String>,
        title: impl Into<String>,
        parent_uid: impl Into<String>,
    ) -> Self {
        let full_path = full_path.into();
        Self {
            uid: generate_uid(&full_path),
            title: title.into(),
            parent_uid: parent_uid.into(),
            full_path,
        }
    }

    /// Path-derived identity.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Display title (the last path segment).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// UID of the parent folder, empty for a root segment.
    pub fn parent_uid(&self) -> &str {
        &self.parent_uid
    }

    /// Full path up to and including this segment.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Whether this is a root segment.
    pub fn is_root(&self) -> bool {
        self.parent_uid.is_empty()
    }
}

/// Produces a deterministic UID from the full folder path.
///
/// The UID is the prefix followed by the first twelve lowercase hex
/// characters of SHA-256 over the path, so its length is always
/// `UID_PREFIX.len() + 12`.
///
/// ```
/// use grafana_domain::folder::generate_uid;
///
/// let uid = generate_uid("team-a/networking");
/// assert!(uid.starts_with("gs-"));
/// assert_eq!(uid.len(), 15);
/// assert_eq!(uid, generate_uid("team-a/networking"));
/// ```
pub fn generate_uid(full_path: &str) -> String {
    let hash = Sha256::digest(full_path.as_bytes());
    let encoded = hex::encode(hash);
    format!("{}{}", UID_PREFIX, &encoded[..UID_HASH_LENGTH])
}

/// Checks if a UID belongs to the operator.
pub fn is_operator_managed(uid: &str) -> bool {
    uid.starts_with(UID_PREFIX)
}

/// Splits a slash-separated path into its folders, ordered root to leaf.
///
/// `"team-a/networking/alerts"` yields folders for `team-a`,
/// `team-a/networking` and `team-a/networking/alerts`, each one parented to
/// the previous. An empty path yields no folders.
pub fn parse_path(path: &str) -> Vec<Folder> {
    if path.is_empty() {
        return Vec::new();
    }

    let segments: Vec<&str> = path.split('/').collect();
    let mut folders: Vec<Folder> = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let full_path = segments[..=i].join("/");
        let parent_uid = folders
            .last()
            .map(|parent| parent.uid().to_string())
            .unwrap_or_default();
        folders.push(Folder::new(full_path, *segment, parent_uid));
    }

    folders
}

/// Checks that a folder path is well-formed.
///
/// An empty path is valid and means the General folder.
pub fn validate_path(path: &str) -> Result<(), FolderPathError> {
    if path.is_empty() {
        return Ok(());
    }

    if path.starts_with('/') || path.ends_with('/') {
        return Err(FolderPathError::InvalidPath);
    }

    let segments: Vec<&str> = path.split('/').collect();

    if segments.len() > MAX_DEPTH {
        return Err(FolderPathError::TooDeep {
            depth: segments.len(),
        });
    }

    for segment in segments {
        if segment.is_empty() {
            return Err(FolderPathError::InvalidPath);
        }
        let length = segment.chars().count();
        if length > MAX_TITLE_LENGTH {
            return Err(FolderPathError::NameTooLong { length });
        }
    }

    Ok(())
}
