//! Folder hierarchy convergence.
//!
//! Folders are identified by a UID derived from their full path, so a
//! hierarchy can be converged segment by segment without any lookup by
//! title. Titles are still reconciled, which undoes manual renames made in
//! the Grafana UI.
//!
//! All operations act on the organization of the client handle they are
//! given; use [`within_organization`](crate::org_context::within_organization)
//! to scope them.

use grafana_client::{CreateFolderCommand, FolderRecord, GrafanaApi, UpdateFolderCommand};
use grafana_domain::folder::{self, DESCRIPTION};
use grafana_domain::Dashboard;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use crate::error::{SyncError, SyncResult};

/// Grafana's nested folder limit, bounding the listing walk.
const MAX_LISTING_DEPTH: usize = 8;

/// Converges and cleans up operator-managed folders.
pub struct FolderHierarchy<'a, C> {
    client: &'a C,
}

impl<'a, C: GrafanaApi> FolderHierarchy<'a, C> {
    /// Create a folder hierarchy bound to a client handle.
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Ensures every folder of `path` exists with the expected title.
    ///
    /// Returns the leaf folder UID, or `None` for an empty path (the General
    /// folder). Any error other than not-found aborts the walk.
    #[instrument(skip(self), fields(org_id = self.client.org_id()))]
    pub async fn ensure_hierarchy(&self, path: &str) -> SyncResult<Option<String>> {
        folder::validate_path(path)?;

        let segments = folder::parse_path(path);
        let mut leaf_uid = None;

        for segment in segments {
            match self.client.get_folder(segment.uid()).await {
                Ok(existing) => {
                    if existing.title != segment.title() {
                        info!(
                            uid = segment.uid(),
                            old_title = %existing.title,
                            new_title = segment.title(),
                            "renaming folder"
                        );
                        let command = UpdateFolderCommand {
                            title: segment.title().to_string(),
                            overwrite: true,
                        };
                        self.client
                            .update_folder(segment.uid(), &command)
                            .await
                            .map_err(|e| SyncError::api("update", "folder", segment.full_path(), e))?;
                    } else {
                        debug!(uid = segment.uid(), "folder up to date");
                    }
                }
                Err(err) if err.is_not_found() => {
                    info!(
                        uid = segment.uid(),
                        title = segment.title(),
                        parent_uid = segment.parent_uid(),
                        "creating folder"
                    );
                    let command = CreateFolderCommand {
                        uid: segment.uid().to_string(),
                        title: segment.title().to_string(),
                        parent_uid: (!segment.is_root()).then(|| segment.parent_uid().to_string()),
                        description: DESCRIPTION.to_string(),
                    };
                    self.client
                        .create_folder(&command)
                        .await
                        .map_err(|e| SyncError::api("create", "folder", segment.full_path(), e))?;
                }
                Err(err) => return Err(SyncError::api("get", "folder", segment.full_path(), err)),
            }

            leaf_uid = Some(segment.uid().to_string());
        }

        Ok(leaf_uid)
    }

    /// Deletes operator-managed folders that are not in `required_uids`.
    ///
    /// Folders are evaluated deepest first, so an orphaned parent whose
    /// children are all orphans is emptied and removed in the same sweep.
    /// Folders that still hold content are never deleted. Every failure is
    /// recorded and the sweep carries on; the collected errors are joined.
    #[instrument(skip(self, required_uids), fields(org_id = self.client.org_id()))]
    pub async fn cleanup(&self, required_uids: &HashSet<String>) -> SyncResult<()> {
        let folders = self.list_all().await?;
        let mut errors = Vec::new();

        for record in folders.iter().rev() {
            if !folder::is_operator_managed(&record.uid) || required_uids.contains(&record.uid) {
                continue;
            }

            let counts = match self.client.folder_descendant_counts(&record.uid).await {
                Ok(counts) => counts,
                Err(err) => {
                    errors.push(SyncError::api("count descendants of", "folder", &record.uid, err));
                    continue;
                }
            };

            if counts.values().any(|count| *count > 0) {
                warn!(uid = %record.uid, ?counts, "orphaned folder is not empty, skipping deletion");
                errors.push(SyncError::FolderNotEmpty {
                    uid: record.uid.clone(),
                });
                continue;
            }

            info!(uid = %record.uid, title = %record.title, "deleting orphaned folder");
            match self.client.delete_folder(&record.uid).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    debug!(uid = %record.uid, "orphaned folder already gone");
                }
                Err(err) => errors.push(SyncError::api("delete", "folder", &record.uid, err)),
            }
        }

        SyncError::join(errors)
    }

    /// Lists every folder of the organization, parents before children.
    async fn list_all(&self) -> SyncResult<Vec<FolderRecord>> {
        let roots = self
            .client
            .list_folders(None)
            .await
            .map_err(|e| SyncError::api("list", "folders", "root", e))?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut all = Vec::new();
        let mut level = roots;
        let mut depth = 0;

        while !level.is_empty() && depth < MAX_LISTING_DEPTH {
            let mut next = Vec::new();

            for record in level {
                if !seen.insert(record.uid.clone()) {
                    continue;
                }
                let children = self
                    .client
                    .list_folders(Some(&record.uid))
                    .await
                    .map_err(|e| SyncError::api("list", "folders", &record.uid, e))?;
                next.extend(children);
                all.push(record);
            }

            level = next;
            depth += 1;
        }

        debug!(count = all.len(), "listed folders");
        Ok(all)
    }
}

/// UIDs of every folder the given dashboards live in, ancestors included.
pub fn required_folder_uids<'d>(dashboards: impl IntoIterator<Item = &'d Dashboard>) -> HashSet<String> {
    dashboards
        .into_iter()
        .flat_map(|dashboard| folder::parse_path(dashboard.folder_path()))
        .map(|segment| segment.uid().to_string())
        .collect()
}
