//! Start-of-session reconciliation between local and remote file sets.

use crate::error::SyncError;
use crate::ignore::IgnoreRules;
use crate::paths::relative_to;
use crate::tree::LocalPathSet;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Symmetric difference of the local and remote file sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Local files the remote does not know about, in scan order.
    pub to_create_locally: Vec<String>,
    /// Remote files that no longer exist locally, in remote order.
    pub to_delete_locally: Vec<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.to_create_locally.is_empty() && self.to_delete_locally.is_empty()
    }
}

/// Compare local and remote paths (both relative to the base directory).
pub fn reconcile(local: &LocalPathSet, remote: &LocalPathSet) -> Reconciliation {
    let reconciliation = Reconciliation {
        to_create_locally: local.difference(remote).map(str::to_string).collect(),
        to_delete_locally: remote.difference(local).map(str::to_string).collect(),
    };
    debug!(
        local = local.len(),
        remote = remote.len(),
        to_create = reconciliation.to_create_locally.len(),
        to_delete = reconciliation.to_delete_locally.len(),
        "Reconciled file sets"
    );
    reconciliation
}

/// Recursively list files under `base` as relative `/`-separated paths.
///
/// Unreadable entries are logged and skipped. A missing base yields an empty set.
pub fn scan_local(base: &Path, ignore: &IgnoreRules) -> Result<LocalPathSet, SyncError> {
    let mut paths = LocalPathSet::new();
    if !base.exists() {
        return Ok(paths);
    }

    let walker = WalkDir::new(base)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            relative_to(base, entry.path())
                .map(|rel| !ignore.is_ignored(&rel))
                .unwrap_or(true)
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry during scan");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(rel) = relative_to(base, entry.path()) {
            paths.insert(rel);
        }
    }

    debug!(base = %base.display(), files = paths.len(), "Scanned local files");
    Ok(paths)
}
