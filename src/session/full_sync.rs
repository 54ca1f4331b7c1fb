//! Full sync: materialize the remote tree and reconcile it with local disk.

use crate::error::SyncError;
use crate::ignore::IgnoreRules;
use crate::reconcile::{reconcile, scan_local, Reconciliation};
use crate::tree::{apply_plan, plan_tree, ApplyReport, LocalPathSet, PageDictionary};
use crate::types::{RemoteNode, SyncMode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A change to send upstream, still addressed by local relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    Changed { path: String, content: String },
    Added { path: String, content: String },
    Deleted { path: String },
}

impl PendingChange {
    pub fn path(&self) -> &str {
        match self {
            PendingChange::Changed { path, .. }
            | PendingChange::Added { path, .. }
            | PendingChange::Deleted { path } => path,
        }
    }
}

/// Everything the session needs after a full sync.
#[derive(Debug)]
pub struct FullSyncOutcome {
    /// Canonical base directory.
    pub base: PathBuf,
    pub dictionary: PageDictionary,
    /// Local paths of every file the remote tree describes.
    pub remote_files: LocalPathSet,
    /// Changes to send, in order.
    pub pending: Vec<PendingChange>,
    /// (path, content) pairs that already match on both sides.
    pub in_sync: Vec<(String, String)>,
    pub report: ApplyReport,
    pub reconciliation: Option<Reconciliation>,
}

/// Materialize `nodes` under `base` and work out what to send upstream.
///
/// Blocking; run it off the async executor. Only failing to create the base
/// directory is an error, everything else is logged per file.
pub fn full_sync(
    base: &Path,
    nodes: &[RemoteNode],
    mode: SyncMode,
    ignore: &IgnoreRules,
) -> Result<FullSyncOutcome, SyncError> {
    fs::create_dir_all(base).map_err(|e| SyncError::io(base, e))?;
    let base = dunce::canonicalize(base).map_err(|e| SyncError::io(base, e))?;

    let plan = plan_tree(nodes);
    let mut report = apply_plan(&base, &plan, mode);

    let mut pending: Vec<PendingChange> = report
        .divergent
        .drain(..)
        .map(|d| PendingChange::Changed {
            path: d.path,
            content: d.content,
        })
        .collect();

    let reconciliation = if mode == SyncMode::Push {
        let local = scan_local(&base, ignore)?;
        let result = reconcile(&local, &plan.files);

        for path in &result.to_create_locally {
            let full_path = base.join(path);
            match fs::read_to_string(&full_path) {
                Ok(content) => pending.push(PendingChange::Added {
                    path: path.clone(),
                    content,
                }),
                Err(e) => warn!(path = %path, error = %e, "Skipping unreadable local file"),
            }
        }
        for path in &result.to_delete_locally {
            pending.push(PendingChange::Deleted { path: path.clone() });
        }
        Some(result)
    } else {
        None
    };

    info!(
        base = %base.display(),
        mode = %mode,
        pages = plan.dictionary.len(),
        files = plan.files.len(),
        pending = pending.len(),
        "Full sync complete"
    );

    let in_sync = std::mem::take(&mut report.in_sync);
    Ok(FullSyncOutcome {
        base,
        dictionary: plan.dictionary,
        remote_files: plan.files,
        pending,
        in_sync,
        report,
        reconciliation,
    })
}
