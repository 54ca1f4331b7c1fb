//! Apply a materialize plan to the local filesystem.

use super::plan::{MaterializePlan, WorkItem};
use crate::error::SyncError;
use crate::types::SyncMode;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// A local file whose content differs from the remote copy (push mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDivergence {
    pub path: String,
    pub content: String,
}

/// Outcome of applying a plan.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub dirs_created: usize,
    pub files_written: usize,
    pub files_unchanged: usize,
    /// Files that exist locally with different content; only filled in push mode.
    pub divergent: Vec<LocalDivergence>,
    /// Files whose local content equals the remote content after applying.
    pub in_sync: Vec<(String, String)>,
    pub errors: Vec<SyncError>,
}

/// Apply `plan` under `base` according to `mode`.
///
/// Directories are created for every mode. Per-item failures are logged and
/// collected; they never stop the remaining items.
pub fn apply_plan(base: &Path, plan: &MaterializePlan, mode: SyncMode) -> ApplyReport {
    let mut report = ApplyReport::default();

    for item in &plan.items {
        let result = match item {
            WorkItem::EnsureDir { path } => ensure_dir(base, path).map(|created| {
                if created {
                    report.dirs_created += 1;
                }
            }),
            WorkItem::WriteFile { path, content, .. } => {
                apply_file(base, path, content, mode, &mut report)
            }
        };

        if let Err(err) = result {
            warn!(path = %item.path(), error = %err, "Failed to materialize node");
            report.errors.push(err);
        }
    }

    info!(
        mode = %mode,
        dirs_created = report.dirs_created,
        files_written = report.files_written,
        files_unchanged = report.files_unchanged,
        divergent = report.divergent.len(),
        errors = report.errors.len(),
        "Applied remote tree"
    );
    report
}

fn apply_file(
    base: &Path,
    path: &str,
    content: &str,
    mode: SyncMode,
    report: &mut ApplyReport,
) -> Result<(), SyncError> {
    let full_path = base.join(path);
    match mode {
        SyncMode::Pull => {
            if write_if_changed(&full_path, content)? {
                report.files_written += 1;
            } else {
                report.files_unchanged += 1;
            }
            report.in_sync.push((path.to_string(), content.to_string()));
        }
        SyncMode::Push | SyncMode::Mirror => match read_existing(&full_path)? {
            Some(local) if local == content => {
                report.files_unchanged += 1;
                report.in_sync.push((path.to_string(), local));
            }
            Some(local) => {
                if mode == SyncMode::Push {
                    debug!(path = %path, "Local file differs from remote");
                    report.divergent.push(LocalDivergence {
                        path: path.to_string(),
                        content: local,
                    });
                }
            }
            // Missing locally; push mode reports it through reconciliation.
            None => {}
        },
    }
    Ok(())
}

/// Create `base/path` if missing. Returns true when it was created.
fn ensure_dir(base: &Path, path: &str) -> Result<bool, SyncError> {
    let full_path = base.join(path);
    if full_path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(&full_path).map_err(|e| SyncError::TreeWalk {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(true)
}

fn read_existing(path: &Path) -> Result<Option<String>, SyncError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SyncError::io(path, e)),
    }
}

/// Write `content` unless the file already holds exactly that content.
/// Returns true when a write happened.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool, SyncError> {
    if let Some(existing) = read_existing(path)? {
        if existing == content {
            return Ok(false);
        }
    }
    fs::write(path, content).map_err(|e| SyncError::io(path, e))?;
    Ok(true)
}
