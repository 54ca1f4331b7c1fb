//! Pure traversal of a remote tree into work items.
//!
//! Planning never touches the filesystem. It produces the full page
//! dictionary up front, so reconciliation can consult it before anything is
//! written, and leaves side effects to [`super::apply`].

use super::dictionary::{LocalPathSet, PageDictionary};
use super::normalize::{normalize, page_id_from_raw_name};
use crate::error::SyncError;
use crate::types::{PageId, RemoteNode};
use tracing::{debug, warn};

/// One unit of work produced by planning. Paths are relative to the base
/// directory and `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    EnsureDir {
        path: String,
    },
    WriteFile {
        path: String,
        content: String,
        page_id: PageId,
    },
}

impl WorkItem {
    pub fn path(&self) -> &str {
        match self {
            WorkItem::EnsureDir { path } | WorkItem::WriteFile { path, .. } => path,
        }
    }
}

/// Two remote pages that normalized to the same local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub path: String,
    pub previous_page_id: PageId,
    pub page_id: PageId,
}

/// Result of planning a remote tree.
#[derive(Debug, Default)]
pub struct MaterializePlan {
    /// Ordered work items; a file item appears once per local path.
    pub items: Vec<WorkItem>,
    pub dictionary: PageDictionary,
    /// Local paths of every materialized file.
    pub files: LocalPathSet,
    pub collisions: Vec<NameCollision>,
    /// Nodes skipped because they could not be placed safely.
    pub rejected: Vec<SyncError>,
}

impl MaterializePlan {
    pub fn file_items(&self) -> impl Iterator<Item = &WorkItem> {
        self.items
            .iter()
            .filter(|item| matches!(item, WorkItem::WriteFile { .. }))
    }
}

/// Plan a sequence of top-level remote nodes.
pub fn plan_tree(nodes: &[RemoteNode]) -> MaterializePlan {
    let mut plan = MaterializePlan::default();
    for node in nodes {
        plan_node(node, "", &mut plan);
    }
    debug!(
        items = plan.items.len(),
        pages = plan.dictionary.len(),
        collisions = plan.collisions.len(),
        "Planned remote tree"
    );
    plan
}

fn plan_node(node: &RemoteNode, parent: &str, plan: &mut MaterializePlan) {
    match node {
        RemoteNode::Directory { name, children } => {
            if let Err(reason) = validate_dir_name(name) {
                let err = SyncError::TreeWalk {
                    path: join(parent, name),
                    reason,
                };
                warn!(error = %err, "Skipping remote directory");
                plan.rejected.push(err);
                return;
            }
            let dir = join(parent, name);
            plan.items.push(WorkItem::EnsureDir { path: dir.clone() });
            for child in children {
                plan_node(child, &dir, plan);
            }
        }
        RemoteNode::Document { name, content, .. } => {
            let Some(page_name) = node.page_name() else {
                debug!(name = %name, "Skipping system file");
                return;
            };
            let file_name = normalize(page_name);
            let page_id = page_id_from_raw_name(name);
            let path = join(parent, &file_name);

            if let Some(previous) = plan.dictionary.insert(file_name.clone(), page_id.clone()) {
                if previous != page_id {
                    warn!(
                        file_name = %file_name,
                        previous_page_id = %previous,
                        page_id = %page_id,
                        "Page name collision; last page wins"
                    );
                    plan.collisions.push(NameCollision {
                        path: path.clone(),
                        previous_page_id: previous,
                        page_id: page_id.clone(),
                    });
                }
            }

            let item = WorkItem::WriteFile {
                path: path.clone(),
                content: content.clone(),
                page_id,
            };
            if plan.files.insert(path.clone()) {
                plan.items.push(item);
            } else if let Some(existing) = plan.items.iter_mut().find(|i| i.path() == path) {
                *existing = item;
            }
        }
    }
}

fn validate_dir_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("directory name is empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("directory name {:?} is not allowed", name));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!("directory name {:?} contains a path separator", name));
    }
    Ok(())
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
