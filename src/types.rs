//! Core types shared by the tree materializer, the reconciler and the session.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// PageId: remote identifier of a page (raw node name up to its first `.`)
pub type PageId = String;

/// A node of the remote document tree as delivered by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RemoteNode {
    #[serde(rename = "dir")]
    Directory {
        name: String,
        #[serde(default, deserialize_with = "lenient_children")]
        children: Vec<RemoteNode>,
    },
    #[serde(rename = "file")]
    Document {
        name: String,
        #[serde(rename = "pageName", default, skip_serializing_if = "Option::is_none")]
        page_name: Option<String>,
        #[serde(default, deserialize_with = "null_as_default")]
        content: String,
    },
}

impl RemoteNode {
    pub fn name(&self) -> &str {
        match self {
            RemoteNode::Directory { name, .. } | RemoteNode::Document { name, .. } => name,
        }
    }

    /// Page name of a document, or `None` for directories and system files.
    pub fn page_name(&self) -> Option<&str> {
        match self {
            RemoteNode::Document {
                page_name: Some(page_name),
                ..
            } if !page_name.is_empty() => Some(page_name),
            _ => None,
        }
    }

    /// Decode raw nodes one by one, dropping any that do not parse.
    pub fn decode_each(values: Vec<Value>) -> Vec<RemoteNode> {
        values
            .into_iter()
            .filter_map(|value| {
                let name = value
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                match serde_json::from_value(value) {
                    Ok(node) => Some(node),
                    Err(e) => {
                        warn!(name = %name, error = %e, "Skipping malformed remote node");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Missing or `null` children mean an empty directory.
fn lenient_children<'de, D>(deserializer: D) -> Result<Vec<RemoteNode>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(values.map(RemoteNode::decode_each).unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which side is authoritative during the initial full sync.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Local disk is authoritative; local differences are reported upstream.
    Push,
    /// Remote content is written onto local disk.
    #[default]
    Pull,
    /// Only names are assigned; nothing is written or pushed.
    Mirror,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Push => "push",
            SyncMode::Pull => "pull",
            SyncMode::Mirror => "mirror",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(SyncMode::Push),
            "pull" => Ok(SyncMode::Pull),
            "mirror" => Ok(SyncMode::Mirror),
            other => Err(format!(
                "Invalid sync mode: {} (must be 'push', 'pull', or 'mirror')",
                other
            )),
        }
    }
}

/// A change sent upstream. `path` is always remote-addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Changed { path: String, content: String },
    Added { path: String, content: String },
    Deleted { path: String },
}

impl SyncAction {
    pub fn path(&self) -> &str {
        match self {
            SyncAction::Changed { path, .. }
            | SyncAction::Added { path, .. }
            | SyncAction::Deleted { path } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SyncAction::Changed { .. } => "changed",
            SyncAction::Added { .. } => "added",
            SyncAction::Deleted { .. } => "deleted",
        }
    }
}
