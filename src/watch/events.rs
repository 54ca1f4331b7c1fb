//! Watch events, classification, and configuration.

use crate::ignore::default_patterns;
use notify::event::ModifyKind;
use notify::{Event, EventKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Ignore patterns (glob patterns, relative to the base directory)
    #[serde(default = "default_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_patterns(),
        }
    }
}

/// What a local event means for the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchKind {
    Changed,
    Added,
    Deleted,
}

/// A classified local event; `path` is relative to the base directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchAction {
    pub kind: WatchKind,
    pub path: String,
}

/// What is on disk at a path right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    Missing,
    File,
    Directory,
}

impl PathState {
    /// State of `path` on the real filesystem.
    pub fn of(path: &Path) -> PathState {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => PathState::Directory,
            Ok(_) => PathState::File,
            Err(_) => PathState::Missing,
        }
    }
}

/// Turn a raw notification into per-path actions.
///
/// Whether something was created, renamed or removed is decided by what is on
/// disk now, which is the only signal that holds across platforms: a path that
/// is gone is a deletion, a path that (re)appeared is an addition.
pub fn classify_event<P>(event: &Event, state_of: P) -> Vec<(WatchKind, PathBuf)>
where
    P: Fn(&Path) -> PathState,
{
    let structural = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => {
            true
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => false,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| !path.as_os_str().is_empty())
        .filter_map(|path| {
            let kind = match state_of(path) {
                PathState::Missing => WatchKind::Deleted,
                PathState::Directory => return None,
                PathState::File if structural => WatchKind::Added,
                PathState::File => WatchKind::Changed,
            };
            Some((kind, path.clone()))
        })
        .collect()
}
