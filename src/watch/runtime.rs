//! Live filesystem watcher.

use super::events::{classify_event, PathState, WatchAction, WatchConfig};
use crate::error::SyncError;
use crate::ignore::IgnoreRules;
use crate::paths::relative_to;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Running watch on a base directory. Dropping it stops the watch.
pub struct LiveWatcher {
    base: PathBuf,
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl LiveWatcher {
    /// Watch `base` recursively and hand each classified event to `handler`.
    ///
    /// The notify callback only forwards into a channel, so slow handlers never
    /// stall notification delivery. Must be called within a tokio runtime.
    pub fn start<F>(base: &Path, config: &WatchConfig, handler: F) -> Result<Self, SyncError>
    where
        F: Fn(WatchAction) + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        })
        .map_err(|e| SyncError::Watch(format!("Failed to create watcher: {}", e)))?;

        watcher
            .watch(base, RecursiveMode::Recursive)
            .map_err(|e| SyncError::Watch(format!("Failed to watch directory: {}", e)))?;

        info!(base = %base.display(), "Watching base directory");

        let ignore = IgnoreRules::new(config.ignore_patterns.clone());
        let root = base.to_path_buf();
        let task = tokio::spawn(async move {
            while let Some(res) = rx.recv().await {
                match res {
                    Ok(event) => {
                        for action in convert_event(&root, &ignore, &event, PathState::of) {
                            debug!(kind = ?action.kind, path = %action.path, "Local change");
                            handler(action);
                        }
                    }
                    Err(e) => warn!("Watch error: {}", e),
                }
            }
            debug!("Watcher channel closed");
        });

        Ok(Self {
            base: base.to_path_buf(),
            _watcher: watcher,
            task,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl Drop for LiveWatcher {
    fn drop(&mut self) {
        self.task.abort();
        debug!(base = %self.base.display(), "Stopped watching");
    }
}

/// Classify an event and keep the actions that fall under `root` and are not ignored.
pub(crate) fn convert_event<P>(
    root: &Path,
    ignore: &IgnoreRules,
    event: &Event,
    state_of: P,
) -> Vec<WatchAction>
where
    P: Fn(&Path) -> PathState,
{
    classify_event(event, state_of)
        .into_iter()
        .filter_map(|(kind, path)| {
            let rel = relative_to(root, &path)?;
            if ignore.is_ignored(&rel) {
                return None;
            }
            Some(WatchAction { kind, path: rel })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::default_patterns;
    use crate::watch::WatchKind;
    use notify::event::{CreateKind, DataChange, ModifyKind};
    use notify::EventKind;

    #[test]
    fn test_convert_event_relative_and_ignored() {
        let ignore = IgnoreRules::new(default_patterns());
        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/base/public/home.js"))
            .add_path(PathBuf::from("/base/node_modules/x/index.js"))
            .add_path(PathBuf::from("/elsewhere/file.js"));

        let actions = convert_event(Path::new("/base"), &ignore, &event, |_: &Path| PathState::File);
        assert_eq!(
            actions,
            vec![WatchAction {
                kind: WatchKind::Changed,
                path: "public/home.js".to_string()
            }]
        );
    }

    #[test]
    fn test_convert_event_base_itself_dropped() {
        let ignore = IgnoreRules::default();
        let event = Event::new(EventKind::Create(CreateKind::Any)).add_path(PathBuf::from("/base"));
        assert!(convert_event(Path::new("/base"), &ignore, &event, |_: &Path| PathState::File).is_empty());
    }
}
