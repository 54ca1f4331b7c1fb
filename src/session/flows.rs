//! Per-file flows: read, translate, transform, send.

use super::full_sync::PendingChange;
use super::ledger::SyncLedger;
use crate::channel::ChannelSender;
use crate::error::SyncError;
use crate::paths::PathTranslator;
use crate::transform::TransformPipeline;
use crate::tree::LocalPathSet;
use crate::types::SyncAction;
use crate::watch::{WatchAction, WatchKind};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io::ErrorKind;
use tracing::{debug, info};

/// State shared by every flow once the remote tree is materialized.
#[derive(Debug)]
pub struct LiveContext {
    translator: PathTranslator,
    pipeline: TransformPipeline,
    ledger: SyncLedger,
    /// Local paths the remote tree held at the last full sync.
    remote_known: Mutex<HashSet<String>>,
    outbound: ChannelSender,
}

impl LiveContext {
    pub fn new(
        translator: PathTranslator,
        pipeline: TransformPipeline,
        ledger: SyncLedger,
        outbound: ChannelSender,
    ) -> Self {
        Self {
            translator,
            pipeline,
            ledger,
            remote_known: Mutex::new(HashSet::new()),
            outbound,
        }
    }

    /// Mark the files materialized from the remote tree. Deleting one of
    /// them locally is sent even when its content never matched.
    pub fn with_remote_files(self, files: &LocalPathSet) -> Self {
        self.remote_known
            .lock()
            .extend(files.iter().map(str::to_string));
        self
    }

    pub fn is_remote_known(&self, path: &str) -> bool {
        self.remote_known.lock().contains(path)
    }

    pub fn ledger(&self) -> &SyncLedger {
        &self.ledger
    }

    /// Handle one classified local event.
    ///
    /// Returns the action sent, or `None` when there was nothing to send.
    pub async fn handle(&self, action: WatchAction) -> Result<Option<SyncAction>, SyncError> {
        let WatchAction { kind, path } = action;
        match kind {
            WatchKind::Changed | WatchKind::Added => {
                let abs_path = self.translator.absolute(&path);
                let content = match tokio::fs::read_to_string(&abs_path).await {
                    Ok(content) => content,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        let race = SyncError::FilesystemRace(abs_path);
                        debug!(path = %path, error = %race, "Treating as deletion");
                        return self.handle_deleted(path).await;
                    }
                    Err(e) => return Err(SyncError::io(abs_path, e)),
                };

                if self.ledger.is_current(&path, &content) {
                    debug!(path = %path, "Content already synced; skipping");
                    return Ok(None);
                }

                let change = if kind == WatchKind::Added {
                    PendingChange::Added { path, content }
                } else {
                    PendingChange::Changed { path, content }
                };
                self.dispatch(change).await.map(Some)
            }
            WatchKind::Deleted => self.handle_deleted(path).await,
        }
    }

    async fn handle_deleted(&self, path: String) -> Result<Option<SyncAction>, SyncError> {
        if !self.ledger.contains(&path) && !self.is_remote_known(&path) {
            debug!(path = %path, "Deleted file is unknown to the remote; skipping");
            return Ok(None);
        }
        self.dispatch(PendingChange::Deleted { path }).await.map(Some)
    }

    /// Translate, transform and send one change.
    pub async fn dispatch(&self, change: PendingChange) -> Result<SyncAction, SyncError> {
        let action = match change {
            PendingChange::Changed { path, content } => {
                let (remote_path, payload) = self.prepare(&path, &content).await?;
                let action = SyncAction::Changed {
                    path: remote_path,
                    content: payload,
                };
                self.outbound.emit_action(action.clone()).await?;
                self.ledger.record(path, content);
                action
            }
            PendingChange::Added { path, content } => {
                let (remote_path, payload) = self.prepare(&path, &content).await?;
                let action = SyncAction::Added {
                    path: remote_path,
                    content: payload,
                };
                self.outbound.emit_action(action.clone()).await?;
                self.ledger.record(path, content);
                action
            }
            PendingChange::Deleted { path } => {
                let action = SyncAction::Deleted {
                    path: self.translator.to_remote_path(&path),
                };
                self.outbound.emit_action(action.clone()).await?;
                self.ledger.forget(&path);
                self.remote_known.lock().remove(&path);
                action
            }
        };
        info!(kind = action.kind(), remote_path = %action.path(), "Sent change");
        Ok(action)
    }

    /// Remote path and final payload for a local file.
    async fn prepare(&self, path: &str, content: &str) -> Result<(String, String), SyncError> {
        let remote_path = self.translator.to_remote_path(path);
        let abs_path = self.translator.absolute(path);
        let transformed = self
            .pipeline
            .transform(&remote_path, content.to_string(), &abs_path)
            .await?;
        Ok((transformed.remote_path, transformed.content))
    }
}
