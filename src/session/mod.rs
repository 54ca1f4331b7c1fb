//! Sync session: drives one channel connection from handshake to live watching.
//!
//! A session consumes [`ChannelEvent`]s in arrival order. On connect it asks
//! for the full remote tree, retrying on a deadline; on the response it runs a
//! full sync off the executor, sends whatever the mode queued, and starts the
//! live watcher. Everything a connection needs lives in a per-connection
//! context that is dropped on disconnect.

pub mod flows;
pub mod full_sync;
pub mod ledger;
pub mod state;

pub use flows::LiveContext;
pub use full_sync::{full_sync, FullSyncOutcome, PendingChange};
pub use ledger::SyncLedger;
pub use state::SessionState;

use crate::channel::{ChannelEvent, ChannelSender, InboundMessage, OutboundMessage};
use crate::config::CodesyncConfig;
use crate::error::SyncError;
use crate::ignore::IgnoreRules;
use crate::paths::PathTranslator;
use crate::transform::TransformPipeline;
use crate::types::{RemoteNode, SyncMode};
use crate::watch::{LiveWatcher, PathSerializer, WatchAction, WatchConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Settings for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_dir: PathBuf,
    pub mode: SyncMode,
    /// How long to wait for the remote tree before asking again.
    pub full_tree_timeout: Duration,
    /// Total full-tree requests per connection, the first one included.
    pub max_full_tree_requests: u32,
    pub watch: WatchConfig,
}

impl SessionConfig {
    pub fn new(base_dir: impl Into<PathBuf>, mode: SyncMode) -> Self {
        Self {
            base_dir: base_dir.into(),
            mode,
            full_tree_timeout: Duration::from_secs(30),
            max_full_tree_requests: 3,
            watch: WatchConfig::default(),
        }
    }

    pub fn from_config(config: &CodesyncConfig) -> Self {
        Self {
            base_dir: config.sync.base_dir.clone(),
            mode: config.sync.mode,
            full_tree_timeout: Duration::from_secs(config.sync.full_tree_timeout_secs),
            max_full_tree_requests: config.sync.max_full_tree_requests.max(1),
            watch: config.watch.clone(),
        }
    }
}

/// Per-connection state. Dropping it stops the watcher.
struct SessionContext {
    outbound: ChannelSender,
    request_deadline: Option<Instant>,
    live: Option<Arc<LiveContext>>,
    serializer: Arc<PathSerializer>,
    watcher: Option<LiveWatcher>,
}

impl SessionContext {
    fn new(outbound: ChannelSender) -> Self {
        Self {
            outbound,
            request_deadline: None,
            live: None,
            serializer: Arc::new(PathSerializer::new()),
            watcher: None,
        }
    }
}

/// State machine for one channel connection.
pub struct SyncSession {
    config: SessionConfig,
    pipeline: TransformPipeline,
    state: SessionState,
    context: Option<SessionContext>,
}

impl SyncSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_pipeline(config, TransformPipeline::passthrough())
    }

    pub fn with_pipeline(config: SessionConfig, pipeline: TransformPipeline) -> Self {
        Self {
            config,
            pipeline,
            state: SessionState::Disconnected,
            context: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Live context of the current connection, once the remote tree has been synced.
    pub fn live_context(&self) -> Option<Arc<LiveContext>> {
        self.context.as_ref().and_then(|ctx| ctx.live.clone())
    }

    /// Drive the session until the connection ends.
    ///
    /// Returns once a `Disconnected` event arrives or the event stream closes.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<ChannelEvent>,
        outbound: ChannelSender,
    ) -> Result<(), SyncError> {
        loop {
            let deadline = self
                .context
                .as_ref()
                .and_then(|ctx| ctx.request_deadline);

            let event = match deadline {
                Some(deadline) => {
                    tokio::select! {
                        event = events.recv() => event,
                        _ = tokio::time::sleep_until(deadline) => {
                            self.on_full_tree_timeout().await?;
                            continue;
                        }
                    }
                }
                None => events.recv().await,
            };

            match event {
                Some(event) => {
                    self.handle_event(event, &outbound).await?;
                    if self.state == SessionState::Disconnected {
                        return Ok(());
                    }
                }
                None => {
                    self.disconnect();
                    return Ok(());
                }
            }
        }
    }

    /// Apply one channel event.
    ///
    /// Only a closed channel during the handshake is an error; everything after
    /// that is logged per file.
    pub async fn handle_event(
        &mut self,
        event: ChannelEvent,
        outbound: &ChannelSender,
    ) -> Result<(), SyncError> {
        match event {
            ChannelEvent::Connected => self.on_connected(outbound.clone()).await,
            ChannelEvent::Message(InboundMessage::SyncAllResponse(nodes)) => {
                self.on_full_tree(nodes).await;
                Ok(())
            }
            ChannelEvent::Message(InboundMessage::Unknown(event)) => {
                debug!(event = %event, "Ignoring unknown event");
                Ok(())
            }
            ChannelEvent::Disconnected => {
                self.disconnect();
                Ok(())
            }
        }
    }

    async fn on_connected(&mut self, outbound: ChannelSender) -> Result<(), SyncError> {
        if self.context.is_some() {
            debug!("Reconnected; dropping previous connection state");
        }
        self.context = Some(SessionContext::new(outbound));
        self.state = SessionState::Connected;
        info!(base = %self.config.base_dir.display(), mode = %self.config.mode, "Channel connected");
        self.request_full_tree(1).await
    }

    async fn request_full_tree(&mut self, attempt: u32) -> Result<(), SyncError> {
        let timeout = self.config.full_tree_timeout;
        let Some(ctx) = self.context.as_mut() else {
            return Ok(());
        };
        ctx.outbound.emit(OutboundMessage::SyncAllRequest).await?;
        ctx.request_deadline = Some(Instant::now() + timeout);
        self.state = SessionState::AwaitingFullTree { attempts: attempt };
        debug!(attempt, "Requested full tree");
        Ok(())
    }

    async fn on_full_tree_timeout(&mut self) -> Result<(), SyncError> {
        let attempts = match self.state {
            SessionState::AwaitingFullTree { attempts } => attempts,
            _ => {
                if let Some(ctx) = self.context.as_mut() {
                    ctx.request_deadline = None;
                }
                return Ok(());
            }
        };

        if attempts >= self.config.max_full_tree_requests {
            error!(attempts, "No full tree received; waiting for the editor");
            if let Some(ctx) = self.context.as_mut() {
                ctx.request_deadline = None;
            }
            self.state = SessionState::Connected;
            return Ok(());
        }

        warn!(attempts, "Full tree request timed out; retrying");
        self.request_full_tree(attempts + 1).await
    }

    async fn on_full_tree(&mut self, nodes: Vec<RemoteNode>) {
        if !self.state.accepts_full_tree() {
            debug!(state = %self.state, "Ignoring full tree outside a connection");
            return;
        }
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        ctx.request_deadline = None;
        // A repeated response replaces the running watch.
        ctx.watcher = None;
        ctx.live = None;

        let base = self.config.base_dir.clone();
        let mode = self.config.mode;
        let ignore = IgnoreRules::new(self.config.watch.ignore_patterns.clone());
        let result = tokio::task::spawn_blocking(move || full_sync(&base, &nodes, mode, &ignore))
            .await
            .map_err(|e| SyncError::io(&self.config.base_dir, e.into()))
            .and_then(|r| r);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Full sync failed");
                self.state = SessionState::Connected;
                return;
            }
        };

        let FullSyncOutcome {
            base,
            dictionary,
            remote_files,
            pending,
            in_sync,
            ..
        } = outcome;

        let translator = PathTranslator::new(base.clone(), Arc::new(dictionary));
        let live = Arc::new(LiveContext::new(
            translator,
            self.pipeline.clone(),
            SyncLedger::seed(in_sync),
            ctx.outbound.clone(),
        )
        .with_remote_files(&remote_files));

        for change in pending {
            let path = change.path().to_string();
            match live.dispatch(change).await {
                Ok(_) => {}
                Err(SyncError::Channel(reason)) => {
                    warn!(reason = %reason, "Channel closed while sending initial changes");
                    break;
                }
                Err(e) => warn!(path = %path, error = %e, "Skipping initial change"),
            }
        }

        let handler = {
            let live = Arc::clone(&live);
            let serializer = Arc::clone(&ctx.serializer);
            move |action: WatchAction| {
                let live = Arc::clone(&live);
                let path = action.path.clone();
                serializer.submit(&path, async move {
                    let path = action.path.clone();
                    if let Err(e) = live.handle(action).await {
                        warn!(path = %path, error = %e, "Failed to sync local change");
                    }
                });
            }
        };

        match LiveWatcher::start(&base, &self.config.watch, handler) {
            Ok(watcher) => {
                ctx.watcher = Some(watcher);
                ctx.live = Some(live);
                self.state = SessionState::Watching;
                info!(base = %base.display(), "Session watching");
            }
            Err(e) => {
                error!(error = %e, "Failed to start watcher");
                ctx.live = Some(live);
                self.state = SessionState::Connected;
            }
        }
    }

    fn disconnect(&mut self) {
        if self.context.take().is_some() {
            info!("Channel disconnected");
        }
        self.state = SessionState::Disconnected;
    }
}
