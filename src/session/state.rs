//! Session lifecycle states.

use std::fmt;

/// Where a session is in its lifecycle.
///
/// `Disconnected → Connected → AwaitingFullTree → Watching`. A lost connection
/// returns to `Disconnected` from any state; a full-tree request that is never
/// answered falls back to `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected,
    /// Waiting for the remote tree; `attempts` requests have been sent so far.
    AwaitingFullTree { attempts: u32 },
    Watching,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::AwaitingFullTree { .. } => "awaiting_full_tree",
            SessionState::Watching => "watching",
        }
    }

    /// Whether a full-tree response is acted on in this state.
    pub fn accepts_full_tree(&self) -> bool {
        matches!(
            self,
            SessionState::Connected | SessionState::AwaitingFullTree { .. } | SessionState::Watching
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
