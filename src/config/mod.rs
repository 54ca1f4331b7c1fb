//! Configuration
//!
//! Layered settings for the agent. Sources, lowest to highest precedence:
//! built-in defaults, the global `config.toml`, the workspace `codesync.toml`,
//! `CODESYNC__SECTION__KEY` environment variables, then CLI overrides applied
//! by the binary.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;
pub use merge::service::MergeService;

use crate::channel::ServerConfig;
use crate::error::SyncError;
use crate::logging::LoggingConfig;
use crate::transform::BundlerConfig;
use crate::types::SyncMode;
use crate::watch::WatchConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Full agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodesyncConfig {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub bundler: BundlerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodesyncConfig {
    /// Reject settings that would leave the agent unable to run.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.sync.base_dir.as_os_str().is_empty() {
            return Err(SyncError::Config("sync.base_dir must not be empty".to_string()));
        }
        if self.sync.full_tree_timeout_secs == 0 {
            return Err(SyncError::Config(
                "sync.full_tree_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.sync.max_full_tree_requests == 0 {
            return Err(SyncError::Config(
                "sync.max_full_tree_requests must be at least 1".to_string(),
            ));
        }
        if self.bundler.enabled && self.bundler.program.trim().is_empty() {
            return Err(SyncError::Config(
                "bundler.program must be set when the bundler is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sync behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory the remote tree is mirrored into
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// push, pull, or mirror
    #[serde(default)]
    pub mode: SyncMode,

    /// Editor page to open against this agent; logged at startup
    #[serde(default)]
    pub editor_url: Option<String>,

    #[serde(default = "default_full_tree_timeout_secs")]
    pub full_tree_timeout_secs: u64,

    /// Full-tree requests per connection, the first one included
    #[serde(default = "default_max_full_tree_requests")]
    pub max_full_tree_requests: u32,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("codesync")
}

fn default_full_tree_timeout_secs() -> u64 {
    30
}

fn default_max_full_tree_requests() -> u32 {
    3
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            mode: SyncMode::default(),
            editor_url: None,
            full_tree_timeout_secs: default_full_tree_timeout_secs(),
            max_full_tree_requests: default_max_full_tree_requests(),
        }
    }
}

impl SyncConfig {
    /// Editor URL carrying the agent's port, if an editor URL is configured.
    pub fn editor_url_for(&self, port: u16) -> Option<String> {
        let url = self.editor_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let joiner = if url.contains('?') { '&' } else { '?' };
        Some(format!("{}{}codesync={}", url, joiner, port))
    }
}
