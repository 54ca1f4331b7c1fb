//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::CodesyncConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file, the workspace file and environment.
    pub fn load(workspace_root: &Path) -> Result<CodesyncConfig, ConfigError> {
        MergeService::load(workspace_root)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<CodesyncConfig, ConfigError> {
        MergeService::load_from_file(path)
    }
}
