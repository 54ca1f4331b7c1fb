//! Command-line interface.
//!
//! Flags override the layered configuration; see [`Cli::apply_overrides`].

use crate::config::{CodesyncConfig, ConfigLoader};
use crate::error::SyncError;
use crate::types::SyncMode;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Codesync - mirror an online editor's pages onto local disk and sync edits back
#[derive(Debug, Parser)]
#[command(name = "codesync")]
#[command(about = "Mirror an online editor's page tree locally and keep both sides in sync")]
pub struct Cli {
    /// Directory the remote tree is mirrored into
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Which side wins during the initial full sync
    #[arg(long, value_enum)]
    pub mode: Option<SyncMode>,

    /// Port to listen on for the editor
    #[arg(long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Editor URL to log for opening the session
    #[arg(long)]
    pub editor_url: Option<String>,

    /// Disable the vendors.js bundle step
    #[arg(long, default_value = "false")]
    pub no_bundle: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long, default_value = "false")]
    pub print_config: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Load configuration from `--config` or the standard sources rooted at
    /// `workspace_root`, then apply flag overrides.
    pub fn resolve_config(&self, workspace_root: &Path) -> Result<CodesyncConfig, SyncError> {
        let loaded = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(workspace_root),
        };
        let mut config = loaded.map_err(|e| SyncError::Config(e.to_string()))?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut CodesyncConfig) {
        if let Some(dir) = &self.dir {
            config.sync.base_dir = dir.clone();
        }
        if let Some(mode) = self.mode {
            config.sync.mode = mode;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(url) = &self.editor_url {
            config.sync.editor_url = Some(url.clone());
        }
        if self.no_bundle {
            config.bundler.enabled = false;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
    }
}

/// Render `config` as TOML.
pub fn render_config(config: &CodesyncConfig) -> Result<String, SyncError> {
    toml::to_string_pretty(config).map_err(|e| SyncError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "codesync",
            "--dir",
            "site",
            "--mode",
            "push",
            "--port",
            "9100",
            "--log-level",
            "debug",
            "--no-bundle",
        ]);
        let mut config = CodesyncConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.sync.base_dir, PathBuf::from("site"));
        assert_eq!(config.sync.mode, SyncMode::Push);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.logging.level, "debug");
        assert!(!config.bundler.enabled);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["codesync", "--mode", "sideways"]).is_err());
    }

    #[test]
    fn test_render_config_is_toml() {
        let rendered = render_config(&CodesyncConfig::default()).unwrap();
        assert!(rendered.contains("[server]"));
        assert!(rendered.contains("port = 8001"));
        let parsed: CodesyncConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.sync.mode, SyncMode::Pull);
    }
}
