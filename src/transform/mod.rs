//! Build transforms applied to files before they are sent upstream.
//!
//! Most files pass through untouched. The vendor entry file (`vendors.js` by
//! default) is bundled into a single UMD file and its bundle is sent instead
//! of the raw source.

pub mod bundler;

pub use bundler::{BundleRequest, Bundler, BundlerConfig, CommandBundler, ModuleFormat};

use crate::error::SyncError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Final payload for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub remote_path: String,
    pub content: String,
    pub bundled: bool,
}

/// Applies the optional bundle step.
#[derive(Clone)]
pub struct TransformPipeline {
    bundler: Option<Arc<dyn Bundler>>,
    trigger_file: String,
    timeout: Duration,
}

impl TransformPipeline {
    /// Identity pipeline.
    pub fn passthrough() -> Self {
        Self {
            bundler: None,
            trigger_file: String::new(),
            timeout: Duration::from_secs(0),
        }
    }

    pub fn new(bundler: Arc<dyn Bundler>, trigger_file: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bundler: Some(bundler),
            trigger_file: trigger_file.into(),
            timeout,
        }
    }

    pub fn from_config(config: &BundlerConfig) -> Self {
        if !config.enabled {
            return Self::passthrough();
        }
        Self::new(
            Arc::new(CommandBundler::from_config(config)),
            config.trigger_file.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// True when `abs_path` is the file that gets bundled.
    pub fn applies_to(&self, abs_path: &Path) -> bool {
        self.bundler.is_some()
            && abs_path
                .file_name()
                .map(|name| name == self.trigger_file.as_str())
                .unwrap_or(false)
    }

    /// Produce the payload to send for a file.
    ///
    /// A bundle failure is returned to the caller, who skips sending that file.
    pub async fn transform(
        &self,
        remote_path: &str,
        content: String,
        abs_path: &Path,
    ) -> Result<Transformed, SyncError> {
        let bundler = match &self.bundler {
            Some(bundler) if self.applies_to(abs_path) => bundler,
            _ => {
                return Ok(Transformed {
                    remote_path: remote_path.to_string(),
                    content,
                    bundled: false,
                })
            }
        };

        // Dropping the temp dir removes the artifact on every exit path.
        let out_dir = tempfile::Builder::new()
            .prefix("codesync-bundle-")
            .tempdir()
            .map_err(|e| SyncError::Bundle(format!("failed to create output dir: {}", e)))?;

        let request = BundleRequest {
            entry_file: abs_path.to_path_buf(),
            output_dir: out_dir.path().to_path_buf(),
            output_file_name: self.trigger_file.clone(),
            module_format: ModuleFormat::Umd,
        };

        debug!(entry = %abs_path.display(), "Bundling");
        match tokio::time::timeout(self.timeout, bundler.bundle(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SyncError::Bundle(format!(
                    "bundler timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        }

        let output_path = request.output_path();
        let bundle = tokio::fs::read_to_string(&output_path).await.map_err(|e| {
            SyncError::Bundle(format!(
                "bundle output {} unreadable: {}",
                output_path.display(),
                e
            ))
        })?;

        info!(
            entry = %abs_path.display(),
            source_bytes = content.len(),
            bundle_bytes = bundle.len(),
            "Bundled vendor file"
        );
        Ok(Transformed {
            remote_path: remote_path.to_string(),
            content: bundle,
            bundled: true,
        })
    }
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("bundler", &self.bundler.is_some())
            .field("trigger_file", &self.trigger_file)
            .field("timeout", &self.timeout)
            .finish()
    }
}
