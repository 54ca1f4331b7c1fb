//! External bundler invocation.

use crate::error::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Output module format requested from the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    #[default]
    Umd,
}

impl ModuleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleFormat::Umd => "umd",
        }
    }
}

/// Inputs for one bundle build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    pub entry_file: PathBuf,
    pub output_dir: PathBuf,
    pub output_file_name: String,
    pub module_format: ModuleFormat,
}

impl BundleRequest {
    /// Where the bundler is expected to leave its single output file.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }

    /// Global name for the UMD wrapper, derived from the output file stem.
    pub fn bundle_name(&self) -> String {
        Path::new(&self.output_file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string())
    }
}

/// A black-box build step producing a single self-contained file.
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Build `request.entry_file` into `request.output_path()`.
    async fn bundle(&self, request: &BundleRequest) -> Result<(), SyncError>;
}

/// Bundler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerConfig {
    /// Run the bundle step at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// File name that triggers bundling
    #[serde(default = "default_trigger_file")]
    pub trigger_file: String,

    /// Program to run
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments; `{entry}`, `{output}`, `{output_dir}`, `{output_file}`,
    /// `{format}` and `{name}` are substituted
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Give up on a build after this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_trigger_file() -> String {
    "vendors.js".to_string()
}

fn default_program() -> String {
    "npx".to_string()
}

fn default_args() -> Vec<String> {
    [
        "rollup", "{entry}", "--format", "{format}", "--name", "{name}", "--file", "{output}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            trigger_file: default_trigger_file(),
            program: default_program(),
            args: default_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Runs the configured program as a child process.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    program: String,
    args: Vec<String>,
}

impl CommandBundler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &BundlerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    /// Arguments with placeholders filled in for `request`.
    pub fn render_args(&self, request: &BundleRequest) -> Vec<String> {
        let entry = request.entry_file.to_string_lossy();
        let output = request.output_path();
        let output = output.to_string_lossy();
        let output_dir = request.output_dir.to_string_lossy();
        let name = request.bundle_name();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{entry}", &entry)
                    .replace("{output_dir}", &output_dir)
                    .replace("{output_file}", &request.output_file_name)
                    .replace("{output}", &output)
                    .replace("{format}", request.module_format.as_str())
                    .replace("{name}", &name)
            })
            .collect()
    }
}

#[async_trait]
impl Bundler for CommandBundler {
    async fn bundle(&self, request: &BundleRequest) -> Result<(), SyncError> {
        let args = self.render_args(request);
        debug!(program = %self.program, args = ?args, "Running bundler");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SyncError::Bundle(format!("failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "Bundler failed");
            return Err(SyncError::Bundle(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BundleRequest {
        BundleRequest {
            entry_file: PathBuf::from("/w/public/vendors.js"),
            output_dir: PathBuf::from("/tmp/out"),
            output_file_name: "vendors.js".to_string(),
            module_format: ModuleFormat::Umd,
        }
    }

    #[test]
    fn test_render_default_args() {
        let bundler = CommandBundler::from_config(&BundlerConfig::default());
        assert_eq!(
            bundler.render_args(&request()),
            vec![
                "rollup",
                "/w/public/vendors.js",
                "--format",
                "umd",
                "--name",
                "vendors",
                "--file",
                "/tmp/out/vendors.js",
            ]
        );
    }

    #[test]
    fn test_render_output_parts() {
        let bundler = CommandBundler::new(
            "parcel",
            vec!["--dist-dir={output_dir}".to_string(), "--out={output_file}".to_string()],
        );
        assert_eq!(
            bundler.render_args(&request()),
            vec!["--dist-dir=/tmp/out", "--out=vendors.js"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_bundler_runs_program() {
        let temp = tempfile::TempDir::new().unwrap();
        let entry = temp.path().join("vendors.js");
        std::fs::write(&entry, "export default 1;").unwrap();
        let out_dir = temp.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();

        let request = BundleRequest {
            entry_file: entry,
            output_dir: out_dir,
            output_file_name: "vendors.js".to_string(),
            module_format: ModuleFormat::Umd,
        };
        let bundler = CommandBundler::new(
            "sh",
            vec!["-c".to_string(), "cp \"$0\" \"$1\"".to_string(), "{entry}".to_string(), "{output}".to_string()],
        );
        bundler.bundle(&request).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(request.output_path()).unwrap(),
            "export default 1;"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_bundler_reports_failure() {
        let bundler = CommandBundler::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
        let err = bundler.bundle(&request()).await.unwrap_err();
        assert!(matches!(err, SyncError::Bundle(_)));
    }
}
