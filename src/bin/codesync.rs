//! Codesync Agent Binary
//!
//! Listens for the editor, mirrors its page tree into the base directory, and
//! syncs local edits back until interrupted.

use anyhow::Context;
use clap::Parser;
use codesync::channel::SyncServer;
use codesync::cli::{render_config, Cli};
use codesync::logging::init_logging;
use codesync::session::SessionConfig;
use codesync::transform::TransformPipeline;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let config = cli.resolve_config(&cwd)?;

    if cli.print_config {
        print!("{}", render_config(&config)?);
        return Ok(());
    }

    init_logging(Some(&config.logging))?;

    let session = SessionConfig::from_config(&config);
    let pipeline = TransformPipeline::from_config(&config.bundler);
    info!(
        base = %session.base_dir.display(),
        mode = %session.mode,
        bundler = ?pipeline,
        "Starting codesync"
    );

    let server = SyncServer::bind(&config.server, session, pipeline)
        .await
        .context("Failed to start listener")?;
    let addr = server.local_addr()?;
    if let Some(url) = config.sync.editor_url_for(addr.port()) {
        info!(url = %url, "Open the editor to start syncing");
    }

    tokio::select! {
        result = server.serve() => result.context("Listener stopped")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted; shutting down");
        }
    }
    Ok(())
}
