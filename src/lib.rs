//! Codesync: Local Mirror for an Online Page Editor
//!
//! Materializes the editor's page tree into a local directory, reconciles it
//! with what is already on disk, and streams local edits back over a duplex
//! channel, translating local paths to remote page addresses on the way.

pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod paths;
pub mod reconcile;
pub mod session;
pub mod transform;
pub mod tree;
pub mod types;
pub mod watch;
