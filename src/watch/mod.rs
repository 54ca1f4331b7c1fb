//! Watch runtime: event classification, per-path ordering, and the live watcher.

mod events;
mod runtime;
mod serializer;

pub use events::{classify_event, PathState, WatchAction, WatchConfig, WatchKind};
pub use runtime::LiveWatcher;
pub use serializer::PathSerializer;
