//! Last-synced content digests, used to drop events that change nothing.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Relative path → blake3 digest of the content both sides last agreed on.
#[derive(Debug, Default)]
pub struct SyncLedger {
    digests: Mutex<HashMap<String, blake3::Hash>>,
}

impl SyncLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed<I, P, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: AsRef<[u8]>,
    {
        let ledger = Self::new();
        for (path, content) in entries {
            ledger.record(path, content);
        }
        ledger
    }

    pub fn record(&self, path: impl Into<String>, content: impl AsRef<[u8]>) {
        let digest = blake3::hash(content.as_ref());
        self.digests.lock().insert(path.into(), digest);
    }

    /// True when `content` is exactly what was last synced for `path`.
    pub fn is_current(&self, path: &str, content: impl AsRef<[u8]>) -> bool {
        let digest = blake3::hash(content.as_ref());
        self.digests.lock().get(path) == Some(&digest)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.digests.lock().contains_key(path)
    }

    pub fn forget(&self, path: &str) -> bool {
        self.digests.lock().remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.digests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.lock().is_empty()
    }
}
