//! Per-path ordering for concurrent file flows
//!
//! Flows for different paths run concurrently. Flows for the same path run one
//! at a time, in submission order, on a worker task dedicated to that path.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

type Job = BoxFuture<'static, ()>;
type Queues = Arc<Mutex<HashMap<String, Queue>>>;

struct Queue {
    tx: mpsc::UnboundedSender<Job>,
    /// Jobs submitted and not yet finished.
    pending: usize,
}

/// Per-path FIFO executor.
///
/// A worker lives only while its path has work: once the last queued job
/// finishes, the worker removes its entry and exits.
#[derive(Default)]
pub struct PathSerializer {
    /// Map from relative path to the queue of its worker
    queues: Queues,
}

impl PathSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job` behind every earlier job for `path`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F>(&self, path: &str, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut job: Job = Box::pin(job);
        let mut queues = self.queues.lock();

        if let Some(queue) = queues.get_mut(path) {
            match queue.tx.send(job) {
                Ok(()) => {
                    queue.pending += 1;
                    return;
                }
                // Worker died mid-job; start a new one below.
                Err(mpsc::error::SendError(returned)) => job = returned,
            }
        }

        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        // A fresh receiver is alive, so this cannot fail.
        let _ = tx.send(job);
        queues.insert(path.to_string(), Queue { tx, pending: 1 });
        tokio::spawn(run_worker(path.to_string(), rx, Arc::clone(&self.queues)));
    }

    /// Number of paths with a worker.
    pub fn active_paths(&self) -> usize {
        self.queues.lock().len()
    }
}

async fn run_worker(path: String, mut rx: mpsc::UnboundedReceiver<Job>, queues: Queues) {
    while let Some(job) = rx.recv().await {
        job.await;
        // Submit counts under the same lock, so zero here means nothing is
        // queued or about to be.
        if finish_job(&queues, &path) {
            return;
        }
    }
}

/// Returns true when the path has drained and its entry was removed.
fn finish_job(queues: &Queues, path: &str) -> bool {
    let mut queues = queues.lock();
    let Some(queue) = queues.get_mut(path) else {
        return true;
    };
    queue.pending = queue.pending.saturating_sub(1);
    if queue.pending > 0 {
        return false;
    }
    queues.remove(path);
    true
}
