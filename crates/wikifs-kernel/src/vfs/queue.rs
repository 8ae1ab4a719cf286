//! Per-root operation lanes.
//!
//! Every operation against a root runs on that root's [`OperationQueue`]:
//! one worker task pulls jobs in submission order and runs each to
//! completion before starting the next. Different roots get different
//! lanes and proceed independently.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use super::error::{WikiError, WikiResult};
use super::paths::Root;

type Job = BoxFuture<'static, ()>;

/// A FIFO execution lane.
///
/// Jobs keep running when the submitting caller stops waiting; there is no
/// cancellation and no timeout.
#[derive(Clone)]
pub struct OperationQueue {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Job>,
}

impl std::fmt::Debug for OperationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationQueue")
            .field("name", &self.name)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl OperationQueue {
    /// Start a lane on the current tokio runtime.
    pub fn spawn(name: impl Into<Arc<str>>) -> Self {
        let name: Arc<str> = name.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let lane = Arc::clone(&name);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                    tracing::error!(lane = %lane, "operation panicked");
                }
            }
            tracing::trace!(lane = %lane, "operation lane stopped");
        });

        Self { name, tx }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the worker is gone (e.g. its runtime shut down).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Queue `action` behind everything already submitted and await its result.
    pub async fn enqueue<F, T>(&self, action: F) -> WikiResult<T>
    where
        F: Future<Output = WikiResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job = async move {
            // The caller may have given up; the work still happened.
            let _ = done_tx.send(action.await);
        }
        .boxed();

        tracing::trace!(lane = %self.name, "enqueue");
        self.tx
            .send(job)
            .map_err(|_| WikiError::QueueClosed(self.name.to_string()))?;

        done_rx
            .await
            .map_err(|_| WikiError::QueueClosed(self.name.to_string()))?
    }
}

/// Lazily populated map from root directory to its lane.
///
/// The lock only guards lookup and insertion; the lanes serialize the I/O.
#[derive(Debug, Default)]
pub struct QueueRegistry {
    lanes: Mutex<HashMap<PathBuf, OperationQueue>>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lane for `root`, created on first use.
    ///
    /// A lane whose worker has stopped is replaced.
    pub fn lane(&self, root: &Root) -> OperationQueue {
        let mut lanes = self.lanes.lock();
        if let Some(lane) = lanes.get(&root.real_directory) {
            if !lane.is_closed() {
                return lane.clone();
            }
        }

        let lane = OperationQueue::spawn(root.real_directory.display().to_string());
        lanes.insert(root.real_directory.clone(), lane.clone());
        lane
    }

    /// Number of lanes created so far.
    pub fn len(&self) -> usize {
        self.lanes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.lock().is_empty()
    }
}
