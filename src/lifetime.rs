//! Lifetime extension for agent event handlers.
//!
//! A host may tear the agent down as soon as an event's handler returns.
//! Handlers therefore register their asynchronous work with the event via
//! [`ExtendableEvent::wait_until`]; the host awaits [`ExtendableEvent::settled`]
//! and only considers the event finished once every registered task ended.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// An event whose lifetime can be extended by the work it triggers.
#[derive(Debug, Clone)]
pub struct ExtendableEvent {
    kind: &'static str,
    tracker: TaskTracker,
}

impl ExtendableEvent {
    /// A new event of the given kind (`"activate"`, `"push"`, ...).
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            tracker: TaskTracker::new(),
        }
    }

    /// Event kind, for logging.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Keep the event alive until `task` completes.
    ///
    /// The task is spawned on the current tokio runtime; its output is
    /// available through the returned handle.
    pub fn wait_until<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Number of registered tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Resolve once every task registered so far has finished.
    ///
    /// Tasks registered by other tasks before they finish are waited for too.
    pub async fn settled(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
