//! Ownership of running connection supervisors.
//!
//! Upgraded WebSocket futures live outside axum's graceful shutdown, so
//! each [`super::serve`] future is spawned into a shared [`JoinSet`] that
//! the binary drains after [`crate::hub::Hub::shutdown`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Tracks connection supervisor tasks until they finish.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl ConnectionTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` and keeps its handle. Finished tasks are reaped on the
    /// way so the set only grows with live connections.
    pub async fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Returns the number of tasks not yet reaped.
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Returns `true` if no task is tracked.
    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    /// Waits up to `deadline` for every tracked task to finish, then aborts
    /// the stragglers. Returns `true` if all tasks finished on their own.
    pub async fn drain(&self, deadline: Duration) -> bool {
        let mut tasks = self.tasks.lock().await;
        let finished = tokio::time::timeout(deadline, async {
            while tasks.join_next().await.is_some() {}
        })
        .await
        .is_ok();
        if !finished {
            tracing::warn!(remaining = tasks.len(), "aborting connections still closing");
            tasks.shutdown().await;
        }
        finished
    }
}
