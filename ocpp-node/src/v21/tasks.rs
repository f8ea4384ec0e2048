use core::future::Future;

use tokio_util::task::TaskTracker;

use crate::v21::error::OcppError;

/// Owns the background work handlers start after they have answered, e.g. a
/// TransactionEvent following an accepted RequestStartTransaction. Failures
/// are logged, never dropped silently.
#[derive(Clone, Default)]
pub struct TaskSupervisor {
    tracker: TaskTracker,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), OcppError>> + Send + 'static,
    {
        log::trace!("spawn background task {}", name);
        self.tracker.spawn(async move {
            match task.await {
                Ok(()) => log::debug!("background task {} done", name),
                Err(e) => log::error!("background task {} failed: {}", name, e),
            }
        });
    }

    pub fn running(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting new tasks and waits for the running ones.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
