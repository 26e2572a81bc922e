use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

use crate::SyncError;

pub const DEFAULT_WORKERS: usize = 4;

/// Bounded pool for work the caller should not wait on inline.
///
/// At most `workers` jobs run at once; the rest queue on the semaphore.
pub struct TaskPool {
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl TaskPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn spawn<F, T>(&self, fut: F) -> TaskHandle<T>
    where
        F: Future<Output = Result<T, SyncError>> + Send + 'static,
        T: Send + 'static,
    {
        let token = self.cancel.child_token();
        let task_token = token.clone();
        let permits = self.permits.clone();

        let join = self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => Err(SyncError::Cancelled),
                result = async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|_| SyncError::Cancelled)?;
                    fut.await
                } => result,
            }
        });

        TaskHandle { join, token }
    }

    /// Run a blocking closure on tokio's blocking threads, still bounded by
    /// the pool's permits.
    pub fn spawn_blocking<F, T>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce() -> Result<T, SyncError> + Send + 'static,
        T: Send + 'static,
    {
        self.spawn(async move { tokio::task::spawn_blocking(f).await? })
    }

    /// Cancel everything outstanding and wait for every task to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.cancel.cancel();
        self.tracker.wait().await;
        info!("Task pool shut down");
    }
}

/// Handle to one pooled job. Dropping it detaches the job; its result is
/// then discarded.
pub struct TaskHandle<T> {
    join: JoinHandle<Result<T, SyncError>>,
    token: CancellationToken,
}

impl<T> TaskHandle<T> {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn join(self) -> Result<T, SyncError> {
        self.join.await?
    }
}
