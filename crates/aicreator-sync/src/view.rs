//! Observable operation state for screens.
//!
//! A view model starts repository work on the [`TaskPool`] and publishes
//! its progress through a [`ViewState`]. Screens only watch the state; they
//! never talk to repositories directly.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::error;

use aicreator_types::api::{GenerateImageRequest, LoginRequest, RegisterRequest, VideoJobRequest};
use aicreator_types::models::{GeneratedImage, User, VideoStyle};

use crate::repo::{ImageRepository, UserRepository, VideoGeneration, VideoRepository};
use crate::session::Session;
use crate::tasks::{TaskHandle, TaskPool};
use crate::SyncError;

#[derive(Debug, Clone, PartialEq)]
pub enum OpState<T> {
    Idle,
    Loading,
    Ready(T),
    /// Carries [`SyncError::user_message`].
    Failed(String),
}

impl<T> OpState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

pub struct ViewState<T> {
    tx: watch::Sender<OpState<T>>,
}

impl<T: Clone + Send + Sync + 'static> Default for ViewState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> ViewState<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(OpState::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<OpState<T>> {
        self.tx.subscribe()
    }

    pub fn get(&self) -> OpState<T> {
        self.tx.borrow().clone()
    }

    pub fn reset(&self) {
        self.tx.send_replace(OpState::Idle);
    }

    /// Show `Loading`, run `fut` on the pool, then show the outcome.
    pub fn run<F>(&self, pool: &TaskPool, fut: F) -> TaskHandle<T>
    where
        F: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        self.tx.send_replace(OpState::Loading);
        let mut guard = Outcome {
            tx: self.tx.clone(),
            settled: false,
        };

        pool.spawn(async move {
            let result = fut.await;
            guard.settle(&result);
            result
        })
    }
}

/// Publishes the result, or `Cancelled` if the job is dropped first.
struct Outcome<T> {
    tx: watch::Sender<OpState<T>>,
    settled: bool,
}

impl<T: Clone> Outcome<T> {
    fn settle(&mut self, result: &Result<T, SyncError>) {
        self.settled = true;
        let state = match result {
            Ok(value) => OpState::Ready(value.clone()),
            Err(e) => {
                error!("Operation failed: {}", e);
                OpState::Failed(e.user_message())
            }
        };
        self.tx.send_replace(state);
    }
}

impl<T> Drop for Outcome<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.tx
                .send_replace(OpState::Failed(SyncError::Cancelled.user_message()));
        }
    }
}

/// Login and registration screens.
pub struct UserViewModel {
    repo: UserRepository,
    pool: Arc<TaskPool>,
    pub auth: ViewState<User>,
}

impl UserViewModel {
    pub fn new(repo: UserRepository, pool: Arc<TaskPool>) -> Self {
        Self {
            repo,
            pool,
            auth: ViewState::new(),
        }
    }

    pub fn register(&self, username: &str, password: &str, email: &str) -> TaskHandle<User> {
        let repo = self.repo.clone();
        let req = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        };
        self.auth.run(&self.pool, async move { repo.register(req).await })
    }

    pub fn login(&self, username: &str, password: &str) -> TaskHandle<User> {
        let repo = self.repo.clone();
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.auth.run(&self.pool, async move { repo.login(req).await })
    }
}

/// Text-to-image screen.
pub struct ImageViewModel {
    repo: ImageRepository,
    session: Session,
    pool: Arc<TaskPool>,
    pub generation: ViewState<GeneratedImage>,
}

impl ImageViewModel {
    pub fn new(repo: ImageRepository, session: Session, pool: Arc<TaskPool>) -> Self {
        Self {
            repo,
            session,
            pool,
            generation: ViewState::new(),
        }
    }

    /// Generate for the session user.
    pub fn generate(
        &self,
        prompt: &str,
        (width, height): (u32, u32),
        creativity_level: f32,
    ) -> TaskHandle<GeneratedImage> {
        let repo = self.repo.clone();
        let session = self.session.clone();
        let prompt = prompt.to_string();
        self.generation.run(&self.pool, async move {
            let user_id = session.require_user_id().await?;
            repo.generate(GenerateImageRequest {
                user_id,
                prompt,
                width,
                height,
                creativity_level,
            })
            .await
        })
    }

    pub fn set_favorite(&self, id: i64, is_favorite: bool) -> TaskHandle<()> {
        let repo = self.repo.clone();
        self.pool
            .spawn(async move { repo.set_favorite(id, is_favorite).await })
    }

    pub fn delete(&self, id: i64) -> TaskHandle<()> {
        let repo = self.repo.clone();
        self.pool.spawn(async move { repo.delete(id).await })
    }
}

/// Image-to-video screen.
pub struct VideoViewModel {
    repo: VideoRepository,
    pool: Arc<TaskPool>,
    pub generation: ViewState<VideoGeneration>,
}

impl VideoViewModel {
    pub fn new(repo: VideoRepository, pool: Arc<TaskPool>) -> Self {
        Self {
            repo,
            pool,
            generation: ViewState::new(),
        }
    }

    pub fn generate(
        &self,
        source_image: std::path::PathBuf,
        style: VideoStyle,
        duration: u32,
        motion_intensity: u8,
    ) -> TaskHandle<VideoGeneration> {
        let repo = self.repo.clone();
        let req = VideoJobRequest {
            source_image_path: source_image,
            style,
            duration,
            motion_intensity,
        };
        self.generation
            .run(&self.pool, async move { repo.generate(req).await })
    }

    pub fn set_favorite(&self, id: i64, is_favorite: bool) -> TaskHandle<()> {
        let repo = self.repo.clone();
        self.pool
            .spawn(async move { repo.set_favorite(id, is_favorite).await })
    }

    pub fn delete(&self, id: i64) -> TaskHandle<()> {
        let repo = self.repo.clone();
        self.pool.spawn(async move { repo.delete(id).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn success_goes_loading_then_ready() {
        let pool = TaskPool::new(1);
        let state: ViewState<u32> = ViewState::new();
        assert_eq!(state.get(), OpState::Idle);

        let (release, wait) = tokio::sync::oneshot::channel::<()>();
        let handle = state.run(&pool, async move {
            let _ = wait.await;
            Ok(7)
        });
        assert!(state.get().is_loading());

        release.send(()).unwrap();
        assert_eq!(handle.join().await.unwrap(), 7);
        assert_eq!(state.get(), OpState::Ready(7));
    }

    #[tokio::test]
    async fn failure_shows_user_message() {
        let pool = TaskPool::new(1);
        let state: ViewState<u32> = ViewState::new();
        let handle = state.run(&pool, async { Err(SyncError::NotLoggedIn) });

        assert_eq!(handle.join().await, Err(SyncError::NotLoggedIn));
        assert_eq!(state.get(), OpState::Failed("Please log in first".into()));
    }

    #[tokio::test]
    async fn cancel_settles_state() {
        let pool = TaskPool::new(1);
        let state: ViewState<u32> = ViewState::new();
        let mut rx = state.subscribe();

        let handle = state.run(&pool, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        });
        handle.cancel();
        assert_eq!(handle.join().await, Err(SyncError::Cancelled));

        rx.wait_for(|s| !s.is_loading()).await.unwrap();
        assert_eq!(state.get(), OpState::Failed("Operation cancelled".into()));
    }
}
