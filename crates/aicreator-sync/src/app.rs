use std::sync::Arc;

use tracing::info;

use aicreator_db::Database;
use aicreator_remote::{HttpRemote, RemoteApi};

use crate::config::Config;
use crate::feed::ChangeFeed;
use crate::repo::{ImageRepository, RepoContext, UserRepository, VideoRepository};
use crate::session::Session;
use crate::tasks::TaskPool;
use crate::view::{ImageViewModel, UserViewModel, VideoViewModel};

/// Every long-lived collaborator, built once and shared by reference.
pub struct App {
    pub db: Arc<Database>,
    pub feed: ChangeFeed,
    pub session: Session,
    pub pool: Arc<TaskPool>,
    pub users: UserRepository,
    pub images: ImageRepository,
    pub videos: VideoRepository,
}

impl App {
    /// Open the on-disk store and the HTTP client described by `config`.
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let db = Database::open(&config.db_path)?;
        let remote = HttpRemote::new(config.remote())?;
        info!(
            "API at {}, media in {}",
            config.api_url,
            config.media_dir.display()
        );
        Ok(Self::with_parts(Arc::new(db), Arc::new(remote), config))
    }

    /// Wire the app around an existing store and remote.
    pub fn with_parts(db: Arc<Database>, remote: Arc<dyn RemoteApi>, config: &Config) -> Self {
        let feed = ChangeFeed::new();
        let ctx = RepoContext::new(db.clone(), remote, feed.clone());

        Self {
            db,
            feed,
            session: ctx.session.clone(),
            pool: Arc::new(TaskPool::new(config.workers)),
            users: UserRepository::new(ctx.clone(), config.api_token.clone()),
            images: ImageRepository::new(ctx.clone()),
            videos: VideoRepository::new(ctx, config.media_dir.clone()),
        }
    }

    pub fn user_view(&self) -> UserViewModel {
        UserViewModel::new(self.users.clone(), self.pool.clone())
    }

    pub fn image_view(&self) -> ImageViewModel {
        ImageViewModel::new(self.images.clone(), self.session.clone(), self.pool.clone())
    }

    pub fn video_view(&self) -> VideoViewModel {
        VideoViewModel::new(self.videos.clone(), self.pool.clone())
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
