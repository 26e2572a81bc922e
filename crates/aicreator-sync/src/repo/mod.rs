pub mod image;
pub mod user;
pub mod video;

use std::sync::Arc;

use aicreator_db::Database;
use aicreator_remote::RemoteApi;

use crate::feed::ChangeFeed;
use crate::session::Session;

pub use image::ImageRepository;
pub use user::UserRepository;
pub use video::{VideoGeneration, VideoRepository};

/// Collaborators shared by every repository. Built once by the app and
/// handed to each repository; nothing here is global.
#[derive(Clone)]
pub struct RepoContext {
    pub db: Arc<Database>,
    pub remote: Arc<dyn RemoteApi>,
    pub feed: ChangeFeed,
    pub session: Session,
}

impl RepoContext {
    pub fn new(db: Arc<Database>, remote: Arc<dyn RemoteApi>, feed: ChangeFeed) -> Self {
        let session = Session::new(db.clone(), feed.clone());
        Self {
            db,
            remote,
            feed,
            session,
        }
    }
}
