use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use aicreator_db::models::NewVideo;
use aicreator_types::api::{PredictionStatus, VideoJobRequest, VideoSubmission};
use aicreator_types::events::{StoreEvent, Table};
use aicreator_types::models::GeneratedVideo;

use crate::feed::LiveQuery;
use crate::repo::RepoContext;
use crate::{SyncError, run_blocking, validation};

/// Status used when the backend accepted the request but the job itself
/// did not produce a video.
const JOB_FAILED_STATUS: u16 = 502;

/// Outcome of a video submission.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoGeneration {
    /// Downloaded and stored.
    Saved(GeneratedVideo),
    /// Accepted but still running. Nothing is stored; there is no polling.
    Pending {
        job_id: String,
        status: PredictionStatus,
    },
}

#[derive(Clone)]
pub struct VideoRepository {
    ctx: RepoContext,
    media_dir: PathBuf,
}

impl VideoRepository {
    pub fn new(ctx: RepoContext, media_dir: PathBuf) -> Self {
        Self { ctx, media_dir }
    }

    /// Submit `req` for the session user. A ready result is downloaded into
    /// the media directory and stored.
    pub async fn generate(&self, req: VideoJobRequest) -> Result<VideoGeneration, SyncError> {
        validation::video_request(&req)?;

        let user_id = self.ctx.session.require_user_id().await?;
        let token = self
            .ctx
            .session
            .access_token()
            .await?
            .ok_or_else(|| SyncError::Validation("No API access token configured".into()))?;

        let submission = self
            .ctx
            .remote
            .generate_video(&token, &req)
            .await
            .map_err(|e| {
                warn!("Video submission for user {} failed: {}", user_id, e);
                SyncError::from(e)
            })?;

        match submission {
            VideoSubmission::Ready { video_url } => {
                let video = self.download_and_store(user_id, &req, &video_url).await?;
                Ok(VideoGeneration::Saved(video))
            }
            VideoSubmission::Job(job) if job.status.is_processing() => {
                info!("Video job {} is {:?}", job.id, job.status);
                Ok(VideoGeneration::Pending {
                    job_id: job.id,
                    status: job.status,
                })
            }
            VideoSubmission::Job(job) => {
                let message = job
                    .error
                    .unwrap_or_else(|| format!("video job {} ended as {:?}", job.id, job.status));
                warn!("Video job {} failed: {}", job.id, message);
                Err(SyncError::Rejected {
                    status: JOB_FAILED_STATUS,
                    message,
                })
            }
        }
    }

    async fn download_and_store(
        &self,
        user_id: i64,
        req: &VideoJobRequest,
        url: &str,
    ) -> Result<GeneratedVideo, SyncError> {
        let created_at = Utc::now();
        let dest = self.media_dir.join(video_file_name(created_at));

        let bytes = self.ctx.remote.download(url, &dest).await?;
        debug!("Downloaded {} bytes to {}", bytes, dest.display());

        let video = GeneratedVideo {
            id: 0,
            user_id,
            video_path: dest.to_string_lossy().into_owned(),
            source_image_path: req.source_image_path.to_string_lossy().into_owned(),
            video_style: req.style,
            duration: req.duration,
            motion_intensity: req.motion_intensity,
            created_at,
            is_favorite: false,
        };

        match self.insert(video).await {
            Ok(stored) => Ok(stored),
            Err(e) => {
                error!("Could not store downloaded video {}: {}", dest.display(), e);
                remove_media(&dest).await;
                Err(e)
            }
        }
    }

    /// Every video owned by the session user.
    pub async fn user_videos(&self) -> Result<LiveQuery<Vec<GeneratedVideo>>, SyncError> {
        let user_id = self.ctx.session.require_user_id().await?;
        Ok(self
            .ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Videos, Some(user_id), move |db| {
                db.videos_by_user(user_id)
            }))
    }

    pub async fn favorite_videos(&self) -> Result<LiveQuery<Vec<GeneratedVideo>>, SyncError> {
        let user_id = self.ctx.session.require_user_id().await?;
        Ok(self
            .ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Videos, Some(user_id), move |db| {
                db.favorite_videos(user_id)
            }))
    }

    pub fn video(&self, id: i64) -> LiveQuery<Option<GeneratedVideo>> {
        self.ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Videos, None, move |db| {
                db.get_video(id)
            })
    }

    /// Store a video produced elsewhere under the session user.
    /// `id` and `user_id` of the argument are ignored.
    pub async fn save(&self, mut video: GeneratedVideo) -> Result<GeneratedVideo, SyncError> {
        video.user_id = self.ctx.session.require_user_id().await?;
        if video.motion_intensity > validation::MAX_MOTION_INTENSITY {
            return Err(SyncError::Validation(format!(
                "Motion intensity must be at most {}",
                validation::MAX_MOTION_INTENSITY
            )));
        }
        self.insert(video).await
    }

    /// Overwrite every column of an existing row.
    pub async fn update(&self, video: GeneratedVideo) -> Result<(), SyncError> {
        let id = video.id;
        let updated = run_blocking(&self.ctx.db, move |db| db.update_video(&video)).await?;
        if updated > 0 {
            self.ctx.feed.publish(StoreEvent::VideoUpdated { id });
        }
        Ok(())
    }

    pub async fn set_favorite(&self, id: i64, is_favorite: bool) -> Result<(), SyncError> {
        let updated =
            run_blocking(&self.ctx.db, move |db| db.set_video_favorite(id, is_favorite)).await?;
        if updated > 0 {
            debug!("Video {} favorite = {}", id, is_favorite);
            self.ctx.feed.publish(StoreEvent::VideoUpdated { id });
        }
        Ok(())
    }

    /// Remove the media file, then the row. A file that cannot be removed
    /// is logged and does not stop the row delete.
    pub async fn delete(&self, id: i64) -> Result<(), SyncError> {
        let Some(video) = run_blocking(&self.ctx.db, move |db| db.get_video(id)).await? else {
            debug!("Video {} not stored, nothing to delete", id);
            return Ok(());
        };

        if !video.video_path.is_empty() {
            remove_media(Path::new(&video.video_path)).await;
        }

        let removed = run_blocking(&self.ctx.db, move |db| db.delete_video(id)).await?;
        if removed > 0 {
            info!("Deleted video {}", id);
            self.ctx.feed.publish(StoreEvent::VideoDeleted { id });
        }
        Ok(())
    }

    async fn insert(&self, video: GeneratedVideo) -> Result<GeneratedVideo, SyncError> {
        let stored = run_blocking(&self.ctx.db, move |db| {
            let id = db.insert_video(&NewVideo {
                user_id: video.user_id,
                video_path: &video.video_path,
                source_image_path: &video.source_image_path,
                video_style: video.video_style,
                duration: video.duration,
                motion_intensity: video.motion_intensity,
                created_at: video.created_at,
            })?;
            Ok(GeneratedVideo { id, ..video })
        })
        .await?;

        info!("Stored video {} for user {}", stored.id, stored.user_id);
        self.ctx.feed.publish(StoreEvent::VideoSaved {
            id: stored.id,
            user_id: stored.user_id,
        });
        Ok(stored)
    }
}

async fn remove_media(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Media file {} already gone", path.display());
        }
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}

/// Name of the downloaded file for a video created at `at`.
pub fn video_file_name(at: DateTime<Utc>) -> String {
    format!("video_{}.mp4", at.timestamp_millis())
}
