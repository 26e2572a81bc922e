use std::path::Path;

use tracing::{debug, error, info, warn};

use aicreator_types::api::GenerateImageRequest;
use aicreator_types::events::{StoreEvent, Table};
use aicreator_types::models::GeneratedImage;

use crate::feed::LiveQuery;
use crate::repo::RepoContext;
use crate::{SyncError, run_blocking, validation};

#[derive(Clone)]
pub struct ImageRepository {
    ctx: RepoContext,
}

impl ImageRepository {
    pub fn new(ctx: RepoContext) -> Self {
        Self { ctx }
    }

    /// Ask the backend for an image and mirror the result on success.
    ///
    /// Nothing is written locally when the request fails. The owning user
    /// must already be in the local store.
    pub async fn generate(&self, req: GenerateImageRequest) -> Result<GeneratedImage, SyncError> {
        validation::image_request(&req)?;

        let user_id = req.user_id;
        let known = run_blocking(&self.ctx.db, move |db| db.get_user(user_id)).await?;
        if known.is_none() {
            warn!("Image generation for user {} who is not stored locally", user_id);
            return Err(SyncError::Validation(format!("Unknown user {}", user_id)));
        }

        let image = self.ctx.remote.generate_image(&req).await.map_err(|e| {
            warn!("Image generation for user {} failed: {}", user_id, e);
            SyncError::from(e)
        })?;

        let record = image.clone();
        match run_blocking(&self.ctx.db, move |db| db.upsert_image(&record)).await {
            Ok(()) => {
                info!("Stored generated image {} for user {}", image.id, image.user_id);
                self.ctx.feed.publish(StoreEvent::ImageSaved {
                    id: image.id,
                    user_id: image.user_id,
                });
            }
            Err(e) => error!("Could not mirror image {} locally: {}", image.id, e),
        }
        Ok(image)
    }

    pub fn user_images(&self, user_id: i64) -> LiveQuery<Vec<GeneratedImage>> {
        self.ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Images, Some(user_id), move |db| {
                db.images_by_user(user_id)
            })
    }

    pub fn favorite_images(&self, user_id: i64) -> LiveQuery<Vec<GeneratedImage>> {
        self.ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Images, Some(user_id), move |db| {
                db.favorite_images(user_id)
            })
    }

    /// Newest images across all users.
    pub fn recent_images(&self, limit: u32) -> LiveQuery<Vec<GeneratedImage>> {
        self.ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Images, None, move |db| {
                db.recent_images(limit)
            })
    }

    /// Images whose prompt contains `query`.
    pub fn search(&self, query: &str) -> LiveQuery<Vec<GeneratedImage>> {
        let query = query.to_string();
        self.ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Images, None, move |db| {
                db.search_images(&query)
            })
    }

    pub fn image(&self, id: i64) -> LiveQuery<Option<GeneratedImage>> {
        self.ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Images, None, move |db| {
                db.get_image(id)
            })
    }

    /// Local only; the backend has no favorite flag.
    pub async fn set_favorite(&self, id: i64, is_favorite: bool) -> Result<(), SyncError> {
        let updated =
            run_blocking(&self.ctx.db, move |db| db.set_image_favorite(id, is_favorite)).await?;
        if updated > 0 {
            debug!("Image {} favorite = {}", id, is_favorite);
            self.ctx.feed.publish(StoreEvent::ImageUpdated { id });
        }
        Ok(())
    }

    /// Remember where the image was saved on this device.
    pub async fn set_local_path(&self, id: i64, path: &Path) -> Result<(), SyncError> {
        let path = path.to_string_lossy().into_owned();
        let updated =
            run_blocking(&self.ctx.db, move |db| db.set_image_local_path(id, &path)).await?;
        if updated > 0 {
            self.ctx.feed.publish(StoreEvent::ImageUpdated { id });
        }
        Ok(())
    }

    /// Remove the local row, then ask the backend to delete its copy.
    /// A remote failure is logged; the local row stays gone.
    pub async fn delete(&self, id: i64) -> Result<(), SyncError> {
        let removed = run_blocking(&self.ctx.db, move |db| db.delete_image(id)).await?;
        if removed == 0 {
            debug!("Image {} not stored, nothing to delete", id);
            return Ok(());
        }
        self.ctx.feed.publish(StoreEvent::ImageDeleted { id });
        info!("Deleted local image {}", id);

        if let Err(e) = self.ctx.remote.delete_image(id).await {
            warn!("Remote delete of image {} failed: {}", id, e);
        }
        Ok(())
    }
}
