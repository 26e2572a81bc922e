use chrono::Utc;
use tracing::{debug, error, info, warn};

use aicreator_types::api::{LoginRequest, RegisterRequest, UpdateUserRequest};
use aicreator_types::events::{StoreEvent, Table};
use aicreator_types::models::User;

use crate::feed::LiveQuery;
use crate::repo::RepoContext;
use crate::{SyncError, run_blocking, validation};

#[derive(Clone)]
pub struct UserRepository {
    ctx: RepoContext,
    /// Stored with the session at login; the video endpoint needs it.
    api_token: Option<String>,
}

impl UserRepository {
    pub fn new(ctx: RepoContext, api_token: Option<String>) -> Self {
        Self { ctx, api_token }
    }

    /// Create the account remotely, then mirror it locally.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, SyncError> {
        validation::registration(&req)?;

        let mut user = self.ctx.remote.register(&req).await.map_err(|e| {
            warn!("Registration of {} failed: {}", req.username, e);
            SyncError::from(e)
        })?;
        if user.password.is_empty() {
            user.password = req.password;
        }

        self.mirror(&user).await;
        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Authenticate remotely, mirror the user, refresh `last_login` and
    /// start the session.
    pub async fn login(&self, req: LoginRequest) -> Result<User, SyncError> {
        validation::login(&req)?;

        let mut user = self.ctx.remote.login(&req).await.map_err(|e| {
            warn!("Login for {} failed: {}", req.username, e);
            SyncError::from(e)
        })?;
        if user.password.is_empty() {
            user.password = req.password;
        }

        let now = Utc::now();
        let record = user.clone();
        let stored = run_blocking(&self.ctx.db, move |db| {
            let displaced = db.upsert_user(&record)?;
            db.update_last_login(record.id, now)?;
            Ok(displaced)
        })
        .await;
        match stored {
            Ok(displaced) => {
                user.last_login = Some(now);
                self.saved(user.id, displaced);
            }
            Err(e) => error!("Could not mirror user {} locally: {}", user.id, e),
        }

        self.ctx.session.login(&user, self.api_token.clone()).await?;
        info!("User {} logged in", user.username);
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), SyncError> {
        self.ctx.session.logout().await
    }

    /// The stored row for the session user, if any.
    pub async fn current_user(&self) -> Result<Option<User>, SyncError> {
        let Some(id) = self.ctx.session.current_user_id().await? else {
            return Ok(None);
        };
        run_blocking(&self.ctx.db, move |db| db.get_user(id)).await
    }

    pub fn user(&self, id: i64) -> LiveQuery<Option<User>> {
        self.ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Users, Some(id), move |db| {
                db.get_user(id)
            })
    }

    pub fn users(&self) -> LiveQuery<Vec<User>> {
        self.ctx
            .feed
            .watch(self.ctx.db.clone(), Table::Users, None, |db| db.list_users())
    }

    /// Write the profile locally, then try the remote update. The two are
    /// independent: a remote failure leaves the local change in place.
    pub async fn update_profile(&self, user: User) -> Result<(), SyncError> {
        validation::profile(&user.username, &user.email, &user.password)?;

        let id = user.id;
        let req = UpdateUserRequest {
            username: user.username.clone(),
            password: user.password.clone(),
            email: user.email.clone(),
        };

        let updated = run_blocking(&self.ctx.db, move |db| db.update_user(&user)).await?;
        if updated == 0 {
            warn!("Profile update for unknown local user {}", id);
        } else {
            self.ctx.feed.publish(StoreEvent::UserSaved { id });
        }

        match self.ctx.remote.update_user(id, &req).await {
            Ok(_) => debug!("Remote profile for {} updated", id),
            Err(e) => warn!("Remote profile update for {} failed: {}", id, e),
        }
        Ok(())
    }

    /// Remove a user row locally. Their images go with it; videos stay.
    pub async fn delete_local(&self, id: i64) -> Result<(), SyncError> {
        let removed = run_blocking(&self.ctx.db, move |db| db.delete_user(id)).await?;
        if removed > 0 {
            info!("Deleted local user {}", id);
            self.ctx.feed.publish(StoreEvent::UserDeleted { id });
            self.ctx.feed.publish(StoreEvent::ImagesPurged { user_id: id });
        }
        Ok(())
    }

    async fn mirror(&self, user: &User) {
        let record = user.clone();
        match run_blocking(&self.ctx.db, move |db| db.upsert_user(&record)).await {
            Ok(displaced) => self.saved(user.id, displaced),
            Err(e) => error!("Could not mirror user {} locally: {}", user.id, e),
        }
    }

    fn saved(&self, id: i64, displaced: Vec<i64>) {
        for stale in displaced {
            info!("Replaced stale local user {} with {}", stale, id);
            self.ctx.feed.publish(StoreEvent::UserDeleted { id: stale });
            self.ctx.feed.publish(StoreEvent::ImagesPurged { user_id: stale });
        }
        self.ctx.feed.publish(StoreEvent::UserSaved { id });
    }
}
