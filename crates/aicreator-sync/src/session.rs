use std::sync::Arc;

use tracing::{info, warn};

use aicreator_db::Database;
use aicreator_types::events::{StoreEvent, Table};
use aicreator_types::models::{Preferences, User};

use crate::feed::{ChangeFeed, LiveQuery};
use crate::{SyncError, run_blocking};

const KEY_LOGGED_IN: &str = "logged_in";
const KEY_USER_ID: &str = "user_id";
const KEY_USERNAME: &str = "username";
const KEY_ACCESS_TOKEN: &str = "access_token";
const KEY_THEME: &str = "theme";
const KEY_LANGUAGE: &str = "language";
const KEY_NOTIFICATIONS: &str = "notifications_enabled";

/// Login state and user preferences, persisted in the `preferences` table.
#[derive(Clone)]
pub struct Session {
    db: Arc<Database>,
    feed: ChangeFeed,
}

impl Session {
    pub fn new(db: Arc<Database>, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Record `user` as the logged-in user.
    pub async fn login(&self, user: &User, access_token: Option<String>) -> Result<(), SyncError> {
        let id = user.id.to_string();
        let username = user.username.clone();
        run_blocking(&self.db, move |db| {
            db.set_pref(KEY_LOGGED_IN, "true")?;
            db.set_pref(KEY_USER_ID, &id)?;
            db.set_pref(KEY_USERNAME, &username)?;
            match access_token {
                Some(token) => db.set_pref(KEY_ACCESS_TOKEN, &token)?,
                None => {
                    db.delete_pref(KEY_ACCESS_TOKEN)?;
                }
            }
            Ok(())
        })
        .await?;

        info!("Session started for {} ({})", user.username, user.id);
        self.feed.publish(StoreEvent::SessionChanged);
        Ok(())
    }

    /// Drop every stored key, preferences included.
    pub async fn logout(&self) -> Result<(), SyncError> {
        let removed = run_blocking(&self.db, |db| db.clear_prefs()).await?;
        info!("Session cleared ({} keys)", removed);
        self.feed.publish(StoreEvent::SessionChanged);
        Ok(())
    }

    pub async fn is_logged_in(&self) -> Result<bool, SyncError> {
        Ok(self.get(KEY_LOGGED_IN).await?.as_deref() == Some("true"))
    }

    pub async fn current_user_id(&self) -> Result<Option<i64>, SyncError> {
        if !self.is_logged_in().await? {
            return Ok(None);
        }
        let Some(raw) = self.get(KEY_USER_ID).await? else {
            return Ok(None);
        };
        match raw.parse() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                warn!("Ignoring malformed stored user id {:?}", raw);
                Ok(None)
            }
        }
    }

    pub async fn require_user_id(&self) -> Result<i64, SyncError> {
        self.current_user_id().await?.ok_or(SyncError::NotLoggedIn)
    }

    pub async fn username(&self) -> Result<Option<String>, SyncError> {
        self.get(KEY_USERNAME).await
    }

    pub async fn access_token(&self) -> Result<Option<String>, SyncError> {
        self.get(KEY_ACCESS_TOKEN).await
    }

    pub async fn preferences(&self) -> Result<Preferences, SyncError> {
        run_blocking(&self.db, read_preferences).await
    }

    pub fn watch_preferences(&self) -> LiveQuery<Preferences> {
        self.feed
            .watch(self.db.clone(), Table::Preferences, None, read_preferences)
    }

    pub async fn set_theme(&self, theme: &str) -> Result<(), SyncError> {
        self.set(KEY_THEME, theme.to_string()).await
    }

    pub async fn set_language(&self, language: &str) -> Result<(), SyncError> {
        self.set(KEY_LANGUAGE, language.to_string()).await
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) -> Result<(), SyncError> {
        self.set(KEY_NOTIFICATIONS, enabled.to_string()).await
    }

    async fn get(&self, key: &'static str) -> Result<Option<String>, SyncError> {
        run_blocking(&self.db, move |db| db.get_pref(key)).await
    }

    async fn set(&self, key: &'static str, value: String) -> Result<(), SyncError> {
        run_blocking(&self.db, move |db| db.set_pref(key, &value)).await?;
        self.feed.publish(StoreEvent::SessionChanged);
        Ok(())
    }
}

fn read_preferences(db: &Database) -> anyhow::Result<Preferences> {
    let defaults = Preferences::default();
    Ok(Preferences {
        theme: db.get_pref(KEY_THEME)?.unwrap_or(defaults.theme),
        language: db.get_pref(KEY_LANGUAGE)?.unwrap_or(defaults.language),
        notifications_enabled: db
            .get_pref(KEY_NOTIFICATIONS)?
            .map(|v| v == "true")
            .unwrap_or(defaults.notifications_enabled),
    })
}
