//! Row mapping between SQLite and the shared entity types.

use aicreator_types::models::{GeneratedImage, GeneratedVideo, User, VideoStyle};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

pub const USER_COLUMNS: &str = "id, username, password, email, created_at, last_login";

pub const IMAGE_COLUMNS: &str =
    "id, user_id, prompt, image_url, local_path, created_at, is_favorite";

pub const VIDEO_COLUMNS: &str = "id, user_id, video_path, source_image_path, video_style, \
     duration, motion_intensity, created_at, is_favorite";

/// A video about to be inserted; the id is assigned by SQLite.
#[derive(Debug, Clone)]
pub struct NewVideo<'a> {
    pub user_id: i64,
    pub video_path: &'a str,
    pub source_image_path: &'a str,
    pub video_style: VideoStyle,
    pub duration: u32,
    pub motion_intensity: u8,
    pub created_at: DateTime<Utc>,
}

pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        email: row.get(3)?,
        created_at: row.get(4)?,
        last_login: row.get(5)?,
    })
}

pub fn image_from_row(row: &Row<'_>) -> rusqlite::Result<GeneratedImage> {
    Ok(GeneratedImage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        prompt: row.get(2)?,
        image_url: row.get(3)?,
        local_path: row.get(4)?,
        created_at: row.get(5)?,
        is_favorite: row.get(6)?,
    })
}

pub fn video_from_row(row: &Row<'_>) -> rusqlite::Result<GeneratedVideo> {
    let style: String = row.get(4)?;
    let video_style = style.parse::<VideoStyle>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into())
    })?;

    Ok(GeneratedVideo {
        id: row.get(0)?,
        user_id: row.get(1)?,
        video_path: row.get(2)?,
        source_image_path: row.get(3)?,
        video_style,
        duration: row.get(5)?,
        motion_intensity: row.get(6)?,
        created_at: row.get(7)?,
        is_favorite: row.get(8)?,
    })
}
