use crate::Database;
use crate::models::{
    IMAGE_COLUMNS, NewVideo, USER_COLUMNS, VIDEO_COLUMNS, image_from_row, user_from_row,
    video_from_row,
};
use aicreator_types::models::{GeneratedImage, GeneratedVideo, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Params, Row, params};

impl Database {
    // -- Users --

    /// Insert or refresh a user mirrored from the remote service.
    ///
    /// Uses an upsert rather than REPLACE so the image cascade never fires
    /// for `user.id`. Stale rows holding the same username or email under a
    /// different id are removed first, taking their own images with them.
    /// Returns the ids of those removed rows.
    pub fn upsert_user(&self, user: &User) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let stale: Vec<i64> = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM users WHERE id <> ?1 AND (username = ?2 OR email = ?3)",
                )?;
                stmt.query_map(params![user.id, user.username, user.email], |r| r.get(0))?
                    .collect::<std::result::Result<Vec<i64>, _>>()?
            };
            for id in &stale {
                tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            }
            tx.execute(
                "INSERT INTO users (id, username, password, email, created_at, last_login)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    username = excluded.username,
                    password = excluded.password,
                    email = excluded.email,
                    created_at = excluded.created_at,
                    last_login = COALESCE(excluded.last_login, users.last_login)",
                params![
                    user.id,
                    user.username,
                    user.password,
                    user.email,
                    user.created_at,
                    user.last_login
                ],
            )?;
            tx.commit()?;
            Ok(stale)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                [id],
                user_from_row,
            )
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                [username],
                user_from_row,
            )
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                &format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS),
                [],
                user_from_row,
            )
        })
    }

    /// Overwrite the profile columns. Returns the number of rows touched.
    pub fn update_user(&self, user: &User) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE users SET username = ?1, password = ?2, email = ?3, last_login = ?4
                 WHERE id = ?5",
                params![user.username, user.password, user.email, user.last_login, user.id],
            )?)
        })
    }

    pub fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE users SET last_login = ?1 WHERE id = ?2",
                params![at, id],
            )?)
        })
    }

    pub fn delete_user(&self, id: i64) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])?))
    }

    // -- Images --

    /// Insert or refresh an image mirrored from the remote service.
    /// Local-only columns (favorite, local path) survive a refresh.
    pub fn upsert_image(&self, image: &GeneratedImage) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO generated_images
                    (id, user_id, prompt, image_url, local_path, created_at, is_favorite)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    user_id = excluded.user_id,
                    prompt = excluded.prompt,
                    image_url = excluded.image_url,
                    created_at = excluded.created_at",
                params![
                    image.id,
                    image.user_id,
                    image.prompt,
                    image.image_url,
                    image.local_path,
                    image.created_at,
                    image.is_favorite
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_image(&self, id: i64) -> Result<Option<GeneratedImage>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM generated_images WHERE id = ?1", IMAGE_COLUMNS),
                [id],
                image_from_row,
            )
        })
    }

    pub fn images_by_user(&self, user_id: i64) -> Result<Vec<GeneratedImage>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                &format!(
                    "SELECT {} FROM generated_images WHERE user_id = ?1
                     ORDER BY created_at DESC, id DESC",
                    IMAGE_COLUMNS
                ),
                [user_id],
                image_from_row,
            )
        })
    }

    pub fn favorite_images(&self, user_id: i64) -> Result<Vec<GeneratedImage>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                &format!(
                    "SELECT {} FROM generated_images WHERE user_id = ?1 AND is_favorite = 1
                     ORDER BY created_at DESC, id DESC",
                    IMAGE_COLUMNS
                ),
                [user_id],
                image_from_row,
            )
        })
    }

    pub fn recent_images(&self, limit: u32) -> Result<Vec<GeneratedImage>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                &format!(
                    "SELECT {} FROM generated_images ORDER BY created_at DESC, id DESC LIMIT ?1",
                    IMAGE_COLUMNS
                ),
                [limit],
                image_from_row,
            )
        })
    }

    /// Substring match on the prompt.
    pub fn search_images(&self, query: &str) -> Result<Vec<GeneratedImage>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                &format!(
                    "SELECT {} FROM generated_images WHERE prompt LIKE '%' || ?1 || '%'
                     ORDER BY created_at DESC, id DESC",
                    IMAGE_COLUMNS
                ),
                [query],
                image_from_row,
            )
        })
    }

    pub fn set_image_favorite(&self, id: i64, is_favorite: bool) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE generated_images SET is_favorite = ?1 WHERE id = ?2",
                params![is_favorite, id],
            )?)
        })
    }

    pub fn set_image_local_path(&self, id: i64, local_path: &str) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE generated_images SET local_path = ?1 WHERE id = ?2",
                params![local_path, id],
            )?)
        })
    }

    pub fn delete_image(&self, id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM generated_images WHERE id = ?1", [id])?)
        })
    }

    pub fn count_images(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM generated_images", [], |r| r.get(0))?)
        })
    }

    // -- Videos --

    /// Returns the id SQLite assigned.
    pub fn insert_video(&self, video: &NewVideo<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO generated_videos
                    (user_id, video_path, source_image_path, video_style, duration,
                     motion_intensity, created_at, is_favorite)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
                params![
                    video.user_id,
                    video.video_path,
                    video.source_image_path,
                    video.video_style.as_str(),
                    video.duration,
                    video.motion_intensity,
                    video.created_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_video(&self, id: i64) -> Result<Option<GeneratedVideo>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {} FROM generated_videos WHERE id = ?1", VIDEO_COLUMNS),
                [id],
                video_from_row,
            )
        })
    }

    pub fn all_videos(&self) -> Result<Vec<GeneratedVideo>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                &format!(
                    "SELECT {} FROM generated_videos ORDER BY created_at DESC, id DESC",
                    VIDEO_COLUMNS
                ),
                [],
                video_from_row,
            )
        })
    }

    pub fn videos_by_user(&self, user_id: i64) -> Result<Vec<GeneratedVideo>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                &format!(
                    "SELECT {} FROM generated_videos WHERE user_id = ?1
                     ORDER BY created_at DESC, id DESC",
                    VIDEO_COLUMNS
                ),
                [user_id],
                video_from_row,
            )
        })
    }

    pub fn favorite_videos(&self, user_id: i64) -> Result<Vec<GeneratedVideo>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                &format!(
                    "SELECT {} FROM generated_videos WHERE user_id = ?1 AND is_favorite = 1
                     ORDER BY created_at DESC, id DESC",
                    VIDEO_COLUMNS
                ),
                [user_id],
                video_from_row,
            )
        })
    }

    pub fn update_video(&self, video: &GeneratedVideo) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE generated_videos SET user_id = ?1, video_path = ?2, source_image_path = ?3,
                    video_style = ?4, duration = ?5, motion_intensity = ?6, is_favorite = ?7
                 WHERE id = ?8",
                params![
                    video.user_id,
                    video.video_path,
                    video.source_image_path,
                    video.video_style.as_str(),
                    video.duration,
                    video.motion_intensity,
                    video.is_favorite,
                    video.id
                ],
            )?)
        })
    }

    pub fn set_video_favorite(&self, id: i64, is_favorite: bool) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE generated_videos SET is_favorite = ?1 WHERE id = ?2",
                params![is_favorite, id],
            )?)
        })
    }

    pub fn delete_video(&self, id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM generated_videos WHERE id = ?1", [id])?)
        })
    }

    // -- Preferences --

    pub fn get_pref(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                "SELECT value FROM preferences WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
        })
    }

    pub fn set_pref(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO preferences (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                [key, value],
            )?;
            Ok(())
        })
    }

    pub fn delete_pref(&self, key: &str) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM preferences WHERE key = ?1", [key])?))
    }

    pub fn clear_prefs(&self) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM preferences", [])?))
    }
}

fn query_one<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Option<T>>
where
    P: Params,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let row = stmt.query_row(params, map).optional()?;
    Ok(row)
}

fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
