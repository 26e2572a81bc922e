use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 2;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("DB: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL,
                last_login  TEXT
            );

            CREATE TABLE generated_images (
                id          INTEGER PRIMARY KEY,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                prompt      TEXT NOT NULL,
                image_url   TEXT NOT NULL,
                local_path  TEXT,
                created_at  TEXT NOT NULL,
                is_favorite INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_images_user
                ON generated_images(user_id, created_at);

            -- No foreign key: video rows outlive their user.
            CREATE TABLE generated_videos (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id           INTEGER NOT NULL,
                video_path        TEXT NOT NULL,
                source_image_path TEXT NOT NULL,
                video_style       TEXT NOT NULL,
                duration          INTEGER NOT NULL,
                motion_intensity  INTEGER NOT NULL CHECK (motion_intensity BETWEEN 0 AND 100),
                created_at        TEXT NOT NULL,
                is_favorite       INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_videos_user
                ON generated_videos(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("DB: running migration v2 (preferences)");
        conn.execute_batch(
            "
            CREATE TABLE preferences (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('users', 'generated_images', 'generated_videos', 'preferences')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }
}
