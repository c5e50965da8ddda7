//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.

use reelmark_common::{Error, Result};
use rusqlite::Connection;

/// V1: profiles, tokens and the video catalogue.
const V1_INITIAL: &str = r#"
CREATE TABLE profiles (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE auth_tokens (
    token      TEXT PRIMARY KEY,
    profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Movies and episodes share one table; the row id is the movie/episode id.
CREATE TABLE videos (
    id                  TEXT PRIMARY KEY,
    kind                TEXT NOT NULL CHECK (kind IN ('movie', 'episode')),
    owner_id            TEXT NOT NULL REFERENCES profiles(id),
    title               TEXT NOT NULL,
    storage_path        TEXT NOT NULL,
    size_bytes          INTEGER NOT NULL CHECK (size_bytes >= 0),
    duration_ms         INTEGER NOT NULL CHECK (duration_ms >= 0),
    preview_image_paths TEXT NOT NULL DEFAULT '[]',
    created_at          TEXT NOT NULL
);

CREATE TABLE series (
    id                 TEXT PRIMARY KEY,
    owner_id           TEXT NOT NULL REFERENCES profiles(id),
    title              TEXT NOT NULL,
    amount_of_seasons  INTEGER NOT NULL DEFAULT 0,
    amount_of_episodes INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL
);

CREATE TABLE series_episodes (
    series_id  TEXT NOT NULL REFERENCES series(id) ON DELETE CASCADE,
    episode_id TEXT NOT NULL UNIQUE REFERENCES videos(id),
    season_nr  INTEGER NOT NULL,
    episode_nr INTEGER NOT NULL,
    ordinal    INTEGER NOT NULL,
    PRIMARY KEY (series_id, season_nr, episode_nr)
);

CREATE INDEX idx_auth_tokens_profile ON auth_tokens(profile_id);
CREATE INDEX idx_videos_owner        ON videos(owner_id);
"#;

/// V2: per-profile watch progress.
const V2_WATCH_PROGRESS: &str = r#"
CREATE TABLE watching_movies (
    profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    movie_id   TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
    track_id   INTEGER NOT NULL CHECK (track_id >= 0),
    PRIMARY KEY (profile_id, movie_id)
);

CREATE TABLE watching_series (
    profile_id        TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    series_id         TEXT NOT NULL REFERENCES series(id) ON DELETE CASCADE,
    active_episode_id TEXT,
    active_track_id   INTEGER CHECK (active_track_id >= 0),
    PRIMARY KEY (profile_id, series_id),
    CHECK ((active_episode_id IS NULL) = (active_track_id IS NULL))
);

CREATE TABLE watched_episodes (
    profile_id TEXT NOT NULL,
    series_id  TEXT NOT NULL,
    episode_id TEXT NOT NULL,
    track_id   INTEGER NOT NULL CHECK (track_id >= 0),
    ordinal    INTEGER NOT NULL,
    PRIMARY KEY (profile_id, series_id, episode_id),
    FOREIGN KEY (profile_id, series_id)
        REFERENCES watching_series(profile_id, series_id) ON DELETE CASCADE
);
"#;

/// V3: seed the profile used when auth is disabled.
const V3_DEFAULT_PROFILE: &str = r#"
INSERT OR IGNORE INTO profiles (id, name, created_at)
VALUES ('00000000-0000-0000-0000-000000000001', 'default', datetime('now'));
"#;

/// V4: view counters and process-wide key/value state.
const V4_VIEWS: &str = r#"
ALTER TABLE videos ADD COLUMN views_total INTEGER NOT NULL DEFAULT 0;
ALTER TABLE videos ADD COLUMN views_month INTEGER NOT NULL DEFAULT 0;

CREATE TABLE app_state (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, V1_INITIAL),
    (2, V2_WATCH_PROGRESS),
    (3, V3_DEFAULT_PROFILE),
    (4, V4_VIEWS),
];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

/// Highest applied migration version (0 on a fresh database).
pub fn current_version(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}
