//! Video asset operations (movies and episodes).

use chrono::Utc;
use reelmark_common::{Error, ProfileId, Result, VideoKind, VideoRef};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

use crate::models::{to_sql_u64, VideoAsset};

const COLS: &str = "id, kind, owner_id, title, storage_path, size_bytes, duration_ms, \
                    preview_image_paths, views_total, views_month, created_at";

/// Fields needed to record an already-uploaded file.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub kind: VideoKind,
    pub owner_id: ProfileId,
    pub title: String,
    pub storage_path: String,
    pub size_bytes: u64,
    pub duration_ms: u64,
}

/// Insert a video asset and return it.
pub fn create_video(conn: &Connection, new: &NewVideo) -> Result<VideoAsset> {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO videos (id, kind, owner_id, title, storage_path, size_bytes, duration_ms, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            id.to_string(),
            new.kind.as_str(),
            new.owner_id.to_string(),
            new.title,
            new.storage_path,
            to_sql_u64(new.size_bytes)?,
            to_sql_u64(new.duration_ms)?,
            now,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_video(conn, id)?.ok_or_else(|| Error::internal("video vanished after insert"))
}

/// Get a video by row ID regardless of kind.
pub fn get_video(conn: &Connection, id: Uuid) -> Result<Option<VideoAsset>> {
    let q = format!("SELECT {COLS} FROM videos WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], VideoAsset::from_row) {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a video by logical reference; a movie id never resolves an episode.
pub fn get_video_by_ref(conn: &Connection, video: VideoRef) -> Result<Option<VideoAsset>> {
    let q = format!("SELECT {COLS} FROM videos WHERE id = ?1 AND kind = ?2");
    match conn.query_row(
        &q,
        [video.uuid().to_string(), video.kind().as_str().to_string()],
        VideoAsset::from_row,
    ) {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Append preview image paths, keeping existing order.
///
/// Runs as an immediate transaction so concurrent appends never lose paths.
/// Returns the number of matched videos (0 or 1).
pub fn append_preview_images(conn: &Connection, id: Uuid, paths: &[String]) -> Result<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| Error::database(e.to_string()))?;

    let Some(video) = get_video(&tx, id)? else {
        return Ok(0);
    };

    let mut previews = video.preview_image_paths;
    previews.extend(paths.iter().cloned());
    let json = serde_json::to_string(&previews).map_err(|e| Error::internal(e.to_string()))?;

    let n = tx
        .execute(
            "UPDATE videos SET preview_image_paths = ?2 WHERE id = ?1",
            [id.to_string(), json],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(n)
}

/// Drop the given preview image references, keeping every other path.
///
/// Only the listed paths are removed, so paths appended concurrently survive.
/// Returns the number of matched videos (0 or 1).
pub fn remove_preview_images(conn: &Connection, id: Uuid, paths: &[String]) -> Result<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| Error::database(e.to_string()))?;

    let Some(video) = get_video(&tx, id)? else {
        return Ok(0);
    };

    let remaining: Vec<String> = video
        .preview_image_paths
        .into_iter()
        .filter(|p| !paths.contains(p))
        .collect();
    let json = serde_json::to_string(&remaining).map_err(|e| Error::internal(e.to_string()))?;

    let n = tx
        .execute(
            "UPDATE videos SET preview_image_paths = ?2 WHERE id = ?1",
            [id.to_string(), json],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(n)
}

/// Delete a video and every reference to it.
///
/// Movie watch entries cascade. For episodes the series listing, watched
/// history and active-episode selections are removed and the series
/// counters recomputed, all in one transaction.
pub fn delete_video(conn: &Connection, id: Uuid) -> Result<bool> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    let id_str = id.to_string();

    let series_id: Option<String> = match tx.query_row(
        "SELECT series_id FROM series_episodes WHERE episode_id = ?1",
        [&id_str],
        |row| row.get(0),
    ) {
        Ok(s) => Some(s),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(Error::database(e.to_string())),
    };

    tx.execute("DELETE FROM watched_episodes WHERE episode_id = ?1", [&id_str])
        .map_err(|e| Error::database(e.to_string()))?;
    tx.execute(
        "UPDATE watching_series SET active_episode_id = NULL, active_track_id = NULL
         WHERE active_episode_id = ?1",
        [&id_str],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    if let Some(series_id) = series_id {
        tx.execute("DELETE FROM series_episodes WHERE episode_id = ?1", [&id_str])
            .map_err(|e| Error::database(e.to_string()))?;
        tx.execute(
            "UPDATE series SET
                amount_of_episodes = (SELECT COUNT(*) FROM series_episodes WHERE series_id = ?1),
                amount_of_seasons  = (SELECT COUNT(DISTINCT season_nr) FROM series_episodes WHERE series_id = ?1)
             WHERE id = ?1",
            [&series_id],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    let n = tx
        .execute("DELETE FROM videos WHERE id = ?1", [&id_str])
        .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Count one view against the total and the current month.
pub fn record_view(conn: &Connection, id: Uuid) -> Result<usize> {
    conn.execute(
        "UPDATE videos SET views_total = views_total + 1, views_month = views_month + 1
         WHERE id = ?1",
        [id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Zero the monthly view counter of every video.
pub fn reset_monthly_views(conn: &Connection) -> Result<usize> {
    conn.execute("UPDATE videos SET views_month = 0 WHERE views_month != 0", [])
        .map_err(|e| Error::database(e.to_string()))
}

/// List videos of one kind, newest first.
pub fn list_videos(conn: &Connection, kind: VideoKind) -> Result<Vec<VideoAsset>> {
    let q = format!("SELECT {COLS} FROM videos WHERE kind = ?1 ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([kind.as_str()], VideoAsset::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
