//! Series catalogue operations.
//!
//! The episode list is append-only; `amount_of_episodes` and
//! `amount_of_seasons` are recomputed in the same transaction as every append
//! so they always match the stored episodes.

use chrono::Utc;
use reelmark_common::{EpisodeId, Error, ProfileId, Result, SeriesId, VideoKind, VideoRef};
use rusqlite::{Connection, ErrorCode};

use crate::models::{SeriesAsset, SeriesEpisode};
use crate::queries::videos;

const COLS: &str = "id, owner_id, title, amount_of_seasons, amount_of_episodes";

/// Create an empty series.
pub fn create_series(conn: &Connection, owner_id: ProfileId, title: &str) -> Result<SeriesAsset> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::validation("series title must not be empty"));
    }

    let id = SeriesId::new();
    conn.execute(
        "INSERT INTO series (id, owner_id, title, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            id.to_string(),
            owner_id.to_string(),
            title,
            Utc::now().to_rfc3339()
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(SeriesAsset {
        id,
        owner_id,
        title: title.to_string(),
        episodes: Vec::new(),
        amount_of_seasons: 0,
        amount_of_episodes: 0,
    })
}

/// Get a series with its episodes ordered by season, then episode number.
pub fn get_series(conn: &Connection, id: SeriesId) -> Result<Option<SeriesAsset>> {
    let q = format!("SELECT {COLS} FROM series WHERE id = ?1");
    let mut series = match conn.query_row(&q, [id.to_string()], SeriesAsset::from_row) {
        Ok(s) => s,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(Error::database(e.to_string())),
    };

    let mut stmt = conn
        .prepare(
            "SELECT episode_id, season_nr, episode_nr FROM series_episodes
             WHERE series_id = ?1 ORDER BY season_nr, episode_nr",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    series.episodes = stmt
        .query_map([id.to_string()], SeriesEpisode::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(Some(series))
}

/// Whether `episode_id` is listed in `series_id`.
pub fn series_contains_episode(
    conn: &Connection,
    series_id: SeriesId,
    episode_id: EpisodeId,
) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM series_episodes WHERE series_id = ?1 AND episode_id = ?2)",
        [series_id.to_string(), episode_id.to_string()],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Append an episode video to a series.
///
/// Fails with `NotFound` if the series or episode video is missing and with
/// `Conflict` if the slot or the episode is already taken.
pub fn add_episode(
    conn: &Connection,
    series_id: SeriesId,
    episode_id: EpisodeId,
    season_nr: u32,
    episode_nr: u32,
) -> Result<SeriesAsset> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let exists: bool = tx
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM series WHERE id = ?1)",
            [series_id.to_string()],
            |row| row.get(0),
        )
        .map_err(|e| Error::database(e.to_string()))?;
    if !exists {
        return Err(Error::not_found("series", series_id));
    }
    if videos::get_video_by_ref(&tx, VideoRef::Episode(episode_id))?.is_none() {
        return Err(Error::not_found(VideoKind::Episode.as_str(), episode_id));
    }

    tx.execute(
        "INSERT INTO series_episodes (series_id, episode_id, season_nr, episode_nr, ordinal)
         SELECT ?1, ?2, ?3, ?4, COALESCE(MAX(ordinal), 0) + 1
         FROM series_episodes WHERE series_id = ?1",
        rusqlite::params![series_id.to_string(), episode_id.to_string(), season_nr, episode_nr],
    )
    .map_err(|e| match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => Error::Conflict(format!(
            "episode {episode_id} or slot S{season_nr}E{episode_nr} already in series"
        )),
        _ => Error::database(e.to_string()),
    })?;

    tx.execute(
        "UPDATE series SET
            amount_of_episodes = (SELECT COUNT(*) FROM series_episodes WHERE series_id = ?1),
            amount_of_seasons  = (SELECT COUNT(DISTINCT season_nr) FROM series_episodes WHERE series_id = ?1)
         WHERE id = ?1",
        [series_id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let series =
        get_series(&tx, series_id)?.ok_or_else(|| Error::not_found("series", series_id))?;
    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(series)
}
