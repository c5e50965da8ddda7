//! Per-profile watch progress.
//!
//! Every write is a single statement filtered by profile id plus the identity
//! column of the targeted entry (movie, series or episode id), so it touches
//! zero or one row and never another profile's data. Writes report how many
//! entries they matched; deciding whether a zero is an error is left to the
//! caller.

use reelmark_common::{EpisodeId, Error, MovieId, ProfileId, Result, SeriesId, TrackId};
use rusqlite::Connection;

use crate::models::{
    to_sql_u64, NewSeriesWatch, WatchState, WatchedEpisode, WatchingMovie, WatchingSeries,
};

/// Whether an add created a new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    AlreadyPresent,
}

impl AddOutcome {
    fn from_changes(n: usize) -> Self {
        if n == 0 {
            AddOutcome::AlreadyPresent
        } else {
            AddOutcome::Inserted
        }
    }
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

// ---------------------------------------------------------------------------
// Movies
// ---------------------------------------------------------------------------

/// Append a movie entry unless one already exists for `movie_id`.
pub fn add_movie_watch(
    conn: &Connection,
    profile_id: ProfileId,
    movie_id: MovieId,
    track_id: TrackId,
) -> Result<AddOutcome> {
    let n = conn
        .execute(
            "INSERT INTO watching_movies (profile_id, movie_id, track_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(profile_id, movie_id) DO NOTHING",
            rusqlite::params![
                profile_id.to_string(),
                movie_id.to_string(),
                to_sql_u64(track_id)?
            ],
        )
        .map_err(db_err)?;
    Ok(AddOutcome::from_changes(n))
}

/// Set the track of the matching movie entry only.
pub fn update_movie_watch(
    conn: &Connection,
    profile_id: ProfileId,
    movie_id: MovieId,
    track_id: TrackId,
) -> Result<usize> {
    conn.execute(
        "UPDATE watching_movies SET track_id = ?3 WHERE profile_id = ?1 AND movie_id = ?2",
        rusqlite::params![
            profile_id.to_string(),
            movie_id.to_string(),
            to_sql_u64(track_id)?
        ],
    )
    .map_err(db_err)
}

/// Remove the matching movie entry if present.
pub fn remove_movie_watch(
    conn: &Connection,
    profile_id: ProfileId,
    movie_id: MovieId,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM watching_movies WHERE profile_id = ?1 AND movie_id = ?2",
        [profile_id.to_string(), movie_id.to_string()],
    )
    .map_err(db_err)
}

/// Get one movie entry.
pub fn get_movie_watch(
    conn: &Connection,
    profile_id: ProfileId,
    movie_id: MovieId,
) -> Result<Option<WatchingMovie>> {
    match conn.query_row(
        "SELECT movie_id, track_id FROM watching_movies WHERE profile_id = ?1 AND movie_id = ?2",
        [profile_id.to_string(), movie_id.to_string()],
        WatchingMovie::from_row,
    ) {
        Ok(m) => Ok(Some(m)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(db_err(e)),
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Append a series entry unless one already exists for `series_id`.
///
/// The entry row and its initial watched episodes are written in one
/// transaction. Duplicate episode ids in `entry` collapse to the last one.
pub fn add_series_watch(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
    entry: &NewSeriesWatch,
) -> Result<AddOutcome> {
    let tx = conn.unchecked_transaction().map_err(db_err)?;
    let (active_episode, active_track) = match entry.active_episode {
        Some(a) => (Some(a.episode_id.to_string()), Some(to_sql_u64(a.track_id)?)),
        None => (None, None),
    };

    let n = tx
        .execute(
            "INSERT INTO watching_series (profile_id, series_id, active_episode_id, active_track_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(profile_id, series_id) DO NOTHING",
            rusqlite::params![
                profile_id.to_string(),
                series_id.to_string(),
                active_episode,
                active_track
            ],
        )
        .map_err(db_err)?;

    if n == 0 {
        return Ok(AddOutcome::AlreadyPresent);
    }

    for episode in &entry.watched_episodes {
        upsert_watched_episode(&tx, profile_id, series_id, *episode)?;
    }

    tx.commit().map_err(db_err)?;
    Ok(AddOutcome::Inserted)
}

/// Remove the matching series entry (and its watched history) if present.
pub fn remove_series_watch(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM watching_series WHERE profile_id = ?1 AND series_id = ?2",
        [profile_id.to_string(), series_id.to_string()],
    )
    .map_err(db_err)
}

/// Unset the active episode of the matching series entry.
pub fn clear_active_episode(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
) -> Result<usize> {
    conn.execute(
        "UPDATE watching_series SET active_episode_id = NULL, active_track_id = NULL
         WHERE profile_id = ?1 AND series_id = ?2",
        [profile_id.to_string(), series_id.to_string()],
    )
    .map_err(db_err)
}

/// Replace the active episode in one statement; readers never observe it absent.
pub fn set_active_episode(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
    episode_id: EpisodeId,
    track_id: TrackId,
) -> Result<usize> {
    conn.execute(
        "UPDATE watching_series SET active_episode_id = ?3, active_track_id = ?4
         WHERE profile_id = ?1 AND series_id = ?2",
        rusqlite::params![
            profile_id.to_string(),
            series_id.to_string(),
            episode_id.to_string(),
            to_sql_u64(track_id)?
        ],
    )
    .map_err(db_err)
}

/// Set only the track of the active episode, provided it is still
/// `episode_id`. Matches nothing when unset or switched to another episode.
pub fn advance_active_episode_track(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
    episode_id: EpisodeId,
    track_id: TrackId,
) -> Result<usize> {
    conn.execute(
        "UPDATE watching_series SET active_track_id = ?4
         WHERE profile_id = ?1 AND series_id = ?2 AND active_episode_id = ?3",
        rusqlite::params![
            profile_id.to_string(),
            series_id.to_string(),
            episode_id.to_string(),
            to_sql_u64(track_id)?
        ],
    )
    .map_err(db_err)
}

/// Record a watched episode on an existing series entry.
///
/// Matches zero rows when the series entry is absent. If the episode is
/// already recorded (including by a racing caller) its track is overwritten,
/// so there is never more than one entry per episode.
pub fn add_watched_episode(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
    episode: WatchedEpisode,
) -> Result<usize> {
    upsert_watched_episode(conn, profile_id, series_id, episode)
}

fn upsert_watched_episode(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
    episode: WatchedEpisode,
) -> Result<usize> {
    conn.execute(
        "INSERT INTO watched_episodes (profile_id, series_id, episode_id, track_id, ordinal)
         SELECT ws.profile_id, ws.series_id, ?3, ?4,
                (SELECT COALESCE(MAX(we.ordinal), 0) + 1 FROM watched_episodes we
                 WHERE we.profile_id = ws.profile_id AND we.series_id = ws.series_id)
         FROM watching_series ws
         WHERE ws.profile_id = ?1 AND ws.series_id = ?2
         ON CONFLICT(profile_id, series_id, episode_id) DO UPDATE SET track_id = excluded.track_id",
        rusqlite::params![
            profile_id.to_string(),
            series_id.to_string(),
            episode.episode_id.to_string(),
            to_sql_u64(episode.track_id)?
        ],
    )
    .map_err(db_err)
}

/// Set the track of one watched episode only.
pub fn update_watched_episode_track(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
    episode_id: EpisodeId,
    track_id: TrackId,
) -> Result<usize> {
    conn.execute(
        "UPDATE watched_episodes SET track_id = ?4
         WHERE profile_id = ?1 AND series_id = ?2 AND episode_id = ?3",
        rusqlite::params![
            profile_id.to_string(),
            series_id.to_string(),
            episode_id.to_string(),
            to_sql_u64(track_id)?
        ],
    )
    .map_err(db_err)
}

/// Remove one watched episode if present.
pub fn remove_watched_episode(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
    episode_id: EpisodeId,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM watched_episodes WHERE profile_id = ?1 AND series_id = ?2 AND episode_id = ?3",
        [
            profile_id.to_string(),
            series_id.to_string(),
            episode_id.to_string(),
        ],
    )
    .map_err(db_err)
}

/// Get one series entry with its watched episodes in insertion order.
pub fn get_series_watch(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
) -> Result<Option<WatchingSeries>> {
    let mut entry = match conn.query_row(
        "SELECT series_id, active_episode_id, active_track_id FROM watching_series
         WHERE profile_id = ?1 AND series_id = ?2",
        [profile_id.to_string(), series_id.to_string()],
        WatchingSeries::from_row,
    ) {
        Ok(s) => s,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(db_err(e)),
    };
    entry.watched_episodes = list_watched_episodes(conn, profile_id, series_id)?;
    Ok(Some(entry))
}

fn list_watched_episodes(
    conn: &Connection,
    profile_id: ProfileId,
    series_id: SeriesId,
) -> Result<Vec<WatchedEpisode>> {
    let mut stmt = conn
        .prepare(
            "SELECT episode_id, track_id FROM watched_episodes
             WHERE profile_id = ?1 AND series_id = ?2 ORDER BY ordinal",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map(
            [profile_id.to_string(), series_id.to_string()],
            WatchedEpisode::from_row,
        )
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// Read the whole watch state of a profile, entries in insertion order.
pub fn get_watch_state(conn: &Connection, profile_id: ProfileId) -> Result<WatchState> {
    let mut state = WatchState::new(profile_id);

    let mut stmt = conn
        .prepare(
            "SELECT movie_id, track_id FROM watching_movies WHERE profile_id = ?1 ORDER BY rowid",
        )
        .map_err(db_err)?;
    state.movies = stmt
        .query_map([profile_id.to_string()], WatchingMovie::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;

    let mut stmt = conn
        .prepare(
            "SELECT series_id, active_episode_id, active_track_id FROM watching_series
             WHERE profile_id = ?1 ORDER BY rowid",
        )
        .map_err(db_err)?;
    let series = stmt
        .query_map([profile_id.to_string()], WatchingSeries::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;

    for mut entry in series {
        entry.watched_episodes = list_watched_episodes(conn, profile_id, entry.series_id)?;
        state.series.push(entry);
    }

    Ok(state)
}
