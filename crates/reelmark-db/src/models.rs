//! Rust structs mapping to database tables.
//!
//! Each row-backed model implements `from_row` for constructing itself from a
//! `rusqlite::Row`. Watch-progress models serialize in camelCase because they
//! are returned verbatim to playback clients.

use reelmark_common::{EpisodeId, MovieId, ProfileId, SeriesId, TrackId, VideoKind, VideoRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a UUID-based ID from a text column.
pub(crate) fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

pub(crate) fn parse_opt_id<T: From<Uuid>>(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let s: Option<String> = row.get(idx)?;
    match s {
        Some(v) => {
            let uuid = Uuid::parse_str(&v).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(Some(T::from(uuid)))
        }
        None => Ok(None),
    }
}

/// Read a non-negative integer column as `u64`.
pub(crate) fn get_u64(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<u64> {
    let v: i64 = row.get(idx)?;
    u64::try_from(v).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Integer, Box::new(e))
    })
}

/// Convert a `u64` into the `i64` SQLite stores.
pub(crate) fn to_sql_u64(v: u64) -> reelmark_common::Result<i64> {
    i64::try_from(v)
        .map_err(|_| reelmark_common::Error::validation(format!("value {v} is out of range")))
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub created_at: String,
}

impl Profile {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

// ---------------------------------------------------------------------------
// AuthToken
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
    pub profile_id: ProfileId,
    pub expires_at: String,
}

impl AuthToken {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            token: row.get(0)?,
            profile_id: parse_id(row, 1)?,
            expires_at: row.get(2)?,
        })
    }
}

// ---------------------------------------------------------------------------
// VideoAsset
// ---------------------------------------------------------------------------

/// A stored movie or episode file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAsset {
    pub id: Uuid,
    pub kind: VideoKind,
    pub owner_id: ProfileId,
    pub title: String,
    pub storage_path: String,
    pub size_bytes: u64,
    pub duration_ms: u64,
    pub preview_image_paths: Vec<String>,
    pub views_total: u64,
    pub views_month: u64,
    pub created_at: String,
}

impl VideoAsset {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let kind: String = row.get(1)?;
        let kind = kind.parse::<VideoKind>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
        })?;
        let previews: String = row.get(7)?;
        let preview_image_paths = serde_json::from_str(&previews).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: parse_id(row, 0)?,
            kind,
            owner_id: parse_id(row, 2)?,
            title: row.get(3)?,
            storage_path: row.get(4)?,
            size_bytes: get_u64(row, 5)?,
            duration_ms: get_u64(row, 6)?,
            preview_image_paths,
            views_total: get_u64(row, 8)?,
            views_month: get_u64(row, 9)?,
            created_at: row.get(10)?,
        })
    }

    pub fn video_ref(&self) -> VideoRef {
        VideoRef::from_parts(self.kind, self.id)
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Position of one episode inside a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesEpisode {
    pub episode_id: EpisodeId,
    pub season_nr: u32,
    pub episode_nr: u32,
}

impl SeriesEpisode {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            episode_id: parse_id(row, 0)?,
            season_nr: row.get(1)?,
            episode_nr: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesAsset {
    pub id: SeriesId,
    pub owner_id: ProfileId,
    pub title: String,
    /// Ordered by season, then episode number.
    pub episodes: Vec<SeriesEpisode>,
    pub amount_of_seasons: u32,
    pub amount_of_episodes: u32,
}

impl SeriesAsset {
    /// Build from a `series` row; episodes are loaded separately.
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            owner_id: parse_id(row, 1)?,
            title: row.get(2)?,
            episodes: Vec::new(),
            amount_of_seasons: row.get(3)?,
            amount_of_episodes: row.get(4)?,
        })
    }

    pub fn contains_episode(&self, episode_id: EpisodeId) -> bool {
        self.episodes.iter().any(|e| e.episode_id == episode_id)
    }
}

// ---------------------------------------------------------------------------
// Watch progress
// ---------------------------------------------------------------------------

/// An in-progress movie for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchingMovie {
    pub movie_id: MovieId,
    pub track_id: TrackId,
}

impl WatchingMovie {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            movie_id: parse_id(row, 0)?,
            track_id: get_u64(row, 1)?,
        })
    }
}

/// The episode currently selected as in-progress for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEpisode {
    pub episode_id: EpisodeId,
    pub track_id: TrackId,
}

/// An episode with a recorded last-seen offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedEpisode {
    pub episode_id: EpisodeId,
    pub track_id: TrackId,
}

impl WatchedEpisode {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            episode_id: parse_id(row, 0)?,
            track_id: get_u64(row, 1)?,
        })
    }
}

/// An in-progress series for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchingSeries {
    pub series_id: SeriesId,
    /// `None` once cleared; never a zero-valued placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_episode: Option<ActiveEpisode>,
    /// Insertion-ordered, unique by `episode_id`.
    pub watched_episodes: Vec<WatchedEpisode>,
}

impl WatchingSeries {
    /// Build from a `watching_series` row; watched episodes are loaded separately.
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let episode: Option<EpisodeId> = parse_opt_id(row, 1)?;
        let track: Option<i64> = row.get(2)?;
        let active_episode = match (episode, track) {
            (Some(episode_id), Some(track)) => Some(ActiveEpisode {
                episode_id,
                track_id: u64::try_from(track).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Integer,
                        Box::new(e),
                    )
                })?,
            }),
            _ => None,
        };

        Ok(Self {
            series_id: parse_id(row, 0)?,
            active_episode,
            watched_episodes: Vec::new(),
        })
    }
}

/// Initial contents of a series entry when it is first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSeriesWatch {
    #[serde(default)]
    pub active_episode: Option<ActiveEpisode>,
    #[serde(default)]
    pub watched_episodes: Vec<WatchedEpisode>,
}

/// Everything a profile is currently watching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchState {
    pub profile_id: ProfileId,
    pub movies: Vec<WatchingMovie>,
    pub series: Vec<WatchingSeries>,
}

impl WatchState {
    pub fn new(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            movies: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn movie(&self, movie_id: MovieId) -> Option<&WatchingMovie> {
        self.movies.iter().find(|m| m.movie_id == movie_id)
    }

    pub fn series(&self, series_id: SeriesId) -> Option<&WatchingSeries> {
        self.series.iter().find(|s| s.series_id == series_id)
    }
}
