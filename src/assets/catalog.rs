//! Registering videos and building series.

use std::path::Path;

use reelmark_common::{EpisodeId, Error, ProfileId, Result, SeriesId, VideoKind};
use reelmark_db::models::{SeriesAsset, VideoAsset};
use reelmark_db::pool::DbPool;
use reelmark_db::queries::{profiles, series, videos};

use crate::db::with_conn;

/// Record an already-uploaded file as a movie or episode.
///
/// The file is stat'ed here so the stored size matches what is on disk.
/// `title` defaults to the file stem.
pub async fn register_video(
    pool: &DbPool,
    path: &Path,
    kind: VideoKind,
    duration_ms: u64,
    owner_id: ProfileId,
    title: Option<String>,
) -> Result<VideoAsset> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::not_found("file", path.display()));
        }
        Err(e) => return Err(Error::Io { source: e }),
    };
    if !metadata.is_file() {
        return Err(Error::validation(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let path = std::fs::canonicalize(path)?;
    let title = title
        .or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "untitled".to_string());

    let new = videos::NewVideo {
        kind,
        owner_id,
        title,
        storage_path: path.display().to_string(),
        size_bytes: metadata.len(),
        duration_ms,
    };

    let video = with_conn(pool, move |conn| {
        if !profiles::profile_exists(conn, owner_id)? {
            return Err(Error::not_found("profile", owner_id));
        }
        videos::create_video(conn, &new)
    })
    .await?;

    tracing::info!(
        video_id = %video.id,
        kind = %video.kind,
        size = video.size_bytes,
        "Registered video {}",
        video.storage_path
    );
    Ok(video)
}

/// Create an empty series owned by `owner_id`.
pub async fn create_series(pool: &DbPool, owner_id: ProfileId, title: String) -> Result<SeriesAsset> {
    with_conn(pool, move |conn| {
        if !profiles::profile_exists(conn, owner_id)? {
            return Err(Error::not_found("profile", owner_id));
        }
        series::create_series(conn, owner_id, &title)
    })
    .await
}

/// Append an episode; the series counters are updated in the same transaction.
pub async fn add_episode(
    pool: &DbPool,
    series_id: SeriesId,
    episode_id: EpisodeId,
    season_nr: u32,
    episode_nr: u32,
) -> Result<SeriesAsset> {
    let series = with_conn(pool, move |conn| {
        series::add_episode(conn, series_id, episode_id, season_nr, episode_nr)
    })
    .await?;
    tracing::info!(
        series_id = %series_id,
        episode_id = %episode_id,
        "Added S{season_nr:02}E{episode_nr:02}, {} episodes in {} seasons",
        series.amount_of_episodes,
        series.amount_of_seasons
    );
    Ok(series)
}
