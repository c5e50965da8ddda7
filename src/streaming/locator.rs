//! Resolve a video reference to its file on disk.

use std::path::PathBuf;

use reelmark_common::{Error, Result, VideoRef};
use reelmark_db::models::VideoAsset;
use reelmark_db::pool::DbPool;
use reelmark_db::queries::videos;

use crate::db::with_conn;

/// A video whose file exists right now.
#[derive(Debug, Clone)]
pub struct LocatedVideo {
    pub asset: VideoAsset,
    pub path: PathBuf,
    /// Size reported by the filesystem, not the size recorded at upload.
    pub size_bytes: u64,
}

/// Look up `video` and stat its file.
///
/// The stat runs on every call so range bounds always reflect the current
/// file. A missing row and a missing file are both `NotFound`.
pub async fn locate(pool: &DbPool, video: VideoRef) -> Result<LocatedVideo> {
    let asset = with_conn(pool, move |conn| videos::get_video_by_ref(conn, video))
        .await?
        .ok_or_else(|| Error::not_found(video.kind().as_str(), video.uuid()))?;

    let path = PathBuf::from(&asset.storage_path);
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(Error::not_found("video file", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(video = %video, path = %path.display(), "Video file missing on disk");
            return Err(Error::not_found("video file", path.display()));
        }
        Err(e) => return Err(Error::Io { source: e }),
    };

    Ok(LocatedVideo {
        asset,
        path,
        size_bytes: metadata.len(),
    })
}
