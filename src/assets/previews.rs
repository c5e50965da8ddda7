//! Preview image bookkeeping.
//!
//! Preview files are produced by an external transcoder; this module only
//! records the paths it reports and removes them again. Removal always
//! deletes files first and drops references second. A crash in between can
//! leave stray files on disk but never a reference to a deleted file.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use reelmark_common::{Error, ProfileId, Result};
use reelmark_db::models::VideoAsset;
use reelmark_db::pool::DbPool;
use reelmark_db::queries::videos;
use uuid::Uuid;

use crate::db::with_conn;

/// The external tool that extracts preview frames from a video.
#[async_trait]
pub trait PreviewTranscoder: Send + Sync {
    /// Write frames of `path` to files starting with `output_prefix` and
    /// return the paths written, in order.
    async fn transcode_preview_images(
        &self,
        path: &Path,
        output_prefix: &Path,
        fps: f64,
        resolution: &str,
    ) -> Result<Vec<PathBuf>>;
}

/// Frame sampling passed to the transcoder.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOptions {
    pub fps: f64,
    pub resolution: String,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            fps: 0.1,
            resolution: "320x180".to_string(),
        }
    }
}

/// Resolve a stored preview path under `preview_dir`.
///
/// Stored paths are relative to the preview directory. Absolute paths and
/// paths with `..` or root components are rejected.
pub fn resolve_preview_path(preview_dir: &Path, stored: &str) -> Result<PathBuf> {
    if stored.trim().is_empty() {
        return Err(Error::validation("preview path must not be empty"));
    }
    let relative = Path::new(stored);
    if !relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
        return Err(Error::validation(format!(
            "preview path must be relative to the preview directory: {stored}"
        )));
    }
    Ok(preview_dir.join(relative))
}

fn validate_paths(preview_dir: &Path, paths: &[String]) -> Result<()> {
    for p in paths {
        resolve_preview_path(preview_dir, p)?;
    }
    Ok(())
}

/// Whether `path` still lies inside `preview_dir` once symlinks in its
/// parent directories are resolved. `None` when the parent no longer exists.
async fn contained_in(preview_dir: &Path, path: &Path) -> std::io::Result<Option<bool>> {
    let root = tokio::fs::canonicalize(preview_dir).await?;
    let Some(parent) = path.parent() else {
        return Ok(Some(false));
    };
    match tokio::fs::canonicalize(parent).await {
        Ok(parent) => Ok(Some(parent.starts_with(&root))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

async fn load_owned(pool: &DbPool, video_id: Uuid, actor: ProfileId) -> Result<VideoAsset> {
    let video = with_conn(pool, move |conn| videos::get_video(conn, video_id))
        .await?
        .ok_or_else(|| Error::not_found("video", video_id))?;
    if video.owner_id != actor {
        return Err(Error::permission_denied(format!(
            "profile {actor} does not own video {video_id}"
        )));
    }
    Ok(video)
}

/// Append paths reported by the transcoder callback.
pub async fn append_previews(
    pool: &DbPool,
    preview_dir: &Path,
    actor: ProfileId,
    video_id: Uuid,
    paths: Vec<String>,
) -> Result<VideoAsset> {
    validate_paths(preview_dir, &paths)?;
    load_owned(pool, video_id, actor).await?;

    let count = paths.len();
    with_conn(pool, move |conn| {
        if videos::append_preview_images(conn, video_id, &paths)? == 0 {
            return Err(Error::not_found("video", video_id));
        }
        videos::get_video(conn, video_id)?.ok_or_else(|| Error::not_found("video", video_id))
    })
    .await
    .inspect(|_| tracing::debug!(video_id = %video_id, count, "Preview images recorded"))
}

/// Run the transcoder for a video and record what it produced.
pub async fn generate_previews(
    pool: &DbPool,
    preview_dir: &Path,
    transcoder: &dyn PreviewTranscoder,
    video_id: Uuid,
    options: &PreviewOptions,
) -> Result<VideoAsset> {
    let video = with_conn(pool, move |conn| videos::get_video(conn, video_id))
        .await?
        .ok_or_else(|| Error::not_found("video", video_id))?;

    tokio::fs::create_dir_all(preview_dir).await?;
    let output_prefix = preview_dir.join(video_id.to_string());
    let produced = transcoder
        .transcode_preview_images(
            Path::new(&video.storage_path),
            &output_prefix,
            options.fps,
            &options.resolution,
        )
        .await?;

    let paths: Vec<String> = produced
        .iter()
        .map(|p| p.strip_prefix(preview_dir).unwrap_or(p).display().to_string())
        .collect();
    if let Err(e) = validate_paths(preview_dir, &paths) {
        tracing::warn!(video_id = %video_id, error = %e, "Transcoder wrote outside the preview directory");
        return Err(Error::internal(format!("transcoder output rejected: {e}")));
    }

    let stored = paths.clone();
    let matched = with_conn(pool, move |conn| {
        videos::append_preview_images(conn, video_id, &stored)
    })
    .await?;

    if matched == 0 {
        // The video was deleted while the transcoder ran.
        let (_, failure) = remove_files(preview_dir, &paths).await;
        if let Some(e) = failure {
            tracing::warn!(
                video_id = %video_id,
                error = %e,
                "Failed to clean up previews of a deleted video"
            );
        }
        return Err(Error::not_found("video", video_id));
    }

    tracing::info!(video_id = %video_id, frames = paths.len(), "Generated preview images");
    with_conn(pool, move |conn| videos::get_video(conn, video_id))
        .await?
        .ok_or_else(|| Error::not_found("video", video_id))
}

/// Delete files, returning the stored paths that are now gone.
///
/// Already-missing files count as removed. Paths that resolve outside
/// `preview_dir` are never touched; their references are dropped. The first
/// other failure is returned alongside.
async fn remove_files(preview_dir: &Path, paths: &[String]) -> (Vec<String>, Option<Error>) {
    let mut removed = Vec::with_capacity(paths.len());
    let mut failure = None;

    for stored in paths {
        let path = match resolve_preview_path(preview_dir, stored) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping preview reference outside the preview directory");
                removed.push(stored.clone());
                continue;
            }
        };

        match contained_in(preview_dir, &path).await {
            Ok(Some(true)) => {}
            Ok(Some(false)) => {
                tracing::warn!(
                    "Dropping preview reference that escapes the preview directory: {}",
                    path.display()
                );
                removed.push(stored.clone());
                continue;
            }
            Ok(None) => {
                tracing::debug!("Preview already gone: {}", path.display());
                removed.push(stored.clone());
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve preview {}", path.display());
                if failure.is_none() {
                    failure = Some(Error::Io { source: e });
                }
                continue;
            }
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed.push(stored.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Preview already gone: {}", path.display());
                removed.push(stored.clone());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to delete preview {}", path.display());
                if failure.is_none() {
                    failure = Some(Error::Io { source: e });
                }
            }
        }
    }

    (removed, failure)
}

/// Delete a video's preview files, then its references to them.
///
/// References to files that could not be deleted are kept and the error is
/// returned.
pub async fn delete_previews(
    pool: &DbPool,
    preview_dir: &Path,
    actor: ProfileId,
    video_id: Uuid,
) -> Result<VideoAsset> {
    let video = load_owned(pool, video_id, actor).await?;
    let (removed, failure) = remove_files(preview_dir, &video.preview_image_paths).await;

    let updated = with_conn(pool, move |conn| {
        videos::remove_preview_images(conn, video_id, &removed)?;
        videos::get_video(conn, video_id)?.ok_or_else(|| Error::not_found("video", video_id))
    })
    .await?;

    match failure {
        Some(e) => Err(e),
        None => Ok(updated),
    }
}

/// Delete a video owned by `actor`: preview files, the video file, then the
/// record and everything referencing it.
pub async fn delete_video_asset(
    pool: &DbPool,
    preview_dir: &Path,
    actor: ProfileId,
    video_id: Uuid,
) -> Result<()> {
    delete_previews(pool, preview_dir, actor, video_id).await?;

    let video = load_owned(pool, video_id, actor).await?;
    match tokio::fs::remove_file(&video.storage_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::Io { source: e }),
    }

    with_conn(pool, move |conn| videos::delete_video(conn, video_id)).await?;
    tracing::info!(video_id = %video_id, kind = %video.kind, "Deleted video");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelmark_common::{VideoKind, DEFAULT_PROFILE_ID};
    use reelmark_db::pool::init_memory_pool;

    struct FakeTranscoder {
        frames: usize,
    }

    #[async_trait]
    impl PreviewTranscoder for FakeTranscoder {
        async fn transcode_preview_images(
            &self,
            _path: &Path,
            output_prefix: &Path,
            _fps: f64,
            _resolution: &str,
        ) -> Result<Vec<PathBuf>> {
            let mut out = Vec::new();
            for i in 0..self.frames {
                let p = PathBuf::from(format!("{}-{i:03}.jpg", output_prefix.display()));
                std::fs::write(&p, b"jpg")?;
                out.push(p);
            }
            Ok(out)
        }
    }

    fn video(pool: &DbPool, owner: ProfileId, storage_path: &str) -> Uuid {
        let conn = pool.get().unwrap();
        videos::create_video(
            &conn,
            &videos::NewVideo {
                kind: VideoKind::Movie,
                owner_id: owner,
                title: "m".into(),
                storage_path: storage_path.into(),
                size_bytes: 1,
                duration_ms: 1,
            },
        )
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn generate_then_delete() {
        let pool = init_memory_pool().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let id = video(&pool, DEFAULT_PROFILE_ID, "/media/m.mp4");

        let v = generate_previews(
            &pool,
            dir.path(),
            &FakeTranscoder { frames: 3 },
            id,
            &PreviewOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(v.preview_image_paths.len(), 3);
        assert!(v.preview_image_paths[0].starts_with(&id.to_string()));
        assert!(dir.path().join(&v.preview_image_paths[2]).exists());

        let v = delete_previews(&pool, dir.path(), DEFAULT_PROFILE_ID, id)
            .await
            .unwrap();
        assert!(v.preview_image_paths.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn non_owner_is_denied() {
        let pool = init_memory_pool().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let id = video(&pool, DEFAULT_PROFILE_ID, "/media/m.mp4");

        let err = delete_previews(&pool, dir.path(), ProfileId::new(), id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        let err = delete_video_asset(&pool, dir.path(), ProfileId::new(), id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn append_validates_paths() {
        let pool = init_memory_pool().unwrap();
        let id = video(&pool, DEFAULT_PROFILE_ID, "/media/m.mp4");

        let dir = tempfile::tempdir().unwrap();
        for bad in ["../etc/passwd", "/etc/passwd", "a/../../b.jpg", ""] {
            let err = append_previews(&pool, dir.path(), DEFAULT_PROFILE_ID, id, vec![bad.into()])
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "accepted {bad:?}");
        }

        let v = append_previews(&pool, dir.path(), DEFAULT_PROFILE_ID, id, vec!["a.jpg".into()])
            .await
            .unwrap();
        assert_eq!(v.preview_image_paths, vec!["a.jpg"]);
    }

    #[tokio::test]
    async fn delete_video_removes_files_and_record() {
        let pool = init_memory_pool().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("movie.mp4");
        std::fs::write(&media, b"data").unwrap();
        let id = video(&pool, DEFAULT_PROFILE_ID, media.to_str().unwrap());

        std::fs::write(dir.path().join("p1.jpg"), b"jpg").unwrap();
        append_previews(
            &pool,
            dir.path(),
            DEFAULT_PROFILE_ID,
            id,
            vec!["p1.jpg".into(), "gone.jpg".into()],
        )
            .await
            .unwrap();

        delete_video_asset(&pool, dir.path(), DEFAULT_PROFILE_ID, id)
            .await
            .unwrap();
        assert!(!media.exists());
        assert!(!dir.path().join("p1.jpg").exists());

        let conn = pool.get().unwrap();
        assert!(videos::get_video(&conn, id).unwrap().is_none());
    }

    #[test]
    fn resolve_keeps_paths_under_preview_dir() {
        let root = Path::new("/srv/previews");
        assert_eq!(
            resolve_preview_path(root, "v/001.jpg").unwrap(),
            root.join("v/001.jpg")
        );
        assert!(resolve_preview_path(root, "/srv/reelmark.db").is_err());
        assert!(resolve_preview_path(root, "../reelmark.db").is_err());
    }

    #[tokio::test]
    async fn stored_absolute_reference_never_deletes_outside_file() {
        let pool = init_memory_pool().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let preview_dir = outside.path().join("previews");
        std::fs::create_dir_all(&preview_dir).unwrap();
        let victim = outside.path().join("victim.bin");
        std::fs::write(&victim, b"keep").unwrap();
        let id = video(&pool, DEFAULT_PROFILE_ID, "/media/m.mp4");

        // A reference written before paths were validated.
        let stored = victim.display().to_string();
        {
            let conn = pool.get().unwrap();
            videos::append_preview_images(&conn, id, &[stored]).unwrap();
        }

        let v = delete_previews(&pool, &preview_dir, DEFAULT_PROFILE_ID, id)
            .await
            .unwrap();
        assert!(v.preview_image_paths.is_empty());
        assert!(victim.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_directory_does_not_escape() {
        let pool = init_memory_pool().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let preview_dir = outside.path().join("previews");
        let secrets = outside.path().join("secrets");
        std::fs::create_dir_all(&preview_dir).unwrap();
        std::fs::create_dir_all(&secrets).unwrap();
        std::fs::write(secrets.join("key.bin"), b"keep").unwrap();
        std::os::unix::fs::symlink(&secrets, preview_dir.join("link")).unwrap();
        let id = video(&pool, DEFAULT_PROFILE_ID, "/media/m.mp4");

        append_previews(
            &pool,
            &preview_dir,
            DEFAULT_PROFILE_ID,
            id,
            vec!["link/key.bin".into()],
        )
        .await
        .unwrap();
        delete_previews(&pool, &preview_dir, DEFAULT_PROFILE_ID, id)
            .await
            .unwrap();
        assert!(secrets.join("key.bin").exists());
    }

    struct StrayTranscoder {
        target: PathBuf,
    }

    #[async_trait]
    impl PreviewTranscoder for StrayTranscoder {
        async fn transcode_preview_images(
            &self,
            _path: &Path,
            _output_prefix: &Path,
            _fps: f64,
            _resolution: &str,
        ) -> Result<Vec<PathBuf>> {
            Ok(vec![self.target.clone()])
        }
    }

    #[tokio::test]
    async fn generated_paths_outside_preview_dir_are_rejected() {
        let pool = init_memory_pool().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let preview_dir = outside.path().join("previews");
        let id = video(&pool, DEFAULT_PROFILE_ID, "/media/m.mp4");

        let err = generate_previews(
            &pool,
            &preview_dir,
            &StrayTranscoder {
                target: outside.path().join("elsewhere.jpg"),
            },
            id,
            &PreviewOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));

        let conn = pool.get().unwrap();
        let v = videos::get_video(&conn, id).unwrap().unwrap();
        assert!(v.preview_image_paths.is_empty());
    }

    /// Writes one frame, then deletes the video before returning.
    struct DeletingTranscoder {
        pool: DbPool,
        video_id: Uuid,
    }

    #[async_trait]
    impl PreviewTranscoder for DeletingTranscoder {
        async fn transcode_preview_images(
            &self,
            _path: &Path,
            output_prefix: &Path,
            _fps: f64,
            _resolution: &str,
        ) -> Result<Vec<PathBuf>> {
            let frame = PathBuf::from(format!("{}-000.jpg", output_prefix.display()));
            std::fs::write(&frame, b"jpg")?;
            let conn = self.pool.get().unwrap();
            videos::delete_video(&conn, self.video_id)?;
            Ok(vec![frame])
        }
    }

    #[tokio::test]
    async fn frames_of_a_video_deleted_mid_transcode_are_removed() {
        let pool = init_memory_pool().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let id = video(&pool, DEFAULT_PROFILE_ID, "/media/m.mp4");

        let err = generate_previews(
            &pool,
            dir.path(),
            &DeletingTranscoder {
                pool: pool.clone(),
                video_id: id,
            },
            id,
            &PreviewOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
