//! Byte-range video streaming.
//!
//! # Routes
//!
//! - `GET /video/movie/{movie_id}` - Partial content of a movie
//! - `GET /video/episode/{episode_id}` - Partial content of an episode
//!
//! Both require a `Range` header and answer with at most one chunk of
//! [`range::CHUNK_CEILING`] bytes. A request whose window starts at byte 0
//! counts as one view of the video.

pub mod direct;
pub mod locator;
pub mod range;

pub use direct::{GuardedStream, StreamOutcome};
pub use locator::{locate, LocatedVideo};
pub use range::{plan, plan_request, RangeWindow, CHUNK_CEILING};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Router,
};
use reelmark_common::{EpisodeId, Error, MovieId, VideoRef};
use reelmark_db::queries::videos;

use crate::db::with_conn;
use crate::server::error::ApiResult;
use crate::server::{parse_path_id, AppContext};

/// Create the video streaming router.
pub fn video_router() -> Router<AppContext> {
    Router::new()
        .route("/movie/:movie_id", get(stream_movie))
        .route("/episode/:episode_id", get(stream_episode))
}

/// Stream a window of a movie.
pub async fn stream_movie(
    State(ctx): State<AppContext>,
    Path(movie_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let movie_id: MovieId = parse_path_id(&movie_id, "movie")?;
    serve_window(&ctx, VideoRef::Movie(movie_id), &headers).await
}

/// Stream a window of an episode.
pub async fn stream_episode(
    State(ctx): State<AppContext>,
    Path(episode_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let episode_id: EpisodeId = parse_path_id(&episode_id, "episode")?;
    serve_window(&ctx, VideoRef::Episode(episode_id), &headers).await
}

async fn serve_window(ctx: &AppContext, video: VideoRef, headers: &HeaderMap) -> ApiResult<Response> {
    let raw_range = headers
        .get(header::RANGE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .ok_or(Error::MissingRange)?;

    let located = locate(&ctx.db_pool, video).await?;
    let window = plan_request(Some(&raw_range), located.size_bytes)?;

    if window.start == 0 {
        let id = video.uuid();
        if let Err(e) = with_conn(&ctx.db_pool, move |conn| videos::record_view(conn, id)).await {
            tracing::warn!(video = %video, error = %e, "Failed to record view");
        }
    }

    tracing::debug!(
        video = %video,
        start = window.start,
        end = window.end,
        size = located.size_bytes,
        "Serving range"
    );

    let response =
        direct::partial_response(&located, window, &ctx.config.streaming.content_type).await?;
    Ok(response)
}
