//! Watch-progress routes.
//!
//! Each POST carries a JSON body naming the target ids and, where relevant,
//! the playback offset (`trackId`, milliseconds). Writes answer 200 with the
//! caller's updated watch state; removals answer 204.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reelmark_common::{EpisodeId, MovieId, SeriesId, TrackId};
use reelmark_db::models::{ActiveEpisode, NewSeriesWatch, WatchState, WatchedEpisode};
use serde::Deserialize;

use super::auth::CurrentProfile;
use super::error::ApiResult;
use super::extract::ValidJson;
use super::AppContext;

/// Create watch-progress routes.
pub fn watching_routes() -> Router<AppContext> {
    Router::new()
        .route("/watching", get(get_watching))
        .route("/profile/addToMoviesWatched", post(add_to_movies_watched))
        .route("/profile/updateMoviesWatched", post(update_movies_watched))
        .route("/profile/removeMovieWatched", post(remove_movie_watched))
        .route("/profile/addToSeriesWatched", post(add_to_series_watched))
        .route("/profile/removeSeriesWatched", post(remove_series_watched))
        .route(
            "/profile/setSeriesWatchedActiveEpisode",
            post(set_series_watched_active_episode),
        )
        .route(
            "/profile/clearSeriesWatchedActiveEpisode",
            post(clear_series_watched_active_episode),
        )
        .route(
            "/profile/updateSeriesWatchedActiveEpisode",
            post(update_series_watched_active_episode),
        )
        .route(
            "/profile/addToSeriesWatchedEpisodes",
            post(add_to_series_watched_episodes),
        )
        .route(
            "/profile/updateSeriesWatchedEpisode",
            post(update_series_watched_episode),
        )
        .route("/profile/removeEpisodeWatched", post(remove_episode_watched))
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MovieTrackRequest {
    pub movie_id: MovieId,
    pub track_id: TrackId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MovieRequest {
    pub movie_id: MovieId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddSeriesRequest {
    pub series_id: SeriesId,
    #[serde(default)]
    pub active_episode: Option<ActiveEpisode>,
    #[serde(default)]
    pub watched_episodes: Vec<WatchedEpisode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeriesRequest {
    pub series_id: SeriesId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeriesTrackRequest {
    pub series_id: SeriesId,
    pub track_id: TrackId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EpisodeTrackRequest {
    pub series_id: SeriesId,
    pub episode_id: EpisodeId,
    pub track_id: TrackId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EpisodeRequest {
    pub series_id: SeriesId,
    pub episode_id: EpisodeId,
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_watching(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
) -> ApiResult<Json<WatchState>> {
    Ok(Json(ctx.progress.watching(profile_id).await?))
}

async fn add_to_movies_watched(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<MovieTrackRequest>,
) -> ApiResult<Json<WatchState>> {
    let state = ctx
        .progress
        .add_to_movies_watched(profile_id, req.movie_id, req.track_id)
        .await?;
    Ok(Json(state))
}

async fn update_movies_watched(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<MovieTrackRequest>,
) -> ApiResult<Json<WatchState>> {
    let state = ctx
        .progress
        .update_movies_watched(profile_id, req.movie_id, req.track_id)
        .await?;
    Ok(Json(state))
}

async fn remove_movie_watched(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<MovieRequest>,
) -> ApiResult<StatusCode> {
    ctx.progress
        .remove_movie_watched(profile_id, req.movie_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_series_watched(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<AddSeriesRequest>,
) -> ApiResult<Json<WatchState>> {
    let entry = NewSeriesWatch {
        active_episode: req.active_episode,
        watched_episodes: req.watched_episodes,
    };
    let state = ctx
        .progress
        .add_to_series_watched(profile_id, req.series_id, entry)
        .await?;
    Ok(Json(state))
}

async fn remove_series_watched(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<SeriesRequest>,
) -> ApiResult<StatusCode> {
    ctx.progress
        .remove_series_watched(profile_id, req.series_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_series_watched_active_episode(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<EpisodeTrackRequest>,
) -> ApiResult<Json<WatchState>> {
    let state = ctx
        .progress
        .set_series_watched_active_episode(profile_id, req.series_id, req.episode_id, req.track_id)
        .await?;
    Ok(Json(state))
}

async fn clear_series_watched_active_episode(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<SeriesRequest>,
) -> ApiResult<Json<WatchState>> {
    let state = ctx
        .progress
        .clear_series_watched_active_episode(profile_id, req.series_id)
        .await?;
    Ok(Json(state))
}

async fn update_series_watched_active_episode(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<SeriesTrackRequest>,
) -> ApiResult<Json<WatchState>> {
    let state = ctx
        .progress
        .update_series_watched_active_episode(profile_id, req.series_id, req.track_id)
        .await?;
    Ok(Json(state))
}

async fn add_to_series_watched_episodes(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<EpisodeTrackRequest>,
) -> ApiResult<Json<WatchState>> {
    let episode = WatchedEpisode {
        episode_id: req.episode_id,
        track_id: req.track_id,
    };
    let state = ctx
        .progress
        .add_to_series_watched_episodes(profile_id, req.series_id, episode)
        .await?;
    Ok(Json(state))
}

async fn update_series_watched_episode(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<EpisodeTrackRequest>,
) -> ApiResult<Json<WatchState>> {
    let state = ctx
        .progress
        .update_series_watched_episode(profile_id, req.series_id, req.episode_id, req.track_id)
        .await?;
    Ok(Json(state))
}

async fn remove_episode_watched(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    ValidJson(req): ValidJson<EpisodeRequest>,
) -> ApiResult<StatusCode> {
    ctx.progress
        .remove_episode_watched(profile_id, req.series_id, req.episode_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
