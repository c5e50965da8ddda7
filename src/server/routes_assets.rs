//! Asset routes: video and series lookup, preview bookkeeping, deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reelmark_common::{Error, SeriesId};
use reelmark_db::models::{SeriesAsset, VideoAsset};
use reelmark_db::queries::{series, videos};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::CurrentProfile;
use super::error::ApiResult;
use super::extract::{parse_path_id, ValidJson};
use super::AppContext;
use crate::assets;
use crate::db::with_conn;

/// Create asset routes.
pub fn asset_routes() -> Router<AppContext> {
    Router::new()
        .route("/videos/:video_id", get(get_video).delete(delete_video))
        .route(
            "/videos/:video_id/previews",
            post(append_previews).delete(delete_previews),
        )
        .route("/series/:series_id", get(get_series))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AppendPreviewsRequest {
    pub paths: Vec<String>,
}

async fn get_video(
    State(ctx): State<AppContext>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoAsset>> {
    let id: Uuid = parse_path_id(&video_id, "video")?;
    let video = with_conn(&ctx.db_pool, move |conn| videos::get_video(conn, id))
        .await?
        .ok_or_else(|| Error::not_found("video", id))?;
    Ok(Json(video))
}

async fn get_series(
    State(ctx): State<AppContext>,
    Path(series_id): Path<String>,
) -> ApiResult<Json<SeriesAsset>> {
    let id: SeriesId = parse_path_id(&series_id, "series")?;
    let found = with_conn(&ctx.db_pool, move |conn| series::get_series(conn, id))
        .await?
        .ok_or_else(|| Error::not_found("series", id))?;
    Ok(Json(found))
}

async fn append_previews(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    Path(video_id): Path<String>,
    ValidJson(req): ValidJson<AppendPreviewsRequest>,
) -> ApiResult<Json<VideoAsset>> {
    let id: Uuid = parse_path_id(&video_id, "video")?;
    let video = assets::append_previews(
        &ctx.db_pool,
        &ctx.config.storage.preview_dir,
        profile_id,
        id,
        req.paths,
    )
    .await?;
    Ok(Json(video))
}

async fn delete_previews(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoAsset>> {
    let id: Uuid = parse_path_id(&video_id, "video")?;
    let video = assets::delete_previews(
        &ctx.db_pool,
        &ctx.config.storage.preview_dir,
        profile_id,
        id,
    )
    .await?;
    Ok(Json(video))
}

async fn delete_video(
    State(ctx): State<AppContext>,
    CurrentProfile(profile_id): CurrentProfile,
    Path(video_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: Uuid = parse_path_id(&video_id, "video")?;
    assets::delete_video_asset(
        &ctx.db_pool,
        &ctx.config.storage.preview_dir,
        profile_id,
        id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
