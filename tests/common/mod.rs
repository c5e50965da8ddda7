//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a config pointing
//! at a temporary preview directory, and the full [`AppContext`]. Requests
//! are driven through the router with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use reelmark::config::Config;
use reelmark::server::{create_router, AppContext};
use reelmark_common::{EpisodeId, MovieId, ProfileId, SeriesId, VideoKind, DEFAULT_PROFILE_ID};
use reelmark_db::models::VideoAsset;
use reelmark_db::pool::{init_memory_pool, DbPool, PooledConnection};
use reelmark_db::queries::{auth_tokens, profiles, series, videos};
use tempfile::TempDir;
use tower::ServiceExt;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub dir: TempDir,
}

impl TestHarness {
    /// Auth disabled: every request acts as the default profile.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Auth enabled: requests need a bearer token or session cookie.
    pub fn with_auth() -> Self {
        Self::build(true)
    }

    fn build(auth: bool) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Config::default();
        config.server.auth.enabled = auth;
        config.storage.data_dir = dir.path().to_path_buf();
        config.storage.preview_dir = dir.path().join("previews");
        std::fs::create_dir_all(&config.storage.preview_dir).expect("failed to create previews");

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone());
        Self { ctx, db, dir }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    /// Get a database connection from the pool.
    ///
    /// The in-memory pool holds a single connection, so drop it before
    /// sending a request.
    pub fn conn(&self) -> PooledConnection {
        reelmark_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    pub fn preview_dir(&self) -> PathBuf {
        self.ctx.config.storage.preview_dir.clone()
    }

    pub fn create_profile(&self, name: &str) -> ProfileId {
        profiles::create_profile(&self.conn(), name).unwrap().id
    }

    pub fn issue_token(&self, profile_id: ProfileId) -> String {
        auth_tokens::issue_token(&self.conn(), profile_id, chrono::Duration::hours(1))
            .unwrap()
            .token
    }

    /// Write `size` bytes to a file in the temp dir and register it as a video.
    pub fn create_video(
        &self,
        kind: VideoKind,
        owner: ProfileId,
        size: usize,
        duration_ms: u64,
    ) -> VideoAsset {
        let path = self.dir.path().join(format!("{}.mp4", uuid::Uuid::new_v4()));
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();
        self.register(kind, owner, &path, size as u64, duration_ms)
    }

    pub fn register(
        &self,
        kind: VideoKind,
        owner: ProfileId,
        path: &Path,
        size: u64,
        duration_ms: u64,
    ) -> VideoAsset {
        let new = videos::NewVideo {
            kind,
            owner_id: owner,
            title: "Test".to_string(),
            storage_path: path.to_string_lossy().into_owned(),
            size_bytes: size,
            duration_ms,
        };
        videos::create_video(&self.conn(), &new).unwrap()
    }

    pub fn movie(&self, size: usize, duration_ms: u64) -> MovieId {
        let v = self.create_video(VideoKind::Movie, DEFAULT_PROFILE_ID, size, duration_ms);
        MovieId::from(v.id)
    }

    /// A series with `episodes` episodes in season 1.
    pub fn series(&self, episodes: u32, duration_ms: u64) -> (SeriesId, Vec<EpisodeId>) {
        let series_id = series::create_series(&self.conn(), DEFAULT_PROFILE_ID, "Show")
            .unwrap()
            .id;
        let mut ids = Vec::new();
        for nr in 1..=episodes {
            let v = self.create_video(VideoKind::Episode, DEFAULT_PROFILE_ID, 16, duration_ms);
            let episode_id = EpisodeId::from(v.id);
            series::add_episode(&self.conn(), series_id, episode_id, 1, nr).unwrap();
            ids.push(episode_id);
        }
        (series_id, ids)
    }

    pub fn video(&self, id: uuid::Uuid) -> Option<VideoAsset> {
        videos::get_video(&self.conn(), id).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(json_request("POST", uri, body, None)).await
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
