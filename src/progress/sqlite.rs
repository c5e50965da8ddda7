//! SQLite-backed [`WatchStore`].

use async_trait::async_trait;
use reelmark_common::{EpisodeId, MovieId, ProfileId, Result, SeriesId, TrackId};
use reelmark_db::models::{NewSeriesWatch, WatchState, WatchedEpisode};
use reelmark_db::pool::DbPool;
use reelmark_db::queries::watching;

use super::store::{AddOutcome, WatchStore};
use crate::db::with_conn;

/// Production store; every operation is one query on the blocking pool.
#[derive(Clone)]
pub struct SqliteWatchStore {
    pool: DbPool,
}

impl SqliteWatchStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatchStore for SqliteWatchStore {
    async fn add_movie_watch(
        &self,
        profile_id: ProfileId,
        movie_id: MovieId,
        track_id: TrackId,
    ) -> Result<AddOutcome> {
        with_conn(&self.pool, move |conn| {
            watching::add_movie_watch(conn, profile_id, movie_id, track_id)
        })
        .await
    }

    async fn update_movie_watch(
        &self,
        profile_id: ProfileId,
        movie_id: MovieId,
        track_id: TrackId,
    ) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::update_movie_watch(conn, profile_id, movie_id, track_id)
        })
        .await
    }

    async fn remove_movie_watch(&self, profile_id: ProfileId, movie_id: MovieId) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::remove_movie_watch(conn, profile_id, movie_id)
        })
        .await
    }

    async fn add_series_watch(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        entry: NewSeriesWatch,
    ) -> Result<AddOutcome> {
        with_conn(&self.pool, move |conn| {
            watching::add_series_watch(conn, profile_id, series_id, &entry)
        })
        .await
    }

    async fn remove_series_watch(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
    ) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::remove_series_watch(conn, profile_id, series_id)
        })
        .await
    }

    async fn clear_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
    ) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::clear_active_episode(conn, profile_id, series_id)
        })
        .await
    }

    async fn set_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::set_active_episode(conn, profile_id, series_id, episode_id, track_id)
        })
        .await
    }

    async fn advance_active_episode_track(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::advance_active_episode_track(conn, profile_id, series_id, episode_id, track_id)
        })
        .await
    }

    async fn add_watched_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode: WatchedEpisode,
    ) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::add_watched_episode(conn, profile_id, series_id, episode)
        })
        .await
    }

    async fn update_watched_episode_track(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::update_watched_episode_track(conn, profile_id, series_id, episode_id, track_id)
        })
        .await
    }

    async fn remove_watched_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
    ) -> Result<usize> {
        with_conn(&self.pool, move |conn| {
            watching::remove_watched_episode(conn, profile_id, series_id, episode_id)
        })
        .await
    }

    async fn watch_state(&self, profile_id: ProfileId) -> Result<WatchState> {
        with_conn(&self.pool, move |conn| {
            watching::get_watch_state(conn, profile_id)
        })
        .await
    }
}
