//! Maps playback events onto watch-store operations.
//!
//! The router owns the checks the store does not make: the profile and the
//! target asset exist, the track fits inside the video, and an episode
//! belongs to the series it is recorded against. It also turns zero-match
//! updates into `NotFound`, since for those operations an existing entry is
//! a precondition. Removals stay silent when nothing matched.

use std::sync::Arc;

use reelmark_common::{
    EpisodeId, Error, MovieId, ProfileId, Result, SeriesId, TrackId, VideoRef,
};
use reelmark_db::models::{NewSeriesWatch, WatchState, WatchedEpisode};
use reelmark_db::pool::DbPool;
use reelmark_db::queries::{profiles, series, videos};

use super::store::{AddOutcome, WatchStore};
use crate::db::with_conn;

#[derive(Clone)]
pub struct ProgressRouter {
    store: Arc<dyn WatchStore>,
    catalog: DbPool,
}

impl ProgressRouter {
    /// `catalog` resolves profiles, videos and series for validation.
    pub fn new(store: Arc<dyn WatchStore>, catalog: DbPool) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &Arc<dyn WatchStore> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    async fn ensure_profile(&self, profile_id: ProfileId) -> Result<()> {
        let exists =
            with_conn(&self.catalog, move |conn| profiles::profile_exists(conn, profile_id))
                .await?;
        if exists {
            Ok(())
        } else {
            Err(Error::not_found("profile", profile_id))
        }
    }

    /// Check `track_id` against the duration of `video`.
    async fn ensure_track(&self, video: VideoRef, track_id: TrackId) -> Result<()> {
        let asset = with_conn(&self.catalog, move |conn| videos::get_video_by_ref(conn, video))
            .await?
            .ok_or_else(|| Error::not_found(video.kind().as_str(), video.uuid()))?;

        if track_id > asset.duration_ms {
            return Err(Error::validation(format!(
                "trackId {track_id} exceeds duration {} of {video}",
                asset.duration_ms
            )));
        }
        Ok(())
    }

    async fn ensure_series(&self, series_id: SeriesId) -> Result<()> {
        let found = with_conn(&self.catalog, move |conn| series::get_series(conn, series_id))
            .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(Error::not_found("series", series_id)),
        }
    }

    async fn ensure_episode(
        &self,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<()> {
        self.ensure_track(VideoRef::Episode(episode_id), track_id)
            .await?;
        let member = with_conn(&self.catalog, move |conn| {
            series::series_contains_episode(conn, series_id, episode_id)
        })
        .await?;
        if !member {
            return Err(Error::validation(format!(
                "episode {episode_id} is not part of series {series_id}"
            )));
        }
        Ok(())
    }

    fn expect_match(n: usize, entity: &str, id: impl std::fmt::Display) -> Result<()> {
        if n == 0 {
            Err(Error::not_found(entity, id))
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Movies
    // ------------------------------------------------------------------

    /// Start watching a movie.
    pub async fn add_to_movies_watched(
        &self,
        profile_id: ProfileId,
        movie_id: MovieId,
        track_id: TrackId,
    ) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;
        self.ensure_track(VideoRef::Movie(movie_id), track_id)
            .await?;

        match self
            .store
            .add_movie_watch(profile_id, movie_id, track_id)
            .await?
        {
            AddOutcome::Inserted => {
                tracing::debug!(profile_id = %profile_id, movie_id = %movie_id, "Movie watch added");
            }
            AddOutcome::AlreadyPresent => {
                return Err(Error::Conflict(format!(
                    "movie {movie_id} is already being watched"
                )));
            }
        }
        self.store.watch_state(profile_id).await
    }

    /// Advance the playback position of a watched movie.
    pub async fn update_movies_watched(
        &self,
        profile_id: ProfileId,
        movie_id: MovieId,
        track_id: TrackId,
    ) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;
        self.ensure_track(VideoRef::Movie(movie_id), track_id)
            .await?;

        let n = self
            .store
            .update_movie_watch(profile_id, movie_id, track_id)
            .await?;
        Self::expect_match(n, "movie watch entry", movie_id)?;
        self.store.watch_state(profile_id).await
    }

    /// Finish (or abandon) a movie.
    pub async fn remove_movie_watched(&self, profile_id: ProfileId, movie_id: MovieId) -> Result<()> {
        self.ensure_profile(profile_id).await?;
        let n = self.store.remove_movie_watch(profile_id, movie_id).await?;
        if n == 0 {
            tracing::debug!(profile_id = %profile_id, movie_id = %movie_id, "No movie watch entry to remove");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Series
    // ------------------------------------------------------------------

    /// Start watching a series, optionally with an active episode and history.
    pub async fn add_to_series_watched(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        entry: NewSeriesWatch,
    ) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;
        self.ensure_series(series_id).await?;
        if let Some(active) = entry.active_episode {
            self.ensure_episode(series_id, active.episode_id, active.track_id)
                .await?;
        }
        for episode in &entry.watched_episodes {
            self.ensure_episode(series_id, episode.episode_id, episode.track_id)
                .await?;
        }

        match self
            .store
            .add_series_watch(profile_id, series_id, entry)
            .await?
        {
            AddOutcome::Inserted => {
                tracing::debug!(profile_id = %profile_id, series_id = %series_id, "Series watch added");
            }
            AddOutcome::AlreadyPresent => {
                return Err(Error::Conflict(format!(
                    "series {series_id} is already being watched"
                )));
            }
        }
        self.store.watch_state(profile_id).await
    }

    pub async fn remove_series_watched(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
    ) -> Result<()> {
        self.ensure_profile(profile_id).await?;
        let n = self
            .store
            .remove_series_watch(profile_id, series_id)
            .await?;
        if n == 0 {
            tracing::debug!(profile_id = %profile_id, series_id = %series_id, "No series watch entry to remove");
        }
        Ok(())
    }

    /// Switch the active episode in one step.
    pub async fn set_series_watched_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;
        self.ensure_episode(series_id, episode_id, track_id).await?;

        let n = self
            .store
            .set_active_episode(profile_id, series_id, episode_id, track_id)
            .await?;
        Self::expect_match(n, "series watch entry", series_id)?;
        self.store.watch_state(profile_id).await
    }

    pub async fn clear_series_watched_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
    ) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;
        let n = self
            .store
            .clear_active_episode(profile_id, series_id)
            .await?;
        Self::expect_match(n, "series watch entry", series_id)?;
        self.store.watch_state(profile_id).await
    }

    /// Advance the playback position of the active episode.
    pub async fn update_series_watched_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        track_id: TrackId,
    ) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;

        let state = self.store.watch_state(profile_id).await?;
        let active = state
            .series(series_id)
            .ok_or_else(|| Error::not_found("series watch entry", series_id))?
            .active_episode
            .ok_or_else(|| Error::not_found("active episode of series", series_id))?;
        self.ensure_track(VideoRef::Episode(active.episode_id), track_id)
            .await?;

        let n = self
            .store
            .advance_active_episode_track(profile_id, series_id, active.episode_id, track_id)
            .await?;
        if n == 0 {
            // The track was checked against `active`; another episode may
            // have become active since, so nothing was written.
            let state = self.store.watch_state(profile_id).await?;
            return match state.series(series_id).and_then(|s| s.active_episode) {
                Some(current) => Err(Error::Conflict(format!(
                    "active episode of series {series_id} changed to {}",
                    current.episode_id
                ))),
                None => Err(Error::not_found("active episode of series", series_id)),
            };
        }
        self.store.watch_state(profile_id).await
    }

    /// Record an episode in the series history; repeated calls overwrite its track.
    pub async fn add_to_series_watched_episodes(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode: WatchedEpisode,
    ) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;
        self.ensure_episode(series_id, episode.episode_id, episode.track_id)
            .await?;

        let n = self
            .store
            .add_watched_episode(profile_id, series_id, episode)
            .await?;
        Self::expect_match(n, "series watch entry", series_id)?;
        self.store.watch_state(profile_id).await
    }

    pub async fn update_series_watched_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;
        self.ensure_track(VideoRef::Episode(episode_id), track_id)
            .await?;

        let n = self
            .store
            .update_watched_episode_track(profile_id, series_id, episode_id, track_id)
            .await?;
        Self::expect_match(n, "watched episode", episode_id)?;
        self.store.watch_state(profile_id).await
    }

    pub async fn remove_episode_watched(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
    ) -> Result<()> {
        self.ensure_profile(profile_id).await?;
        let n = self
            .store
            .remove_watched_episode(profile_id, series_id, episode_id)
            .await?;
        if n == 0 {
            tracing::debug!(
                profile_id = %profile_id,
                series_id = %series_id,
                episode_id = %episode_id,
                "No watched episode to remove"
            );
        }
        Ok(())
    }

    pub async fn watching(&self, profile_id: ProfileId) -> Result<WatchState> {
        self.ensure_profile(profile_id).await?;
        self.store.watch_state(profile_id).await
    }
}
