//! The watch-progress store seam.

use async_trait::async_trait;
use reelmark_common::{EpisodeId, MovieId, ProfileId, Result, SeriesId, TrackId};
use reelmark_db::models::{NewSeriesWatch, WatchState, WatchedEpisode};

pub use reelmark_db::queries::watching::AddOutcome;

/// Targeted partial updates of one profile's watch state.
///
/// Each write touches at most one entry, located by its identity (movie,
/// series or episode id), and only within `profile_id`. Writes return the
/// number of entries they matched; a zero is not an error at this layer.
#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Append a movie entry unless one exists for `movie_id`.
    async fn add_movie_watch(
        &self,
        profile_id: ProfileId,
        movie_id: MovieId,
        track_id: TrackId,
    ) -> Result<AddOutcome>;

    async fn update_movie_watch(
        &self,
        profile_id: ProfileId,
        movie_id: MovieId,
        track_id: TrackId,
    ) -> Result<usize>;

    async fn remove_movie_watch(&self, profile_id: ProfileId, movie_id: MovieId) -> Result<usize>;

    /// Append a series entry unless one exists for `series_id`.
    async fn add_series_watch(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        entry: NewSeriesWatch,
    ) -> Result<AddOutcome>;

    async fn remove_series_watch(&self, profile_id: ProfileId, series_id: SeriesId)
        -> Result<usize>;

    async fn clear_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
    ) -> Result<usize>;

    /// Replace the active episode in a single step.
    async fn set_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize>;

    /// Set the track of the active episode if it is still `episode_id`;
    /// matches nothing when none is set or another episode became active.
    async fn advance_active_episode_track(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize>;

    /// Record a watched episode. An existing record for the same episode has
    /// its track overwritten instead of being duplicated.
    async fn add_watched_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode: WatchedEpisode,
    ) -> Result<usize>;

    async fn update_watched_episode_track(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize>;

    async fn remove_watched_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
    ) -> Result<usize>;

    /// Everything `profile_id` is watching, entries in insertion order.
    async fn watch_state(&self, profile_id: ProfileId) -> Result<WatchState>;
}
