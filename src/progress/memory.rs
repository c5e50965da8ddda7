//! In-memory [`WatchStore`].
//!
//! Per-profile state is held in maps keyed by movie, series and episode id,
//! so an update finds its target by identity in one lookup. A sequence
//! number stamped on insert preserves the insertion order readers expect.
//! One mutex guards all profiles; every operation holds it for a single
//! lookup-and-write, which is the in-memory counterpart of a
//! single-statement update.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use reelmark_common::{EpisodeId, MovieId, ProfileId, Result, SeriesId, TrackId};
use reelmark_db::models::{
    ActiveEpisode, NewSeriesWatch, WatchState, WatchedEpisode, WatchingMovie, WatchingSeries,
};

use super::store::{AddOutcome, WatchStore};

#[derive(Debug, Default)]
struct SeriesSlot {
    seq: u64,
    active: Option<ActiveEpisode>,
    watched: HashMap<EpisodeId, (u64, TrackId)>,
}

#[derive(Debug, Default)]
struct ProfileWatch {
    movies: HashMap<MovieId, (u64, TrackId)>,
    series: HashMap<SeriesId, SeriesSlot>,
}

#[derive(Debug, Default)]
struct Inner {
    profiles: HashMap<ProfileId, ProfileWatch>,
    next_seq: u64,
}

impl Inner {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn series_mut(&mut self, profile_id: ProfileId, series_id: SeriesId) -> Option<&mut SeriesSlot> {
        self.profiles
            .get_mut(&profile_id)
            .and_then(|p| p.series.get_mut(&series_id))
    }
}

fn upsert_watched(slot: &mut SeriesSlot, seq: u64, episode: WatchedEpisode) {
    slot.watched
        .entry(episode.episode_id)
        .and_modify(|(_, track)| *track = episode.track_id)
        .or_insert((seq, episode.track_id));
}

/// Watch store for tests and single-process deployments without a database.
#[derive(Debug, Default)]
pub struct MemoryWatchStore {
    inner: Mutex<Inner>,
}

impl MemoryWatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WatchStore for MemoryWatchStore {
    async fn add_movie_watch(
        &self,
        profile_id: ProfileId,
        movie_id: MovieId,
        track_id: TrackId,
    ) -> Result<AddOutcome> {
        let mut inner = self.inner.lock();
        let seq = inner.seq();
        let profile = inner.profiles.entry(profile_id).or_default();
        if profile.movies.contains_key(&movie_id) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        profile.movies.insert(movie_id, (seq, track_id));
        Ok(AddOutcome::Inserted)
    }

    async fn update_movie_watch(
        &self,
        profile_id: ProfileId,
        movie_id: MovieId,
        track_id: TrackId,
    ) -> Result<usize> {
        let mut inner = self.inner.lock();
        let entry = inner
            .profiles
            .get_mut(&profile_id)
            .and_then(|p| p.movies.get_mut(&movie_id));
        Ok(match entry {
            Some((_, track)) => {
                *track = track_id;
                1
            }
            None => 0,
        })
    }

    async fn remove_movie_watch(&self, profile_id: ProfileId, movie_id: MovieId) -> Result<usize> {
        let mut inner = self.inner.lock();
        let removed = inner
            .profiles
            .get_mut(&profile_id)
            .and_then(|p| p.movies.remove(&movie_id));
        Ok(usize::from(removed.is_some()))
    }

    async fn add_series_watch(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        entry: NewSeriesWatch,
    ) -> Result<AddOutcome> {
        let mut inner = self.inner.lock();
        let seq = inner.seq();
        if inner.series_mut(profile_id, series_id).is_some() {
            return Ok(AddOutcome::AlreadyPresent);
        }

        let mut slot = SeriesSlot {
            seq,
            active: entry.active_episode,
            watched: HashMap::new(),
        };
        for episode in entry.watched_episodes {
            let seq = inner.seq();
            upsert_watched(&mut slot, seq, episode);
        }
        inner
            .profiles
            .entry(profile_id)
            .or_default()
            .series
            .insert(series_id, slot);
        Ok(AddOutcome::Inserted)
    }

    async fn remove_series_watch(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
    ) -> Result<usize> {
        let mut inner = self.inner.lock();
        let removed = inner
            .profiles
            .get_mut(&profile_id)
            .and_then(|p| p.series.remove(&series_id));
        Ok(usize::from(removed.is_some()))
    }

    async fn clear_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
    ) -> Result<usize> {
        let mut inner = self.inner.lock();
        Ok(match inner.series_mut(profile_id, series_id) {
            Some(slot) => {
                slot.active = None;
                1
            }
            None => 0,
        })
    }

    async fn set_active_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize> {
        let mut inner = self.inner.lock();
        Ok(match inner.series_mut(profile_id, series_id) {
            Some(slot) => {
                slot.active = Some(ActiveEpisode {
                    episode_id,
                    track_id,
                });
                1
            }
            None => 0,
        })
    }

    async fn advance_active_episode_track(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize> {
        let mut inner = self.inner.lock();
        let active = inner
            .series_mut(profile_id, series_id)
            .and_then(|slot| slot.active.as_mut())
            .filter(|active| active.episode_id == episode_id);
        Ok(match active {
            Some(active) => {
                active.track_id = track_id;
                1
            }
            None => 0,
        })
    }

    async fn add_watched_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode: WatchedEpisode,
    ) -> Result<usize> {
        let mut inner = self.inner.lock();
        let seq = inner.seq();
        Ok(match inner.series_mut(profile_id, series_id) {
            Some(slot) => {
                upsert_watched(slot, seq, episode);
                1
            }
            None => 0,
        })
    }

    async fn update_watched_episode_track(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
        track_id: TrackId,
    ) -> Result<usize> {
        let mut inner = self.inner.lock();
        let entry = inner
            .series_mut(profile_id, series_id)
            .and_then(|slot| slot.watched.get_mut(&episode_id));
        Ok(match entry {
            Some((_, track)) => {
                *track = track_id;
                1
            }
            None => 0,
        })
    }

    async fn remove_watched_episode(
        &self,
        profile_id: ProfileId,
        series_id: SeriesId,
        episode_id: EpisodeId,
    ) -> Result<usize> {
        let mut inner = self.inner.lock();
        let removed = inner
            .series_mut(profile_id, series_id)
            .and_then(|slot| slot.watched.remove(&episode_id));
        Ok(usize::from(removed.is_some()))
    }

    async fn watch_state(&self, profile_id: ProfileId) -> Result<WatchState> {
        let inner = self.inner.lock();
        let mut state = WatchState::new(profile_id);
        let Some(profile) = inner.profiles.get(&profile_id) else {
            return Ok(state);
        };

        let mut movies: Vec<_> = profile.movies.iter().collect();
        movies.sort_by_key(|(_, (seq, _))| *seq);
        state.movies = movies
            .into_iter()
            .map(|(movie_id, (_, track_id))| WatchingMovie {
                movie_id: *movie_id,
                track_id: *track_id,
            })
            .collect();

        let mut series: Vec<_> = profile.series.iter().collect();
        series.sort_by_key(|(_, slot)| slot.seq);
        state.series = series
            .into_iter()
            .map(|(series_id, slot)| {
                let mut watched: Vec<_> = slot.watched.iter().collect();
                watched.sort_by_key(|(_, (seq, _))| *seq);
                WatchingSeries {
                    series_id: *series_id,
                    active_episode: slot.active,
                    watched_episodes: watched
                        .into_iter()
                        .map(|(episode_id, (_, track_id))| WatchedEpisode {
                            episode_id: *episode_id,
                            track_id: *track_id,
                        })
                        .collect(),
                }
            })
            .collect();

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::behaviour::{self, Fixture};

    fn fixture() -> (MemoryWatchStore, Fixture) {
        let fx = Fixture {
            profile: ProfileId::new(),
            other_profile: ProfileId::new(),
            movie: MovieId::new(),
            other_movie: MovieId::new(),
            series: SeriesId::new(),
            other_series: SeriesId::new(),
            e1: EpisodeId::new(),
            e2: EpisodeId::new(),
        };
        (MemoryWatchStore::new(), fx)
    }

    #[tokio::test]
    async fn movie_lifecycle() {
        let (store, fx) = fixture();
        behaviour::movie_lifecycle(&store, &fx).await;
    }

    #[tokio::test]
    async fn series_active_episode() {
        let (store, fx) = fixture();
        behaviour::series_active_episode(&store, &fx).await;
    }

    #[tokio::test]
    async fn watched_episodes_unique() {
        let (store, fx) = fixture();
        behaviour::watched_episodes_unique(&store, &fx).await;
    }

    #[tokio::test]
    async fn removals_are_scoped() {
        let (store, fx) = fixture();
        behaviour::removals_are_scoped(&store, &fx).await;
    }

    #[tokio::test]
    async fn zero_matches_without_entry() {
        let (store, fx) = fixture();
        behaviour::zero_matches_without_entry(&store, &fx).await;
    }

    #[tokio::test]
    async fn initial_series_contents() {
        let (store, fx) = fixture();
        behaviour::initial_series_contents(&store, &fx).await;
    }

    #[tokio::test]
    async fn concurrent_adds_keep_one_entry() {
        let store = std::sync::Arc::new(MemoryWatchStore::new());
        let profile = ProfileId::new();
        let series = SeriesId::new();
        let episode = EpisodeId::new();
        store
            .add_series_watch(profile, series, NewSeriesWatch::default())
            .await
            .unwrap();

        let handles: Vec<_> = (0..16u64)
            .map(|track| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .add_watched_episode(
                            profile,
                            series,
                            WatchedEpisode {
                                episode_id: episode,
                                track_id: track,
                            },
                        )
                        .await
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), 1);
        }

        let state = store.watch_state(profile).await.unwrap();
        assert_eq!(state.series(series).unwrap().watched_episodes.len(), 1);
    }
}
