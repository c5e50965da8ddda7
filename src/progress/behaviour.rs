//! Behaviour shared by every [`WatchStore`] implementation.

use reelmark_common::{EpisodeId, MovieId, ProfileId, SeriesId};
use reelmark_db::models::{ActiveEpisode, NewSeriesWatch, WatchedEpisode};

use super::store::{AddOutcome, WatchStore};

/// Ids the store under test accepts (rows must exist for SQLite).
pub struct Fixture {
    pub profile: ProfileId,
    pub other_profile: ProfileId,
    pub movie: MovieId,
    pub other_movie: MovieId,
    pub series: SeriesId,
    pub other_series: SeriesId,
    pub e1: EpisodeId,
    pub e2: EpisodeId,
}

fn watched(episode_id: EpisodeId, track_id: u64) -> WatchedEpisode {
    WatchedEpisode {
        episode_id,
        track_id,
    }
}

pub async fn movie_lifecycle(store: &dyn WatchStore, fx: &Fixture) {
    let p = fx.profile;
    assert_eq!(
        store.add_movie_watch(p, fx.movie, 10).await.unwrap(),
        AddOutcome::Inserted
    );
    assert_eq!(
        store.add_movie_watch(p, fx.movie, 99).await.unwrap(),
        AddOutcome::AlreadyPresent
    );
    assert_eq!(store.update_movie_watch(p, fx.movie, 4200).await.unwrap(), 1);

    let state = store.watch_state(p).await.unwrap();
    assert_eq!(state.movies.len(), 1);
    assert_eq!(state.movie(fx.movie).unwrap().track_id, 4200);

    assert_eq!(store.remove_movie_watch(p, fx.movie).await.unwrap(), 1);
    assert!(store.watch_state(p).await.unwrap().movies.is_empty());
}

pub async fn series_active_episode(store: &dyn WatchStore, fx: &Fixture) {
    let p = fx.profile;
    store
        .add_series_watch(p, fx.series, NewSeriesWatch::default())
        .await
        .unwrap();
    store
        .add_watched_episode(p, fx.series, watched(fx.e1, 500))
        .await
        .unwrap();

    assert_eq!(
        store
            .set_active_episode(p, fx.series, fx.e1, 100)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .set_active_episode(p, fx.series, fx.e2, 0)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .advance_active_episode_track(p, fx.series, fx.e1, 250)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .advance_active_episode_track(p, fx.series, fx.e2, 250)
            .await
            .unwrap(),
        1
    );
    let state = store.watch_state(p).await.unwrap();
    assert_eq!(
        state.series(fx.series).unwrap().active_episode,
        Some(ActiveEpisode {
            episode_id: fx.e2,
            track_id: 250
        })
    );

    assert_eq!(store.clear_active_episode(p, fx.series).await.unwrap(), 1);
    let state = store.watch_state(p).await.unwrap();
    let entry = state.series(fx.series).unwrap();
    assert!(entry.active_episode.is_none());
    assert_eq!(entry.watched_episodes, vec![watched(fx.e1, 500)]);

    // Nothing to advance once cleared.
    assert_eq!(
        store
            .advance_active_episode_track(p, fx.series, fx.e2, 1)
            .await
            .unwrap(),
        0
    );
}

pub async fn watched_episodes_unique(store: &dyn WatchStore, fx: &Fixture) {
    let p = fx.profile;
    store
        .add_series_watch(p, fx.series, NewSeriesWatch::default())
        .await
        .unwrap();

    store
        .add_watched_episode(p, fx.series, watched(fx.e1, 10))
        .await
        .unwrap();
    store
        .add_watched_episode(p, fx.series, watched(fx.e2, 20))
        .await
        .unwrap();
    store
        .add_watched_episode(p, fx.series, watched(fx.e1, 30))
        .await
        .unwrap();

    let state = store.watch_state(p).await.unwrap();
    assert_eq!(
        state.series(fx.series).unwrap().watched_episodes,
        vec![watched(fx.e1, 30), watched(fx.e2, 20)]
    );

    assert_eq!(
        store
            .update_watched_episode_track(p, fx.series, fx.e2, 77)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .remove_watched_episode(p, fx.series, fx.e1)
            .await
            .unwrap(),
        1
    );
    let state = store.watch_state(p).await.unwrap();
    assert_eq!(
        state.series(fx.series).unwrap().watched_episodes,
        vec![watched(fx.e2, 77)]
    );
}

pub async fn removals_are_scoped(store: &dyn WatchStore, fx: &Fixture) {
    let (p, q) = (fx.profile, fx.other_profile);
    store.add_movie_watch(p, fx.movie, 1).await.unwrap();
    store.add_movie_watch(p, fx.other_movie, 2).await.unwrap();
    store.add_movie_watch(q, fx.movie, 3).await.unwrap();
    store
        .add_series_watch(p, fx.series, NewSeriesWatch::default())
        .await
        .unwrap();
    store
        .add_series_watch(p, fx.other_series, NewSeriesWatch::default())
        .await
        .unwrap();

    store.remove_movie_watch(p, fx.movie).await.unwrap();
    store.remove_series_watch(p, fx.series).await.unwrap();

    let mine = store.watch_state(p).await.unwrap();
    assert!(mine.movie(fx.movie).is_none());
    assert_eq!(mine.movie(fx.other_movie).unwrap().track_id, 2);
    assert!(mine.series(fx.series).is_none());
    assert!(mine.series(fx.other_series).is_some());

    let theirs = store.watch_state(q).await.unwrap();
    assert_eq!(theirs.movie(fx.movie).unwrap().track_id, 3);

    // Updating one profile never reaches the other.
    store.update_movie_watch(q, fx.movie, 9).await.unwrap();
    let mine = store.watch_state(p).await.unwrap();
    assert_eq!(mine.movie(fx.other_movie).unwrap().track_id, 2);
}

pub async fn zero_matches_without_entry(store: &dyn WatchStore, fx: &Fixture) {
    let p = fx.profile;
    assert_eq!(store.update_movie_watch(p, fx.movie, 1).await.unwrap(), 0);
    assert_eq!(store.remove_movie_watch(p, fx.movie).await.unwrap(), 0);
    assert_eq!(store.remove_series_watch(p, fx.series).await.unwrap(), 0);
    assert_eq!(store.clear_active_episode(p, fx.series).await.unwrap(), 0);
    assert_eq!(
        store
            .set_active_episode(p, fx.series, fx.e1, 1)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .add_watched_episode(p, fx.series, watched(fx.e1, 1))
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .update_watched_episode_track(p, fx.series, fx.e1, 1)
            .await
            .unwrap(),
        0
    );

    let state = store.watch_state(p).await.unwrap();
    assert!(state.movies.is_empty());
    assert!(state.series.is_empty());
}

pub async fn initial_series_contents(store: &dyn WatchStore, fx: &Fixture) {
    let p = fx.profile;
    let entry = NewSeriesWatch {
        active_episode: Some(ActiveEpisode {
            episode_id: fx.e2,
            track_id: 40,
        }),
        watched_episodes: vec![watched(fx.e1, 5), watched(fx.e2, 6), watched(fx.e1, 7)],
    };
    assert_eq!(
        store.add_series_watch(p, fx.series, entry).await.unwrap(),
        AddOutcome::Inserted
    );

    let state = store.watch_state(p).await.unwrap();
    let series = state.series(fx.series).unwrap();
    assert_eq!(series.active_episode.unwrap().track_id, 40);
    assert_eq!(
        series.watched_episodes,
        vec![watched(fx.e1, 7), watched(fx.e2, 6)]
    );

    // A second add leaves the first entry untouched.
    assert_eq!(
        store
            .add_series_watch(p, fx.series, NewSeriesWatch::default())
            .await
            .unwrap(),
        AddOutcome::AlreadyPresent
    );
    let state = store.watch_state(p).await.unwrap();
    assert_eq!(state.series(fx.series).unwrap().watched_episodes.len(), 2);
}
