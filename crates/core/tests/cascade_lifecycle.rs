//! Cascade delete integration tests.
//!
//! Movies are synced through the job first so the cascade unwinds
//! references the way they exist in production.

use std::sync::Arc;

use reelsync_core::{
    testing::{fixtures, FlakyCatalogStore, MockMetadataProvider, StoreOperation},
    CascadeDeleter, CascadeStep, CatalogStore, SqliteCatalogStore, SyncConfig, SyncJob,
};

async fn synced_store(movies: Vec<reelsync_core::MovieDetail>) -> Arc<SqliteCatalogStore> {
    let provider = Arc::new(MockMetadataProvider::new());
    let summaries = movies
        .iter()
        .map(|m| fixtures::summary(m.external_id, &m.title))
        .collect();
    for movie in movies {
        provider.add_movie(movie).await;
    }
    provider.set_popular(summaries, 20).await;

    let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
    let job = SyncJob::new(
        SyncConfig {
            throttle_delay_ms: 0,
            ..Default::default()
        },
        provider,
        store.clone(),
    );
    let summary = job.sync_popular(1).await.unwrap();
    assert_eq!(summary.failed_count, 0);
    store
}

#[tokio::test]
async fn test_cascade_leaves_no_dangling_references() {
    // Brad Pitt also appears in a second movie
    let mut other = fixtures::solo_movie(1);
    other
        .cast
        .push(fixtures::cast(287, "Brad Pitt", "Cameo", 1));
    let store = synced_store(vec![fixtures::fight_club(), other]).await;

    let fight_club = store.find_movie_by_external_id(550).unwrap().unwrap();
    store.add_comment(fight_club.id, "alice", "First rule").unwrap();
    store.add_comment(fight_club.id, "bob", "Second rule").unwrap();
    store.add_favorite("alice", fight_club.id).unwrap();

    let deleter = CascadeDeleter::new(store.clone());
    let report = deleter.delete_movie_by_external_id(550).unwrap().unwrap();
    assert_eq!(report.comments_deleted, 2);
    assert_eq!(report.favorites_removed, 1);
    assert_eq!(report.filmography_entries_removed, 3);
    assert!(report.movie_deleted);

    assert!(store.find_movie_by_external_id(550).unwrap().is_none());
    assert!(store.comments_for_movie(fight_club.id).unwrap().is_empty());
    assert!(store.favorites_for_user("alice").unwrap().is_empty());

    // Actors stay, minus the deleted movie
    let pitt = store.find_actor_by_external_id(287).unwrap().unwrap();
    assert_eq!(pitt.filmography.len(), 1);
    assert!(pitt.entry_for(fight_club.id).is_none());
    let norton = store.find_actor_by_external_id(819).unwrap().unwrap();
    assert!(norton.filmography.is_empty());

    let stats = store.stats().unwrap();
    assert_eq!(stats.movies, 1);
    assert_eq!(stats.actors, 5);
    assert_eq!(stats.comments, 0);
    assert_eq!(stats.favorites, 0);
}

#[tokio::test]
async fn test_interrupted_cascade_can_be_rerun() {
    let inner = synced_store(vec![fixtures::fight_club()]).await;
    let movie = inner.find_movie_by_external_id(550).unwrap().unwrap();
    inner.add_comment(movie.id, "alice", "Hmm").unwrap();
    inner.add_favorite("alice", movie.id).unwrap();

    let flaky = Arc::new(FlakyCatalogStore::new(inner.clone()));
    flaky.fail_operation(StoreOperation::DeleteMovie);
    let deleter = CascadeDeleter::new(flaky.clone());

    let err = deleter.delete_movie(movie.id).unwrap_err();
    assert_eq!(err.step, CascadeStep::DeleteMovie);

    // Every reference is already gone; only the record remains
    let stats = inner.stats().unwrap();
    assert_eq!(stats.comments, 0);
    assert_eq!(stats.favorites, 0);
    assert_eq!(stats.filmography_entries, 0);
    assert_eq!(stats.movies, 1);

    flaky.clear_failures();
    let report = deleter.delete_movie(movie.id).unwrap();
    assert!(report.movie_deleted);
    assert_eq!(report.filmography_entries_removed, 0);
    assert_eq!(inner.stats().unwrap().movies, 0);
}
