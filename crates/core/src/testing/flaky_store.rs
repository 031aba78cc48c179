//! Catalog store wrapper with failure injection.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::catalog::{
    ActorFields, ActorRecord, ActorUpsert, CastEntry, CatalogError, CatalogStats, CatalogStore,
    FilmographyEntry, MovieFields, MovieRecord, MovieRef,
};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    UpsertMovie,
    SetMovieCredits,
    PruneFilmographies,
    DeleteComments,
    PullFavorites,
    PullFilmographies,
    DeleteMovie,
}

#[derive(Debug, Default)]
struct Failures {
    actors: HashSet<u32>,
    movies: HashSet<u32>,
    operations: HashSet<StoreOperation>,
}

/// Wraps a real store and fails selected calls with `CatalogError::Database`.
///
/// - `fail_actor`: `upsert_actor` for that provider person ID
/// - `fail_movie`: `upsert_movie` for that provider movie ID
/// - `fail_operation`: every call of that operation
pub struct FlakyCatalogStore {
    inner: Arc<dyn CatalogStore>,
    failures: Mutex<Failures>,
}

impl FlakyCatalogStore {
    /// Wrap a store. Nothing fails until configured.
    pub fn new(inner: Arc<dyn CatalogStore>) -> Self {
        Self {
            inner,
            failures: Mutex::new(Failures::default()),
        }
    }

    fn failures(&self) -> MutexGuard<'_, Failures> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail `upsert_actor` for the given provider person ID.
    pub fn fail_actor(&self, actor_external_id: u32) {
        self.failures().actors.insert(actor_external_id);
    }

    /// Fail `upsert_movie` for the given provider movie ID.
    pub fn fail_movie(&self, external_id: u32) {
        self.failures().movies.insert(external_id);
    }

    /// Fail every call of an operation.
    pub fn fail_operation(&self, operation: StoreOperation) {
        self.failures().operations.insert(operation);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        *self.failures() = Failures::default();
    }

    fn check(&self, operation: StoreOperation) -> Result<(), CatalogError> {
        if self.failures().operations.contains(&operation) {
            return Err(CatalogError::Database(format!(
                "injected failure: {:?}",
                operation
            )));
        }
        Ok(())
    }
}

impl CatalogStore for FlakyCatalogStore {
    fn upsert_movie(
        &self,
        external_id: u32,
        fields: &MovieFields,
    ) -> Result<MovieRecord, CatalogError> {
        self.check(StoreOperation::UpsertMovie)?;
        if self.failures().movies.contains(&external_id) {
            return Err(CatalogError::Database(format!(
                "injected failure: movie {}",
                external_id
            )));
        }
        self.inner.upsert_movie(external_id, fields)
    }

    fn find_movie_by_external_id(
        &self,
        external_id: u32,
    ) -> Result<Option<MovieRecord>, CatalogError> {
        self.inner.find_movie_by_external_id(external_id)
    }

    fn get_movie(&self, movie_id: i64) -> Result<Option<MovieRecord>, CatalogError> {
        self.inner.get_movie(movie_id)
    }

    fn list_movie_refs(&self) -> Result<Vec<MovieRef>, CatalogError> {
        self.inner.list_movie_refs()
    }

    fn set_movie_credits(
        &self,
        movie_id: i64,
        cast: &[CastEntry],
        directors: &[i64],
    ) -> Result<(), CatalogError> {
        self.check(StoreOperation::SetMovieCredits)?;
        self.inner.set_movie_credits(movie_id, cast, directors)
    }

    fn upsert_actor(
        &self,
        external_id: u32,
        fields: &ActorFields,
    ) -> Result<ActorUpsert, CatalogError> {
        if self.failures().actors.contains(&external_id) {
            return Err(CatalogError::Database(format!(
                "injected failure: actor {}",
                external_id
            )));
        }
        self.inner.upsert_actor(external_id, fields)
    }

    fn find_actor_by_external_id(
        &self,
        external_id: u32,
    ) -> Result<Option<ActorRecord>, CatalogError> {
        self.inner.find_actor_by_external_id(external_id)
    }

    fn replace_filmography_entry(
        &self,
        actor_id: i64,
        movie_id: i64,
        entry: &FilmographyEntry,
    ) -> Result<(), CatalogError> {
        self.inner.replace_filmography_entry(actor_id, movie_id, entry)
    }

    fn prune_filmographies(
        &self,
        movie_id: i64,
        keep_actor_ids: &[i64],
    ) -> Result<u64, CatalogError> {
        self.check(StoreOperation::PruneFilmographies)?;
        self.inner.prune_filmographies(movie_id, keep_actor_ids)
    }

    fn delete_movie(&self, movie_id: i64) -> Result<bool, CatalogError> {
        self.check(StoreOperation::DeleteMovie)?;
        self.inner.delete_movie(movie_id)
    }

    fn pull_movie_from_all_filmographies(&self, movie_id: i64) -> Result<u64, CatalogError> {
        self.check(StoreOperation::PullFilmographies)?;
        self.inner.pull_movie_from_all_filmographies(movie_id)
    }

    fn pull_movie_from_all_favorites(&self, movie_id: i64) -> Result<u64, CatalogError> {
        self.check(StoreOperation::PullFavorites)?;
        self.inner.pull_movie_from_all_favorites(movie_id)
    }

    fn delete_comments_for_movie(&self, movie_id: i64) -> Result<u64, CatalogError> {
        self.check(StoreOperation::DeleteComments)?;
        self.inner.delete_comments_for_movie(movie_id)
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        self.inner.stats()
    }
}
