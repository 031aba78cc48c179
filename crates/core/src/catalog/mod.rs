//! Movie and actor catalog.
//!
//! Movies and actors live in separate collections and reference each other
//! by internal ID in both directions: a movie lists its cast and directors,
//! an actor lists its filmography. There is no join engine and no
//! transaction spanning both sides; every operation here is atomic on its own
//! and callers keep the two sides consistent.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalogStore;
pub use types::*;

/// Trait for catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Create the movie if `external_id` is unknown, otherwise overwrite its
    /// descriptive fields and bump `last_updated`.
    ///
    /// Never touches `cast`/`directors` of an existing record.
    fn upsert_movie(&self, external_id: u32, fields: &MovieFields)
        -> Result<MovieRecord, CatalogError>;

    /// Find a movie by provider ID.
    fn find_movie_by_external_id(&self, external_id: u32)
        -> Result<Option<MovieRecord>, CatalogError>;

    /// Get a movie by internal ID.
    fn get_movie(&self, movie_id: i64) -> Result<Option<MovieRecord>, CatalogError>;

    /// All movies, in storage order.
    fn list_movie_refs(&self) -> Result<Vec<MovieRef>, CatalogError>;

    /// Replace the movie side of the relationship.
    fn set_movie_credits(
        &self,
        movie_id: i64,
        cast: &[CastEntry],
        directors: &[i64],
    ) -> Result<(), CatalogError>;

    /// Create the actor if absent. On an existing actor, `name` is refreshed
    /// and optional fields are only filled when provided.
    fn upsert_actor(&self, external_id: u32, fields: &ActorFields)
        -> Result<ActorUpsert, CatalogError>;

    /// Find an actor by provider ID.
    fn find_actor_by_external_id(&self, external_id: u32)
        -> Result<Option<ActorRecord>, CatalogError>;

    /// Set the actor's entry for `movie_id`: replaced in place when one
    /// exists, appended otherwise.
    fn replace_filmography_entry(
        &self,
        actor_id: i64,
        movie_id: i64,
        entry: &FilmographyEntry,
    ) -> Result<(), CatalogError>;

    /// Remove the movie from every filmography except those of `keep_actor_ids`.
    ///
    /// Returns the number of entries removed.
    fn prune_filmographies(&self, movie_id: i64, keep_actor_ids: &[i64])
        -> Result<u64, CatalogError>;

    /// Delete the movie record. Returns false if it did not exist.
    fn delete_movie(&self, movie_id: i64) -> Result<bool, CatalogError>;

    /// Remove the movie from every actor's filmography.
    fn pull_movie_from_all_filmographies(&self, movie_id: i64) -> Result<u64, CatalogError>;

    /// Remove the movie from every user's favorites.
    fn pull_movie_from_all_favorites(&self, movie_id: i64) -> Result<u64, CatalogError>;

    /// Delete every comment on the movie.
    fn delete_comments_for_movie(&self, movie_id: i64) -> Result<u64, CatalogError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, CatalogError>;
}
