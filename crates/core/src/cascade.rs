//! Cascading movie deletion.
//!
//! Removing a movie means unwinding every reference to it first, in a fixed
//! order:
//! 1. comments on the movie
//! 2. the movie on users' favorites
//! 3. the movie on actors' filmographies
//! 4. the movie record itself
//!
//! There is no rollback. A failed step stops the cascade and is reported by
//! name; running the cascade again picks up where it left off since every
//! step is a no-op once applied.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::catalog::{CatalogError, CatalogStore};
use crate::metrics::CASCADE_DELETES;

/// A step of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    /// Resolving a provider ID to the stored movie.
    ResolveMovie,
    DeleteComments,
    PullFavorites,
    PullFilmographies,
    DeleteMovie,
}

impl CascadeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeStep::ResolveMovie => "resolve_movie",
            CascadeStep::DeleteComments => "delete_comments",
            CascadeStep::PullFavorites => "pull_favorites",
            CascadeStep::PullFilmographies => "pull_filmographies",
            CascadeStep::DeleteMovie => "delete_movie",
        }
    }
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cascade that stopped partway.
#[derive(Debug, Error)]
#[error("cascade delete failed at {step}: {source}")]
pub struct CascadeError {
    /// The step that failed. Earlier steps were applied.
    pub step: CascadeStep,
    #[source]
    pub source: CatalogError,
}

/// What a cascade removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub movie_id: i64,
    pub comments_deleted: u64,
    pub favorites_removed: u64,
    pub filmography_entries_removed: u64,
    /// False if the movie record was already gone.
    pub movie_deleted: bool,
}

/// Deletes movies together with everything that references them.
pub struct CascadeDeleter {
    store: Arc<dyn CatalogStore>,
}

impl CascadeDeleter {
    /// Create a new deleter over the given store.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Delete a movie by internal ID.
    pub fn delete_movie(&self, movie_id: i64) -> Result<CascadeReport, CascadeError> {
        let mut report = CascadeReport {
            movie_id,
            ..Default::default()
        };

        let result = self.run_steps(movie_id, &mut report);
        match &result {
            Ok(()) if report.movie_deleted => {
                CASCADE_DELETES.with_label_values(&["deleted"]).inc();
                info!(
                    "Deleted movie {}: {} comments, {} favorites, {} filmography entries",
                    movie_id,
                    report.comments_deleted,
                    report.favorites_removed,
                    report.filmography_entries_removed
                );
            }
            Ok(()) => {
                CASCADE_DELETES.with_label_values(&["missing"]).inc();
                info!("Movie {} already deleted; references cleaned up", movie_id);
            }
            Err(e) => {
                CASCADE_DELETES.with_label_values(&["failed"]).inc();
                error!("Cascade delete of movie {} failed: {}", movie_id, e);
            }
        }

        result.map(|()| report)
    }

    /// Delete a movie by provider ID. Returns `None` if it is not stored.
    pub fn delete_movie_by_external_id(
        &self,
        external_id: u32,
    ) -> Result<Option<CascadeReport>, CascadeError> {
        let movie = self
            .store
            .find_movie_by_external_id(external_id)
            .map_err(|source| CascadeError {
                step: CascadeStep::ResolveMovie,
                source,
            })?;

        match movie {
            Some(movie) => self.delete_movie(movie.id).map(Some),
            None => Ok(None),
        }
    }

    fn run_steps(&self, movie_id: i64, report: &mut CascadeReport) -> Result<(), CascadeError> {
        report.comments_deleted = self
            .store
            .delete_comments_for_movie(movie_id)
            .map_err(at(CascadeStep::DeleteComments))?;

        report.favorites_removed = self
            .store
            .pull_movie_from_all_favorites(movie_id)
            .map_err(at(CascadeStep::PullFavorites))?;

        report.filmography_entries_removed = self
            .store
            .pull_movie_from_all_filmographies(movie_id)
            .map_err(at(CascadeStep::PullFilmographies))?;

        report.movie_deleted = self
            .store
            .delete_movie(movie_id)
            .map_err(at(CascadeStep::DeleteMovie))?;

        Ok(())
    }
}

fn at(step: CascadeStep) -> impl FnOnce(CatalogError) -> CascadeError {
    move |source| CascadeError { step, source }
}
