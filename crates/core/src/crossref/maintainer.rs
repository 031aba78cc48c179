//! Cross-reference maintainer implementation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{ActorLinkFailure, CreditRole, CrossRefReport, DIRECTOR_CHARACTER};
use crate::catalog::{ActorFields, CastEntry, CatalogError, CatalogStore, FilmographyEntry};
use crate::metrics::{ACTORS_CREATED, FILMOGRAPHY_PRUNED};
use crate::provider::MovieDetail;

/// Keeps Movie->Actor and Actor->Movie references in step.
pub struct CrossReferenceMaintainer {
    store: Arc<dyn CatalogStore>,
}

/// A successfully linked actor.
struct Linked {
    actor_id: i64,
    created: bool,
}

impl CrossReferenceMaintainer {
    /// Create a new maintainer over the given store.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Apply the movie's resolved credits.
    ///
    /// Actor failures are collected in the report. An `Err` means the movie
    /// side itself could not be written.
    pub fn apply(&self, movie_id: i64, detail: &MovieDetail) -> Result<CrossRefReport, CatalogError> {
        let mut report = CrossRefReport::default();
        let mut cast: Vec<CastEntry> = Vec::with_capacity(detail.cast.len());
        let mut directors: Vec<i64> = Vec::with_capacity(detail.directors.len());
        let mut linked_ids: HashSet<i64> = HashSet::new();
        let mut credited: HashSet<u32> = HashSet::new();

        for credit in &detail.cast {
            // First credit wins; a later one must not overwrite the actor side.
            if !credited.insert(credit.actor_external_id) {
                debug!(
                    "Ignoring repeated cast credit for {} in movie {}",
                    credit.actor_external_id, detail.external_id
                );
                continue;
            }

            let fields = ActorFields {
                name: credit.name.clone(),
                profile_path: credit.profile_path.clone(),
                popularity: credit.popularity,
                ..Default::default()
            };
            let entry = FilmographyEntry {
                movie_ref: movie_id,
                character: credit.character.clone(),
                order: credit.order,
            };

            match self.link(credit.actor_external_id, &fields, movie_id, &entry) {
                Ok(linked) => {
                    linked_ids.insert(linked.actor_id);
                    if linked.created {
                        report.actors_created += 1;
                    }
                    cast.push(CastEntry {
                        actor_ref: linked.actor_id,
                        character: credit.character.clone(),
                        order: credit.order,
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to link cast member {} to movie {}: {}",
                        credit.actor_external_id, detail.external_id, e
                    );
                    report.failures.push(ActorLinkFailure {
                        actor_external_id: credit.actor_external_id,
                        role: CreditRole::Cast,
                        error: e.to_string(),
                    });
                }
            }
        }

        let cast_ids: HashSet<i64> = cast.iter().map(|c| c.actor_ref).collect();

        for credit in &detail.directors {
            let fields = ActorFields {
                name: credit.name.clone(),
                profile_path: credit.profile_path.clone(),
                popularity: credit.popularity,
                ..Default::default()
            };
            let entry = FilmographyEntry {
                movie_ref: movie_id,
                character: DIRECTOR_CHARACTER.to_string(),
                order: 0,
            };

            // Resolve first; an actor already in the cast keeps its cast role.
            let result = self
                .store
                .upsert_actor(credit.actor_external_id, &fields)
                .and_then(|upsert| {
                    if !cast_ids.contains(&upsert.actor.id) {
                        self.store
                            .replace_filmography_entry(upsert.actor.id, movie_id, &entry)?;
                    }
                    Ok(Linked {
                        actor_id: upsert.actor.id,
                        created: upsert.created,
                    })
                });

            match result {
                Ok(linked) => {
                    if directors.contains(&linked.actor_id) {
                        continue;
                    }
                    linked_ids.insert(linked.actor_id);
                    if linked.created {
                        report.actors_created += 1;
                    }
                    directors.push(linked.actor_id);
                }
                Err(e) => {
                    warn!(
                        "Failed to link director {} to movie {}: {}",
                        credit.actor_external_id, detail.external_id, e
                    );
                    report.failures.push(ActorLinkFailure {
                        actor_external_id: credit.actor_external_id,
                        role: CreditRole::Director,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.linked = linked_ids.len();

        if !report.is_consistent() {
            self.carry_over_failed(movie_id, &report.failures, &mut cast, &mut directors)?;
        }
        self.store.set_movie_credits(movie_id, &cast, &directors)?;

        if report.is_consistent() {
            let keep: Vec<i64> = linked_ids.into_iter().collect();
            report.pruned = self.store.prune_filmographies(movie_id, &keep)?;
            if report.pruned > 0 {
                debug!(
                    "Pruned {} stale filmography entries for movie {}",
                    report.pruned, detail.external_id
                );
            }
        } else {
            debug!(
                "Skipping prune for movie {}: {} actor(s) failed",
                detail.external_id,
                report.failures.len()
            );
        }

        ACTORS_CREATED.inc_by(report.actors_created as u64);
        FILMOGRAPHY_PRUNED.inc_by(report.pruned);

        debug!(
            "Linked {} actors to movie {} ({} created)",
            report.linked, detail.external_id, report.actors_created
        );

        Ok(report)
    }

    /// Keep the movie-side references of actors that failed this pass, so
    /// their untouched filmography entries are still matched by the movie.
    fn carry_over_failed(
        &self,
        movie_id: i64,
        failures: &[ActorLinkFailure],
        cast: &mut Vec<CastEntry>,
        directors: &mut Vec<i64>,
    ) -> Result<(), CatalogError> {
        let Some(previous) = self.store.get_movie(movie_id)? else {
            return Ok(());
        };

        let mut failed_ids = HashSet::new();
        for failure in failures {
            if let Ok(Some(actor)) = self.store.find_actor_by_external_id(failure.actor_external_id)
            {
                failed_ids.insert(actor.id);
            }
        }

        for entry in previous.cast {
            if failed_ids.contains(&entry.actor_ref)
                && !cast.iter().any(|c| c.actor_ref == entry.actor_ref)
            {
                cast.push(entry);
            }
        }
        cast.sort_by_key(|c| c.order);

        for actor_id in previous.directors {
            if failed_ids.contains(&actor_id) && !directors.contains(&actor_id) {
                directors.push(actor_id);
            }
        }
        Ok(())
    }

    fn link(
        &self,
        actor_external_id: u32,
        fields: &ActorFields,
        movie_id: i64,
        entry: &FilmographyEntry,
    ) -> Result<Linked, CatalogError> {
        let upsert = self.store.upsert_actor(actor_external_id, fields)?;
        self.store
            .replace_filmography_entry(upsert.actor.id, movie_id, entry)?;
        Ok(Linked {
            actor_id: upsert.actor.id,
            created: upsert.created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MovieFields, SqliteCatalogStore};
    use crate::testing::{fixtures, FlakyCatalogStore};

    fn setup() -> (Arc<SqliteCatalogStore>, CrossReferenceMaintainer) {
        let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let maintainer = CrossReferenceMaintainer::new(store.clone());
        (store, maintainer)
    }

    fn store_movie(store: &dyn CatalogStore, detail: &MovieDetail) -> i64 {
        store
            .upsert_movie(
                detail.external_id,
                &MovieFields {
                    title: detail.title.clone(),
                    ..Default::default()
                },
            )
            .unwrap()
            .id
    }

    #[test]
    fn test_apply_links_both_sides() {
        let (store, maintainer) = setup();
        let detail = fixtures::fight_club();
        let movie_id = store_movie(store.as_ref(), &detail);

        let report = maintainer.apply(movie_id, &detail).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.linked, 3);
        assert_eq!(report.actors_created, 3);

        let movie = store.get_movie(movie_id).unwrap().unwrap();
        let pitt = store.find_actor_by_external_id(287).unwrap().unwrap();
        let fincher = store.find_actor_by_external_id(7467).unwrap().unwrap();

        assert!(movie.credits_actor(pitt.id));
        assert_eq!(movie.directors, vec![fincher.id]);
        assert_eq!(pitt.entry_for(movie_id).unwrap().character, "Tyler Durden");

        let director_entry = fincher.entry_for(movie_id).unwrap();
        assert_eq!(director_entry.character, DIRECTOR_CHARACTER);
        assert_eq!(director_entry.order, 0);
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let (store, maintainer) = setup();
        let detail = fixtures::fight_club();
        let movie_id = store_movie(store.as_ref(), &detail);

        maintainer.apply(movie_id, &detail).unwrap();
        let second = maintainer.apply(movie_id, &detail).unwrap();

        assert_eq!(second.actors_created, 0);
        assert_eq!(second.pruned, 0);
        let stats = store.stats().unwrap();
        assert_eq!(stats.actors, 3);
        assert_eq!(stats.filmography_entries, 3);
    }

    #[test]
    fn test_apply_prunes_uncredited_actors() {
        let (store, maintainer) = setup();
        let mut detail = fixtures::fight_club();
        let movie_id = store_movie(store.as_ref(), &detail);
        maintainer.apply(movie_id, &detail).unwrap();

        // Norton dropped from the credits upstream
        detail.cast.retain(|c| c.actor_external_id != 819);
        let report = maintainer.apply(movie_id, &detail).unwrap();

        assert_eq!(report.pruned, 1);
        let norton = store.find_actor_by_external_id(819).unwrap().unwrap();
        assert!(norton.entry_for(movie_id).is_none());
        let movie = store.get_movie(movie_id).unwrap().unwrap();
        assert!(!movie.credits_actor(norton.id));
    }

    #[test]
    fn test_actor_as_cast_and_director_keeps_cast_role() {
        let (store, maintainer) = setup();
        let mut detail = fixtures::fight_club();
        detail.directors.push(crate::provider::CrewCredit {
            actor_external_id: 287,
            name: "Brad Pitt".to_string(),
            profile_path: None,
            popularity: None,
        });
        let movie_id = store_movie(store.as_ref(), &detail);

        let report = maintainer.apply(movie_id, &detail).unwrap();
        assert_eq!(report.linked, 3);

        let pitt = store.find_actor_by_external_id(287).unwrap().unwrap();
        assert_eq!(pitt.filmography.len(), 1);
        assert_eq!(pitt.entry_for(movie_id).unwrap().character, "Tyler Durden");

        let movie = store.get_movie(movie_id).unwrap().unwrap();
        assert!(movie.directors.contains(&pitt.id));
    }

    #[test]
    fn test_failed_actor_is_isolated() {
        let inner = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let flaky = Arc::new(FlakyCatalogStore::new(inner.clone()));
        let maintainer = CrossReferenceMaintainer::new(flaky.clone());

        let detail = fixtures::fight_club();
        let movie_id = store_movie(inner.as_ref(), &detail);
        flaky.fail_actor(819);

        let report = maintainer.apply(movie_id, &detail).unwrap();
        assert!(!report.is_consistent());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].actor_external_id, 819);
        assert_eq!(report.linked, 2);

        // Others linked, no one-sided edge for the failed actor
        let movie = inner.get_movie(movie_id).unwrap().unwrap();
        assert_eq!(movie.cast.len(), 1);
        assert_eq!(movie.directors.len(), 1);
        assert!(inner.find_actor_by_external_id(819).unwrap().is_none());
    }

    #[test]
    fn test_failure_skips_prune() {
        let inner = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let flaky = Arc::new(FlakyCatalogStore::new(inner.clone()));
        let maintainer = CrossReferenceMaintainer::new(flaky.clone());

        let detail = fixtures::fight_club();
        let movie_id = store_movie(inner.as_ref(), &detail);
        maintainer.apply(movie_id, &detail).unwrap();

        flaky.fail_actor(819);
        let report = maintainer.apply(movie_id, &detail).unwrap();
        assert_eq!(report.pruned, 0);

        // Norton's existing edge survives the partial pass on both sides
        let norton = inner.find_actor_by_external_id(819).unwrap().unwrap();
        assert!(norton.entry_for(movie_id).is_some());
        let movie = inner.get_movie(movie_id).unwrap().unwrap();
        assert!(movie.credits_actor(norton.id));
        assert_eq!(movie.cast.len(), 2);
    }

    #[test]
    fn test_repeated_cast_credit_keeps_first() {
        let (store, maintainer) = setup();
        let mut detail = fixtures::fight_club();
        detail
            .cast
            .push(fixtures::cast(287, "Brad Pitt", "Uncredited", 9));
        let movie_id = store_movie(store.as_ref(), &detail);

        let report = maintainer.apply(movie_id, &detail).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.linked, 3);

        let movie = store.get_movie(movie_id).unwrap().unwrap();
        let pitt = store.find_actor_by_external_id(287).unwrap().unwrap();
        let on_movie: Vec<_> = movie
            .cast
            .iter()
            .filter(|c| c.actor_ref == pitt.id)
            .collect();
        assert_eq!(on_movie.len(), 1);
        assert_eq!(on_movie[0].character, "Tyler Durden");

        let entry = pitt.entry_for(movie_id).unwrap();
        assert_eq!(entry.character, "Tyler Durden");
        assert_eq!(entry.order, 0);
    }

    #[test]
    fn test_two_directors_round_trip() {
        let (store, maintainer) = setup();
        let detail = fixtures::co_directed();
        let movie_id = store_movie(store.as_ref(), &detail);

        let report = maintainer.apply(movie_id, &detail).unwrap();
        assert!(report.is_consistent());

        let lana = store.find_actor_by_external_id(9339).unwrap().unwrap();
        let lilly = store.find_actor_by_external_id(9340).unwrap().unwrap();
        let movie = store.get_movie(movie_id).unwrap().unwrap();
        assert_eq!(movie.directors, vec![lana.id, lilly.id]);

        for director in [&lana, &lilly] {
            let entry = director.entry_for(movie_id).unwrap();
            assert_eq!(entry.movie_ref, movie_id);
            assert_eq!(entry.character, DIRECTOR_CHARACTER);
            assert_eq!(entry.order, 0);
        }
    }
}
