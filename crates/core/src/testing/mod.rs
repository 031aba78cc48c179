//! Testing utilities and mock implementations.
//!
//! This module provides a mock metadata provider, a failure-injecting store
//! wrapper and a hand-driven ticker, so the sync pipeline can be exercised
//! end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelsync_core::testing::{fixtures, FlakyCatalogStore, MockMetadataProvider};
//!
//! let provider = MockMetadataProvider::new();
//! provider.add_movie(fixtures::fight_club()).await;
//! provider.set_popular(vec![fixtures::summary(550, "Fight Club")], 20).await;
//!
//! let store = Arc::new(SqliteCatalogStore::in_memory()?);
//! let flaky = FlakyCatalogStore::new(store.clone());
//! flaky.fail_actor(819);
//! ```

mod flaky_store;
mod manual_ticker;
mod mock_provider;

pub use flaky_store::{FlakyCatalogStore, StoreOperation};
pub use manual_ticker::{ManualTicker, TickHandle};
pub use mock_provider::{MockMetadataProvider, RecordedProviderCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::provider::{CastCredit, CrewCredit, Genre, MovieDetail, MovieSummary, Video};

    /// Create a listing entry with only a title.
    pub fn summary(external_id: u32, title: &str) -> MovieSummary {
        MovieSummary {
            external_id,
            title: title.to_string(),
            original_title: None,
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: None,
            vote_count: None,
            popularity: None,
        }
    }

    /// Create a cast credit.
    pub fn cast(actor_external_id: u32, name: &str, character: &str, order: u32) -> CastCredit {
        CastCredit {
            actor_external_id,
            name: name.to_string(),
            profile_path: None,
            character: character.to_string(),
            order,
            popularity: None,
        }
    }

    /// Create a director credit.
    pub fn director(actor_external_id: u32, name: &str) -> CrewCredit {
        CrewCredit {
            actor_external_id,
            name: name.to_string(),
            profile_path: None,
            popularity: None,
        }
    }

    /// Create a movie detail with the given credits.
    pub fn movie_detail(
        external_id: u32,
        title: &str,
        cast: Vec<CastCredit>,
        directors: Vec<CrewCredit>,
    ) -> MovieDetail {
        MovieDetail {
            external_id,
            title: title.to_string(),
            original_title: None,
            overview: Some(format!("A movie called {}.", title)),
            poster_path: Some(format!("/poster-{}.jpg", external_id)),
            backdrop_path: None,
            release_date: Some("2020-06-15".to_string()),
            vote_average: Some(7.0),
            vote_count: Some(100),
            popularity: Some(10.0),
            genres: vec![Genre {
                id: 18,
                name: "Drama".to_string(),
            }],
            videos: vec![],
            cast,
            directors,
        }
    }

    /// Fight Club (550): Brad Pitt (287) and Edward Norton (819), directed by
    /// David Fincher (7467).
    pub fn fight_club() -> MovieDetail {
        let mut detail = movie_detail(
            550,
            "Fight Club",
            vec![
                cast(287, "Brad Pitt", "Tyler Durden", 0),
                cast(819, "Edward Norton", "The Narrator", 1),
            ],
            vec![director(7467, "David Fincher")],
        );
        detail.release_date = Some("1999-10-15".to_string());
        detail.vote_average = Some(8.4);
        detail.videos = vec![Video {
            key: "BdJKm16Co6M".to_string(),
            name: "Fight Club | #TBT Trailer".to_string(),
            site: "YouTube".to_string(),
            kind: "Trailer".to_string(),
        }];
        detail
    }

    /// The Matrix (603): Keanu Reeves (6384), directed by Lana (9339) and
    /// Lilly (9340) Wachowski, in that order.
    pub fn co_directed() -> MovieDetail {
        movie_detail(
            603,
            "The Matrix",
            vec![cast(6384, "Keanu Reeves", "Neo", 0)],
            vec![
                director(9339, "Lana Wachowski"),
                director(9340, "Lilly Wachowski"),
            ],
        )
    }

    /// A movie whose lead and director exist only for it
    /// (person IDs `external_id * 10 + 1` and `external_id * 10 + 2`).
    pub fn solo_movie(external_id: u32) -> MovieDetail {
        movie_detail(
            external_id,
            &format!("Movie {}", external_id),
            vec![cast(
                external_id * 10 + 1,
                &format!("Lead {}", external_id),
                "Lead",
                0,
            )],
            vec![director(
                external_id * 10 + 2,
                &format!("Director {}", external_id),
            )],
        )
    }
}
