//! Types for the local movie/actor catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::{Genre, Video};

/// Descriptive movie fields, fully overwritten on every sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieFields {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

/// One credited cast member on the movie side of the relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CastEntry {
    /// Internal actor ID.
    pub actor_ref: i64,
    pub character: String,
    pub order: u32,
}

/// A stored movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    /// Internal ID.
    pub id: i64,
    /// Provider movie ID (unique).
    pub external_id: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    pub genres: Vec<Genre>,
    pub videos: Vec<Video>,
    /// Credited cast, billing order.
    pub cast: Vec<CastEntry>,
    /// Internal actor IDs of the directors.
    pub directors: Vec<i64>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every successful upsert or credit write.
    pub last_updated: DateTime<Utc>,
}

impl MovieRecord {
    /// Whether the given actor appears in the cast or among the directors.
    pub fn credits_actor(&self, actor_id: i64) -> bool {
        self.cast.iter().any(|c| c.actor_ref == actor_id) || self.directors.contains(&actor_id)
    }
}

/// Internal/external ID pair, used to walk the catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieRef {
    pub id: i64,
    pub external_id: u32,
}

/// Descriptive actor fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActorFields {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

/// One movie on an actor's filmography. At most one per movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilmographyEntry {
    /// Internal movie ID.
    pub movie_ref: i64,
    /// Character played, or "Director".
    pub character: String,
    pub order: u32,
}

/// A stored actor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActorRecord {
    pub id: i64,
    /// Provider person ID (unique).
    pub external_id: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    /// Entries in insertion order.
    pub filmography: Vec<FilmographyEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActorRecord {
    /// Filmography entry for a movie, if any.
    pub fn entry_for(&self, movie_id: i64) -> Option<&FilmographyEntry> {
        self.filmography.iter().find(|e| e.movie_ref == movie_id)
    }
}

/// Result of [`CatalogStore::upsert_actor`](super::CatalogStore::upsert_actor).
#[derive(Debug, Clone)]
pub struct ActorUpsert {
    pub actor: ActorRecord,
    /// True if the actor did not exist before.
    pub created: bool,
}

/// A user comment on a movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentRecord {
    pub id: i64,
    pub movie_ref: i64,
    pub user_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A movie on a user's favorites list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Favorite {
    pub user_id: String,
    pub movie_ref: i64,
    pub added_at: DateTime<Utc>,
}

/// Catalog statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub movies: u64,
    pub actors: u64,
    pub filmography_entries: u64,
    pub comments: u64,
    pub favorites: u64,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}
