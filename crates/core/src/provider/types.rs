//! Normalized types returned by metadata providers.

use serde::{Deserialize, Serialize};

/// A genre as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    /// Provider genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// A trailer or teaser attached to a movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Video {
    /// Site-specific video key (e.g. a YouTube video id).
    pub key: String,
    /// Display name.
    pub name: String,
    /// Hosting site ("YouTube", "Vimeo").
    pub site: String,
    /// "Trailer" or "Teaser".
    pub kind: String,
}

/// One entry of a popularity listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    /// Provider movie ID.
    pub external_id: u32,
    /// Movie title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

/// A page of the provider's popular movies listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingPage {
    /// 1-based page number.
    pub page: u32,
    /// Total pages the provider reports for this listing.
    pub total_pages: u32,
    /// Summaries in provider order.
    pub results: Vec<MovieSummary>,
}

/// A cast member, already resolved to a provider person ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastCredit {
    /// Provider person ID.
    pub actor_external_id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
    /// Character played.
    pub character: String,
    /// Billing order (0 = top billed).
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

/// A crew member. Only directors are kept after normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewCredit {
    /// Provider person ID.
    pub actor_external_id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

/// Full movie details with resolved credits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    /// Provider movie ID.
    pub external_id: u32,
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
    /// Trailers and teasers, provider order.
    #[serde(default)]
    pub videos: Vec<Video>,
    /// Cast sorted by billing order.
    #[serde(default)]
    pub cast: Vec<CastCredit>,
    /// Directors in provider order.
    #[serde(default)]
    pub directors: Vec<CrewCredit>,
}

impl MovieDetail {
    /// Get the release year from the release date.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_ref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}
