//! TMDB (The Movie Database) metadata provider.
//!
//! TMDB requires an API key for access. It throttles with HTTP 429 and a
//! `Retry-After` header; this client surfaces that as
//! [`ProviderError::RateLimited`] and leaves waiting to the caller.

use std::time::{Duration, Instant};

use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{
    CastCredit, CrewCredit, Genre, ListingPage, MovieDetail, MovieSummary, Video,
};
use super::{MetadataProvider, ProviderError};
use crate::metrics::{PROVIDER_REQUESTS, PROVIDER_REQUEST_DURATION};

/// TMDB provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Language passed to TMDB (e.g. "en-US").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Maximum cast members kept per movie, by billing order.
    #[serde(default = "default_max_cast")]
    pub max_cast_members: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_max_cast() -> usize {
    20
}

fn default_timeout() -> u64 {
    30
}

/// TMDB API client.
pub struct TmdbProvider {
    client: Client,
    base_url: String,
    api_key: String,
    language: Option<String>,
    max_cast_members: usize,
}

impl TmdbProvider {
    /// Create a new TMDB provider.
    pub fn new(config: TmdbConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            language: config.language,
            max_cast_members: config.max_cast_members,
        })
    }

    /// Issue a GET and decode the JSON body, mapping TMDB status codes onto
    /// [`ProviderError`]. `not_found_id` turns a 404 into `NotFound`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        extra_query: &[(&str, String)],
        not_found_id: Option<u32>,
    ) -> Result<T, ProviderError> {
        let start = Instant::now();
        let result = self.send(url, extra_query, not_found_id).await;

        let label = match &result {
            Ok(_) => "success",
            Err(ProviderError::RateLimited { .. }) => "rate_limited",
            Err(ProviderError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        PROVIDER_REQUESTS
            .with_label_values(&[endpoint, label])
            .inc();
        PROVIDER_REQUEST_DURATION
            .with_label_values(&[endpoint])
            .observe(start.elapsed().as_secs_f64());

        let response = result?;
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Parse(format!("{} response: {}", endpoint, e)))
    }

    async fn send(
        &self,
        url: &str,
        extra_query: &[(&str, String)],
        not_found_id: Option<u32>,
    ) -> Result<reqwest::Response, ProviderError> {
        let mut request = self.client.get(url).query(&[("api_key", &self.api_key)]);
        if let Some(lang) = &self.language {
            request = request.query(&[("language", lang)]);
        }
        if !extra_query.is_empty() {
            request = request.query(extra_query);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = not_found_id {
                return Err(ProviderError::NotFound(id));
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_popular_movies(&self, page: u32) -> Result<ListingPage, ProviderError> {
        let url = format!("{}/movie/popular", self.base_url);

        debug!("TMDB popular movies: page={}", page);

        let listing: TmdbListingResponse = self
            .get_json("popular", &url, &[("page", page.to_string())], None)
            .await?;

        Ok(listing.into())
    }

    async fn fetch_movie_detail(&self, external_id: u32) -> Result<MovieDetail, ProviderError> {
        let url = format!("{}/movie/{}", self.base_url, external_id);

        debug!("TMDB movie detail: id={}", external_id);

        let details: TmdbMovieDetails = self
            .get_json(
                "movie_detail",
                &url,
                &[("append_to_response", "credits,videos".to_string())],
                Some(external_id),
            )
            .await?;

        Ok(normalize_detail(details, self.max_cast_members))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbListingResponse {
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    original_title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
    popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: u32,
    title: String,
    original_title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
    popularity: Option<f64>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    #[serde(default)]
    videos: Option<TmdbVideos>,
    #[serde(default)]
    credits: Option<TmdbCredits>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbVideos {
    #[serde(default)]
    results: Vec<TmdbVideo>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideo {
    key: String,
    name: String,
    site: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastMember>,
    #[serde(default)]
    crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Deserialize)]
struct TmdbCastMember {
    id: u32,
    name: String,
    profile_path: Option<String>,
    #[serde(default)]
    character: Option<String>,
    #[serde(default)]
    order: u32,
    popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewMember {
    id: u32,
    name: String,
    profile_path: Option<String>,
    #[serde(default)]
    job: String,
    popularity: Option<f64>,
}

// ============================================================================
// Conversions
// ============================================================================

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<TmdbMovieResult> for MovieSummary {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            external_id: r.id,
            title: r.title,
            original_title: non_empty(r.original_title),
            overview: non_empty(r.overview),
            poster_path: non_empty(r.poster_path),
            backdrop_path: non_empty(r.backdrop_path),
            release_date: non_empty(r.release_date),
            vote_average: r.vote_average,
            vote_count: r.vote_count,
            popularity: r.popularity,
        }
    }
}

impl From<TmdbListingResponse> for ListingPage {
    fn from(r: TmdbListingResponse) -> Self {
        Self {
            page: r.page,
            total_pages: r.total_pages,
            results: r.results.into_iter().map(|m| m.into()).collect(),
        }
    }
}

/// Normalize a raw details payload: cast by billing order, one credit per
/// person, crew reduced to directors, videos reduced to trailers/teasers.
fn normalize_detail(d: TmdbMovieDetails, max_cast_members: usize) -> MovieDetail {
    let credits = d.credits.unwrap_or_default();

    let mut raw_cast = credits.cast;
    raw_cast.sort_by_key(|c| c.order);

    let mut seen_cast = std::collections::HashSet::new();
    let cast: Vec<CastCredit> = raw_cast
        .into_iter()
        .filter(|c| seen_cast.insert(c.id))
        .take(max_cast_members)
        .map(|c| CastCredit {
            actor_external_id: c.id,
            name: c.name,
            profile_path: non_empty(c.profile_path),
            character: c.character.unwrap_or_default(),
            order: c.order,
            popularity: c.popularity,
        })
        .collect();

    let mut seen_directors = std::collections::HashSet::new();
    let directors: Vec<CrewCredit> = credits
        .crew
        .into_iter()
        .filter(|c| c.job == "Director" && seen_directors.insert(c.id))
        .map(|c| CrewCredit {
            actor_external_id: c.id,
            name: c.name,
            profile_path: non_empty(c.profile_path),
            popularity: c.popularity,
        })
        .collect();

    let videos: Vec<Video> = d
        .videos
        .map(|v| v.results)
        .unwrap_or_default()
        .into_iter()
        .filter(|v| v.kind == "Trailer" || v.kind == "Teaser")
        .map(|v| Video {
            key: v.key,
            name: v.name,
            site: v.site,
            kind: v.kind,
        })
        .collect();

    MovieDetail {
        external_id: d.id,
        title: d.title,
        original_title: non_empty(d.original_title),
        overview: non_empty(d.overview),
        poster_path: non_empty(d.poster_path),
        backdrop_path: non_empty(d.backdrop_path),
        release_date: non_empty(d.release_date),
        vote_average: d.vote_average,
        vote_count: d.vote_count,
        popularity: d.popularity,
        genres: d
            .genres
            .into_iter()
            .map(|g| Genre {
                id: g.id,
                name: g.name,
            })
            .collect(),
        videos,
        cast,
        directors,
    }
}
