//! External metadata provider integration.
//!
//! The provider is consumed through a narrow interface: a paginated listing
//! of popular movies and a per-movie detail lookup whose credits are already
//! resolved to provider person IDs. Clients never retry; retry policy belongs
//! to the caller.

mod tmdb;
mod types;

pub use tmdb::{TmdbConfig, TmdbProvider};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to a metadata provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network failure, 5xx or any other unexpected response.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider is throttling us.
    #[error("Provider rate limit exceeded")]
    RateLimited {
        /// Seconds to wait, from the `Retry-After` header when present.
        retry_after_secs: Option<u64>,
    },

    /// The requested movie no longer exists upstream.
    #[error("Movie {0} not found at provider")]
    NotFound(u32),

    /// Failed to parse response.
    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    /// Client not configured (missing or rejected API key).
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else {
            ProviderError::Unavailable(e.to_string())
        }
    }
}

/// Source of movie metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch one page (1-based) of the popular movies listing.
    async fn fetch_popular_movies(&self, page: u32) -> Result<ListingPage, ProviderError>;

    /// Fetch full details, including normalized cast and directors.
    async fn fetch_movie_detail(&self, external_id: u32) -> Result<MovieDetail, ProviderError>;

    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;
}
