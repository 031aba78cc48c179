//! Mock metadata provider for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::provider::{ListingPage, MetadataProvider, MovieDetail, MovieSummary, ProviderError};

/// A recorded provider call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedProviderCall {
    PopularMovies { page: u32 },
    MovieDetail { external_id: u32 },
}

/// Injected failure for a detail or listing request.
#[derive(Debug, Clone)]
enum Injected {
    /// Fail every time.
    Always(ProviderError),
    /// Fail the next N times, then succeed.
    Times(VecDeque<ProviderError>),
}

/// Mock implementation of the MetadataProvider trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable popular listing and movie details
/// - Fail specific movie IDs or listing pages
/// - Track calls for assertions
///
/// # Example
///
/// ```rust,ignore
/// use reelsync_core::testing::{MockMetadataProvider, fixtures};
///
/// let provider = MockMetadataProvider::new();
/// provider.add_movie(fixtures::fight_club()).await;
/// provider.set_popular(vec![fixtures::summary(550, "Fight Club")], 20).await;
/// provider.fail_detail(550, ProviderError::NotFound(550)).await;
/// ```
#[derive(Debug)]
pub struct MockMetadataProvider {
    /// Movie details by provider ID.
    movies: Arc<RwLock<HashMap<u32, MovieDetail>>>,
    /// Listing pages by page number.
    pages: Arc<RwLock<HashMap<u32, ListingPage>>>,
    /// Total pages reported when no page is configured.
    total_pages: Arc<RwLock<u32>>,
    /// Detail failures by movie ID.
    detail_errors: Arc<RwLock<HashMap<u32, Injected>>>,
    /// Listing failures by page.
    page_errors: Arc<RwLock<HashMap<u32, Injected>>>,
    /// Artificial latency for detail fetches.
    detail_delay: Arc<RwLock<Option<Duration>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedProviderCall>>>,
}

impl Default for MockMetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMetadataProvider {
    /// Create a new empty mock provider.
    pub fn new() -> Self {
        Self {
            movies: Arc::new(RwLock::new(HashMap::new())),
            pages: Arc::new(RwLock::new(HashMap::new())),
            total_pages: Arc::new(RwLock::new(0)),
            detail_errors: Arc::new(RwLock::new(HashMap::new())),
            page_errors: Arc::new(RwLock::new(HashMap::new())),
            detail_delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    // =========================================================================
    // Data Configuration
    // =========================================================================

    /// Add (or replace) a movie detail.
    pub async fn add_movie(&self, detail: MovieDetail) {
        self.movies.write().await.insert(detail.external_id, detail);
    }

    /// Remove a movie, so its detail lookup returns `NotFound`.
    pub async fn remove_movie(&self, external_id: u32) {
        self.movies.write().await.remove(&external_id);
    }

    /// Set the popular listing, split into pages of `per_page`.
    pub async fn set_popular(&self, summaries: Vec<MovieSummary>, per_page: usize) {
        let per_page = per_page.max(1);
        let chunks: Vec<Vec<MovieSummary>> =
            summaries.chunks(per_page).map(|c| c.to_vec()).collect();
        let total_pages = chunks.len() as u32;

        let mut pages = self.pages.write().await;
        pages.clear();
        for (i, results) in chunks.into_iter().enumerate() {
            let page = i as u32 + 1;
            pages.insert(
                page,
                ListingPage {
                    page,
                    total_pages,
                    results,
                },
            );
        }
        *self.total_pages.write().await = total_pages;
    }

    /// Set a single listing page verbatim.
    pub async fn set_page(&self, page: ListingPage) {
        *self.total_pages.write().await = page.total_pages;
        self.pages.write().await.insert(page.page, page);
    }

    /// Delay every detail fetch by `delay`.
    pub async fn set_detail_delay(&self, delay: Duration) {
        *self.detail_delay.write().await = Some(delay);
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Make every detail fetch for `external_id` fail.
    pub async fn fail_detail(&self, external_id: u32, error: ProviderError) {
        self.detail_errors
            .write()
            .await
            .insert(external_id, Injected::Always(error));
    }

    /// Make the next `times` detail fetches for `external_id` fail.
    pub async fn fail_detail_times(&self, external_id: u32, error: ProviderError, times: usize) {
        let queue = std::iter::repeat(error).take(times).collect();
        self.detail_errors
            .write()
            .await
            .insert(external_id, Injected::Times(queue));
    }

    /// Make every fetch of a listing page fail.
    pub async fn fail_page(&self, page: u32, error: ProviderError) {
        self.page_errors
            .write()
            .await
            .insert(page, Injected::Always(error));
    }

    /// Remove all injected failures.
    pub async fn clear_failures(&self) {
        self.detail_errors.write().await.clear();
        self.page_errors.write().await.clear();
    }

    async fn take_error(map: &RwLock<HashMap<u32, Injected>>, key: u32) -> Option<ProviderError> {
        let mut map = map.write().await;
        let (err, exhausted) = match map.get_mut(&key)? {
            Injected::Always(e) => return Some(e.clone()),
            Injected::Times(queue) => {
                let err = queue.pop_front();
                (err, queue.is_empty())
            }
        };
        if exhausted {
            map.remove(&key);
        }
        err
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedProviderCall> {
        self.calls.read().await.clone()
    }

    /// Number of detail fetches for a movie.
    pub async fn detail_calls(&self, external_id: u32) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| **c == RecordedProviderCall::MovieDetail { external_id })
            .count()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    async fn fetch_popular_movies(&self, page: u32) -> Result<ListingPage, ProviderError> {
        self.calls
            .write()
            .await
            .push(RecordedProviderCall::PopularMovies { page });

        if let Some(err) = Self::take_error(&self.page_errors, page).await {
            return Err(err);
        }

        if let Some(listing) = self.pages.read().await.get(&page) {
            return Ok(listing.clone());
        }

        // Past the end, like TMDB: an empty page with the real total.
        Ok(ListingPage {
            page,
            total_pages: *self.total_pages.read().await,
            results: Vec::new(),
        })
    }

    async fn fetch_movie_detail(&self, external_id: u32) -> Result<MovieDetail, ProviderError> {
        self.calls
            .write()
            .await
            .push(RecordedProviderCall::MovieDetail { external_id });

        let delay = *self.detail_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = Self::take_error(&self.detail_errors, external_id).await {
            return Err(err);
        }

        self.movies
            .read()
            .await
            .get(&external_id)
            .cloned()
            .ok_or(ProviderError::NotFound(external_id))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_pages_and_past_the_end() {
        let provider = MockMetadataProvider::new();
        provider
            .set_popular(
                (1..=5).map(|i| fixtures::summary(i, "Movie")).collect(),
                2,
            )
            .await;

        let first = provider.fetch_popular_movies(1).await.unwrap();
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.results.len(), 2);

        let last = provider.fetch_popular_movies(3).await.unwrap();
        assert_eq!(last.results.len(), 1);

        let beyond = provider.fetch_popular_movies(4).await.unwrap();
        assert!(beyond.results.is_empty());
        assert_eq!(beyond.total_pages, 3);
    }

    #[tokio::test]
    async fn test_fail_detail_times() {
        let provider = MockMetadataProvider::new();
        provider.add_movie(fixtures::fight_club()).await;
        provider
            .fail_detail_times(
                550,
                ProviderError::RateLimited {
                    retry_after_secs: None,
                },
                1,
            )
            .await;

        assert!(provider.fetch_movie_detail(550).await.is_err());
        assert!(provider.fetch_movie_detail(550).await.is_ok());
        assert_eq!(provider.detail_calls(550).await, 2);
    }

    #[tokio::test]
    async fn test_unknown_movie_not_found() {
        let provider = MockMetadataProvider::new();
        let err = provider.fetch_movie_detail(1).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(1)));
    }
}
