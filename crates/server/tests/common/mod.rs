//! Common test utilities for API testing with mocks.
//!
//! Builds the full router in-process over a temporary SQLite catalog and a
//! [`MockMetadataProvider`], so no network access is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reelsync_core::{
    create_authenticator, load_config_from_str, testing::MockMetadataProvider, CatalogStore,
    SqliteCatalogStore, SyncJob,
};
use reelsync_server::state::AppState;

/// Re-export fixtures for test convenience
pub use reelsync_core::testing::fixtures;

/// In-process server with a controllable provider.
pub struct TestFixture {
    pub router: Router,
    pub provider: Arc<MockMetadataProvider>,
    pub store: Arc<SqliteCatalogStore>,
    pub sync_job: Arc<SyncJob>,
    _temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with auth disabled.
    pub async fn new() -> Self {
        Self::with_auth("[auth]\nmethod = \"none\"").await
    }

    /// Fixture requiring `X-API-Key: admin-key`.
    pub async fn with_api_key() -> Self {
        Self::with_auth("[auth]\nmethod = \"api_key\"\napi_key = \"admin-key\"").await
    }

    async fn with_auth(auth_section: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = load_config_from_str(&format!(
            r#"
{}

[provider.tmdb]
api_key = "tmdb-test-key"

[sync]
throttle_delay_ms = 0
max_pages = 2

[scheduler]
enabled = false
"#,
            auth_section
        ))
        .expect("Invalid test config");

        let store = Arc::new(
            SqliteCatalogStore::new(&temp_dir.path().join("catalog.db"))
                .expect("Failed to create store"),
        );
        let provider = Arc::new(MockMetadataProvider::new());
        let sync_job = Arc::new(SyncJob::new(
            config.sync.clone(),
            Arc::clone(&provider) as Arc<dyn reelsync_core::MetadataProvider>,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
        ));
        let authenticator =
            Arc::from(create_authenticator(&config.auth).expect("Failed to create authenticator"));

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            Arc::clone(&sync_job),
            None,
        ));

        Self {
            router: reelsync_server::api::create_router(state),
            provider,
            store,
            sync_job,
            _temp_dir: temp_dir,
        }
    }

    /// Serve Fight Club as the only popular movie.
    pub async fn serve_fight_club(&self) {
        self.provider.add_movie(fixtures::fight_club()).await;
        self.provider
            .set_popular(vec![fixtures::summary(550, "Fight Club")], 20)
            .await;
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> TestResponse {
        self.request("POST", path, body, &[]).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None, &[]).await
    }

    /// Send a POST request with a raw body (for malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    /// Send a request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
