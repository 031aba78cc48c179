//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use reelsync_core::{AuthError, AuthMethod, AuthRequest, Identity};
use tracing::warn;

use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Records duration, count and in-flight gauge per request.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let response = next.run(request).await;
    HTTP_REQUESTS_IN_FLIGHT.dec();

    let status = response.status().as_u16().to_string();
    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(start.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Authenticates admin requests and stores the [`Identity`] in request
/// extensions. Failures are answered with 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let authenticator = state.authenticator();

    if authenticator.method() == AuthMethod::None {
        request.extensions_mut().insert(Identity::anonymous());
        return Ok(next.run(request).await);
    }

    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    let source_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };

    match authenticator.authenticate(&auth_request).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(e) => {
            let reason = match e {
                AuthError::NotAuthenticated => "not_authenticated",
                AuthError::InvalidCredentials(_) => "invalid_credentials",
                AuthError::ConfigurationError(_) => "configuration_error",
            };
            warn!("Rejected {} {} from {}: {}", request.method(), request.uri().path(), source_ip, e);
            AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();

            if matches!(e, AuthError::ConfigurationError(_)) {
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            } else {
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

/// Extractor for the caller's identity.
///
/// Falls back to anonymous on routes without the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or_else(Identity::anonymous);
        std::future::ready(Ok(AuthUser(identity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, middleware, routing::get, Router};
    use http_body_util::BodyExt;
    use reelsync_core::{
        create_authenticator, load_config_from_str, testing::MockMetadataProvider,
        CatalogStore, SqliteCatalogStore, SyncJob,
    };
    use tower::ServiceExt;

    async fn whoami(AuthUser(identity): AuthUser) -> String {
        identity.subject
    }

    fn app(auth_section: &str) -> Router {
        let config = load_config_from_str(&format!(
            "{}\n[provider.tmdb]\napi_key = \"tmdb\"\n",
            auth_section
        ))
        .unwrap();
        let authenticator = Arc::from(create_authenticator(&config.auth).unwrap());
        let store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let job = Arc::new(SyncJob::new(
            config.sync.clone(),
            Arc::new(MockMetadataProvider::new()),
            Arc::clone(&store),
        ));
        let state = Arc::new(AppState::new(config, authenticator, store, job, None));

        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn api_key_app() -> Router {
        app("[auth]\nmethod = \"api_key\"\napi_key = \"secret-key\"")
    }

    async fn send(app: Router, headers: &[(&str, &str)]) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_none_auth_is_anonymous() {
        let (status, subject) = send(app("[auth]\nmethod = \"none\""), &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(subject, "anonymous");
    }

    #[tokio::test]
    async fn test_api_key_bearer() {
        let (status, subject) = send(
            api_key_app(),
            &[(header::AUTHORIZATION.as_str(), "Bearer secret-key")],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(subject, "admin");
    }

    #[tokio::test]
    async fn test_api_key_header() {
        let (status, _) = send(api_key_app(), &[("X-API-Key", "secret-key")]).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_key_wrong_or_missing() {
        let (status, _) = send(
            api_key_app(),
            &[(header::AUTHORIZATION.as_str(), "Bearer wrong-key")],
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(api_key_app(), &[]).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
