//! Static API key authentication.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::config::AuthMethod;

/// Checks requests against a configured admin key.
///
/// The key is read from `Authorization: Bearer <key>` or `X-API-Key: <key>`.
/// Only the SHA-256 digest of the expected key is kept.
pub struct ApiKeyAuthenticator {
    expected: [u8; 32],
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: &str) -> Self {
        Self {
            expected: digest(api_key),
        }
    }
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

fn presented_key(request: &AuthRequest) -> Option<&str> {
    if let Some(value) = request.header("authorization") {
        let (scheme, key) = value.split_once(' ')?;
        return scheme.eq_ignore_ascii_case("bearer").then_some(key.trim());
    }
    request.header("x-api-key").map(str::trim)
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let key = presented_key(request).ok_or(AuthError::NotAuthenticated)?;

        // Fixed-length digests, compared without early exit
        let provided = digest(key);
        let diff = provided
            .iter()
            .zip(self.expected.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        if diff == 0 {
            Ok(Identity::admin())
        } else {
            Err(AuthError::InvalidCredentials("invalid API key".to_string()))
        }
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::ApiKey
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn request(headers: &[(&str, &str)]) -> AuthRequest {
        AuthRequest {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            source_ip: IpAddr::from([127, 0, 0, 1]),
        }
    }

    #[tokio::test]
    async fn test_bearer_and_header_keys_accepted() {
        let auth = ApiKeyAuthenticator::new("admin-key");

        for headers in [
            vec![("Authorization", "Bearer admin-key")],
            vec![("Authorization", "bearer admin-key")],
            vec![("X-API-Key", "admin-key")],
        ] {
            let identity = auth.authenticate(&request(&headers)).await.unwrap();
            assert_eq!(identity, Identity::admin());
        }
    }

    #[tokio::test]
    async fn test_wrong_key_rejected() {
        let auth = ApiKeyAuthenticator::new("admin-key");
        let result = auth
            .authenticate(&request(&[("X-API-Key", "admin-kez")]))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthenticated() {
        let auth = ApiKeyAuthenticator::new("admin-key");
        let result = auth.authenticate(&request(&[])).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_other_scheme_rejected() {
        let auth = ApiKeyAuthenticator::new("admin-key");
        let result = auth
            .authenticate(&request(&[("Authorization", "Basic YWRtaW4=")]))
            .await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }
}
