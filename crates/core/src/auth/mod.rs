//! Admin API authentication.
//!
//! Two methods are supported: `none` for trusted networks and a static
//! `api_key`. The method must be chosen explicitly in config.

mod api_key;
mod none;
mod types;

pub use api_key::ApiKeyAuthenticator;
pub use none::NoneAuthenticator;
pub use types::{AuthRequest, Identity};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the caller's identity.
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    fn method(&self) -> AuthMethod;
}

/// Build the authenticator selected by config.
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator)),
        AuthMethod::ApiKey => match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(Box::new(ApiKeyAuthenticator::new(key))),
            _ => Err(AuthError::ConfigurationError(
                "auth.api_key must be set for the api_key method".to_string(),
            )),
        },
    }
}
