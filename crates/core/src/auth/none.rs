use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::config::AuthMethod;

/// Accepts every request as anonymous.
#[derive(Debug, Default)]
pub struct NoneAuthenticator;

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::IpAddr;

    #[tokio::test]
    async fn test_everyone_is_anonymous() {
        let request = AuthRequest {
            headers: HashMap::from([("x-api-key".to_string(), "whatever".to_string())]),
            source_ip: IpAddr::from([192, 168, 1, 7]),
        };

        let identity = NoneAuthenticator.authenticate(&request).await.unwrap();
        assert_eq!(identity, Identity::anonymous());
    }
}
