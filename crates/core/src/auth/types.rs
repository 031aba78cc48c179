use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

use crate::config::AuthMethod;

/// The parts of an HTTP request authentication looks at.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

impl AuthRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Who made an admin request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub method: AuthMethod,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            method: AuthMethod::None,
        }
    }

    pub fn admin() -> Self {
        Self {
            subject: "admin".to_string(),
            method: AuthMethod::ApiKey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_serialization() {
        let json = serde_json::to_value(Identity::admin()).unwrap();
        assert_eq!(json["subject"], "admin");
        assert_eq!(json["method"], "api_key");

        let anon: Identity = serde_json::from_value(serde_json::json!({
            "subject": "anonymous",
            "method": "none"
        }))
        .unwrap();
        assert_eq!(anon, Identity::anonymous());
    }

    #[test]
    fn test_header_lookup() {
        let request = AuthRequest {
            headers: HashMap::from([("x-api-key".to_string(), "k".to_string())]),
            source_ip: IpAddr::from([10, 0, 0, 1]),
        };
        assert_eq!(request.header("x-api-key"), Some("k"));
        assert_eq!(request.header("authorization"), None);
    }
}
