use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::provider::TmdbConfig;
use crate::scheduler::SchedulerConfig;
use crate::sync::SyncConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

/// Authentication for the admin API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when `method = "api_key"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// No authentication. Only for trusted networks.
    None,
    /// Static key in `Authorization: Bearer` or `X-API-Key`.
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::ApiKey => "api_key",
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reelsync.db")
}

/// Metadata provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub tmdb: TmdbConfig,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider: SanitizedProviderConfig,
    pub sync: SyncConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub tmdb: SanitizedTmdbConfig,
}

/// Sanitized TMDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub max_cast_members: usize,
    pub timeout_secs: u64,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let tmdb = &config.provider.tmdb;
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            provider: SanitizedProviderConfig {
                tmdb: SanitizedTmdbConfig {
                    base_url: tmdb.base_url.clone(),
                    language: tmdb.language.clone(),
                    max_cast_members: tmdb.max_cast_members,
                    timeout_secs: tmdb.timeout_secs,
                    api_key_configured: !tmdb.api_key.is_empty(),
                },
            },
            sync: config.sync.clone(),
            scheduler: config.scheduler.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[auth]
method = "none"

[provider.tmdb]
api_key = "tmdb-secret"
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.auth.method, AuthMethod::None);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.database.path.to_str().unwrap(), "reelsync.db");
        assert_eq!(config.provider.tmdb.api_key, "tmdb-secret");
        assert_eq!(config.provider.tmdb.max_cast_members, 20);
        assert_eq!(config.sync.throttle_delay_ms, 1000);
        assert_eq!(config.scheduler.interval_secs, 86_400);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[auth]
method = "api_key"
api_key = "admin-key"

[server]
host = "0.0.0.0"
port = 9000

[database]
path = "/data/catalog.db"

[provider.tmdb]
api_key = "tmdb-secret"
language = "de-DE"
max_cast_members = 10

[sync]
throttle_delay_ms = 250
max_pages = 3

[scheduler]
enabled = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.method, AuthMethod::ApiKey);
        assert_eq!(config.auth.api_key.as_deref(), Some("admin-key"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path.to_str().unwrap(), "/data/catalog.db");
        assert_eq!(config.provider.tmdb.language.as_deref(), Some("de-DE"));
        assert_eq!(config.provider.tmdb.max_cast_members, 10);
        assert_eq!(config.sync.max_pages, 3);
        assert_eq!(config.sync.rate_limit_retries, 2);
        assert!(!config.scheduler.enabled);
    }

    #[test]
    fn test_deserialize_missing_provider_fails() {
        let toml = r#"
[auth]
method = "none"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.auth.method = AuthMethod::ApiKey;
        config.auth.api_key = Some("admin-key".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.auth.method, "api_key");
        assert!(sanitized.auth.api_key_configured);
        assert!(sanitized.provider.tmdb.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("tmdb-secret"));
        assert!(!json.contains("admin-key"));
    }
}
