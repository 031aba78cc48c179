use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Checks:
/// - Server port is not 0
/// - An API key is set when auth uses one
/// - The TMDB API key is set and keeps at least one cast member
/// - Sync walks at least one page
/// - An enabled scheduler has a non-zero interval
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_ref().is_none_or(|k| k.is_empty())
    {
        return Err(invalid("auth.api_key is required when auth.method = \"api_key\""));
    }

    let tmdb = &config.provider.tmdb;
    if tmdb.api_key.is_empty() {
        return Err(invalid("provider.tmdb.api_key cannot be empty"));
    }
    if tmdb.max_cast_members == 0 {
        return Err(invalid("provider.tmdb.max_cast_members must be at least 1"));
    }

    if config.sync.max_pages == 0 {
        return Err(invalid("sync.max_pages must be at least 1"));
    }

    if config.scheduler.enabled && config.scheduler.interval_secs == 0 {
        return Err(invalid("scheduler.interval_secs cannot be 0"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
