use crate::config::types::{Config, Secret};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied after parsing and before validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate(&config)?;

    Ok(config)
}

/// Parses configuration text without touching the environment or validating
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Applies credential and display overrides from an environment lookup
///
/// Only non-empty values override the file. The lookup is a parameter so tests
/// do not have to mutate the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(email) = get("LINKEDIN_EMAIL") {
        config.browser.email = email;
    }
    if let Some(password) = get("LINKEDIN_PASSWORD") {
        config.browser.password = Secret::new(password);
    }
    if let Some(headless) = get("HEADLESS") {
        config.browser.headless = headless.trim().eq_ignore_ascii_case("true");
    }
    if let Some(client_id) = get("LINKEDIN_API_CLIENT_ID") {
        config.api.client_id = client_id;
    }
    if let Some(secret) = get("LINKEDIN_API_CLIENT_SECRET") {
        config.api.client_secret = Secret::new(secret);
    }
    if let Some(token) = get("LINKEDIN_API_ACCESS_TOKEN") {
        config.api.access_token = Secret::new(token);
    }
    if let Some(token) = get("LINKEDIN_API_REFRESH_TOKEN") {
        config.api.refresh_token = Secret::new(token);
    }
    if let Some(expires_at) = get("LINKEDIN_API_TOKEN_EXPIRES_AT") {
        match expires_at.trim().parse::<i64>() {
            Ok(ms) => config.api.token_expires_at = ms,
            Err(_) => tracing::warn!(
                "Ignoring LINKEDIN_API_TOKEN_EXPIRES_AT: '{}' is not a millisecond timestamp",
                expires_at
            ),
        }
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash identifies which configuration produced a given export.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
