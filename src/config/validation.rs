use crate::config::types::{
    ApiBackendConfig, BrowserBackendConfig, Config, RateLimitConfig, SessionConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_rate_limit_config(&config.rate_limit)?;
    validate_session_config(&config.session)?;
    validate_browser_config(&config.browser)?;
    validate_api_config(&config.api)?;
    Ok(())
}

/// Validates rate limiting configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    // request_delay_ms >= 0 is always true for u64; zero disables spacing

    if config.max_actions_per_session < 1 {
        return Err(ConfigError::Validation(format!(
            "max_actions_per_session must be >= 1, got {}",
            config.max_actions_per_session
        )));
    }

    Ok(())
}

/// Validates session timing configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.login_poll_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "login_poll_interval_secs must be >= 1".to_string(),
        ));
    }

    if config.login_timeout_secs < config.login_poll_interval_secs {
        return Err(ConfigError::Validation(format!(
            "login_timeout_secs ({}) must be >= login_poll_interval_secs ({})",
            config.login_timeout_secs, config.login_poll_interval_secs
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates browser strategy configuration
fn validate_browser_config(config: &BrowserBackendConfig) -> Result<(), ConfigError> {
    validate_http_url("browser.base_url", &config.base_url)?;

    if config.user_data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "user_data_dir cannot be empty".to_string(),
        ));
    }

    if !config.email.is_empty() && config.password.is_empty() {
        return Err(ConfigError::Validation(
            "browser.email is set but browser.password is empty".to_string(),
        ));
    }

    config
        .selectors
        .validate()
        .map_err(ConfigError::InvalidSelector)?;

    Ok(())
}

/// Validates remote API strategy configuration
fn validate_api_config(config: &ApiBackendConfig) -> Result<(), ConfigError> {
    validate_http_url("api.base_url", &config.base_url)?;
    validate_http_url("api.sales_url", &config.sales_url)?;
    validate_http_url("api.oauth_token_url", &config.oauth_token_url)?;

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    if config.token_expires_at < 0 {
        return Err(ConfigError::Validation(format!(
            "token_expires_at must be a Unix millisecond timestamp, got {}",
            config.token_expires_at
        )));
    }

    config
        .mapping
        .validate()
        .map_err(ConfigError::Validation)?;

    Ok(())
}

/// Validates that a configured URL parses and uses HTTP(S)
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}
