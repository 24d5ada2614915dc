use crate::backend::BackendKind;
use crate::crawler::RateLimitPolicy;
use crate::extract::{HtmlMapping, JsonMapping};
use crate::session::LoginPolicy;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for Profile-Harvester
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub session: SessionConfig,
    pub browser: BrowserBackendConfig,
    pub api: ApiBackendConfig,
}

impl Config {
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            request_delay: Duration::from_millis(self.rate_limit.request_delay_ms),
            max_actions_per_session: self.rate_limit.max_actions_per_session,
        }
    }

    pub fn login_policy(&self) -> LoginPolicy {
        LoginPolicy {
            poll_interval: Duration::from_secs(self.session.login_poll_interval_secs),
            timeout: Duration::from_secs(self.session.login_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.session.request_timeout_secs)
    }
}

/// Acquisition strategy selection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Which strategy serves search and detail calls
    pub kind: BackendKind,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum time between two gated actions (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Maximum gated actions in one pipeline run
    #[serde(rename = "max-actions-per-session")]
    pub max_actions_per_session: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 2000,
            max_actions_per_session: 100,
        }
    }
}

/// Session and timeout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interval between manual-login checks (seconds)
    #[serde(rename = "login-poll-interval-secs")]
    pub login_poll_interval_secs: u64,

    /// Give up waiting for a manual login after this long (seconds)
    #[serde(rename = "login-timeout-secs")]
    pub login_timeout_secs: u64,

    /// Per page/profile fetch timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_poll_interval_secs: 5,
            login_timeout_secs: 300,
            request_timeout_secs: 30,
        }
    }
}

/// Interactive browser strategy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserBackendConfig {
    /// Site origin the browser navigates to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Run Chromium without a visible window
    pub headless: bool,

    /// User agent reported by the browser
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Profile directory that keeps cookies between runs
    #[serde(rename = "user-data-dir")]
    pub user_data_dir: String,

    /// Login email; when empty the login is left to the user
    pub email: String,

    pub password: Secret,

    /// Selector table for search and profile pages
    pub selectors: HtmlMapping,
}

impl Default for BrowserBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.linkedin.com".to_string(),
            headless: false,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
            user_data_dir: "./user_data".to_string(),
            email: String::new(),
            password: Secret::default(),
            selectors: HtmlMapping::default(),
        }
    }
}

/// Remote API strategy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiBackendConfig {
    /// Base URL for identity calls
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Base URL for lead search and lead detail calls
    #[serde(rename = "sales-url")]
    pub sales_url: String,

    /// OAuth token endpoint used for refreshing access tokens
    #[serde(rename = "oauth-token-url")]
    pub oauth_token_url: String,

    #[serde(rename = "client-id")]
    pub client_id: String,

    #[serde(rename = "client-secret")]
    pub client_secret: Secret,

    #[serde(rename = "access-token")]
    pub access_token: Secret,

    #[serde(rename = "refresh-token")]
    pub refresh_token: Secret,

    /// Access token expiry as Unix milliseconds; 0 means unknown
    #[serde(rename = "token-expires-at")]
    pub token_expires_at: i64,

    /// Results requested per search page
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Field list requested from the lead detail endpoint
    #[serde(rename = "detail-fields")]
    pub detail_fields: String,

    /// Key-path table for search and detail payloads
    pub mapping: JsonMapping,
}

impl Default for ApiBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.linkedin.com/v2".to_string(),
            sales_url: "https://api.linkedin.com/sales-api/v1".to_string(),
            oauth_token_url: "https://www.linkedin.com/oauth/v2/accessToken".to_string(),
            client_id: String::new(),
            client_secret: Secret::default(),
            access_token: Secret::default(),
            refresh_token: Secret::default(),
            token_expires_at: 0,
            page_size: 25,
            detail_fields: "firstName,lastName,title,companyName,location,profilePictureUrl,summary,experience,education,skills".to_string(),
            mapping: JsonMapping::default(),
        }
    }
}

/// A credential value that never shows up in logs
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "Secret(<empty>)")
        } else {
            write!(f, "Secret(<redacted>)")
        }
    }
}
