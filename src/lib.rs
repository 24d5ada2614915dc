//! Profile-Harvester: a rate-limited public-profile extraction pipeline
//!
//! This crate discovers and extracts public-profile records through one of two
//! interchangeable acquisition strategies (an interactive browser session or a
//! token-based remote API) and returns the same result shape from both.

pub mod backend;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod output;
pub mod session;
pub mod state;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Profile-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    LimitExceeded(#[from] LimitExceeded),
}

impl HarvestError {
    /// Returns true if this error means the requested profile does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Fetch(FetchError::NotFound { .. }))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Session and credential errors
///
/// Any of these aborts the whole pipeline call: nothing can be fetched
/// without a session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Credentials rejected: {0}")]
    InvalidCredentials(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Timed out after {waited:?} waiting for manual login")]
    Timeout { waited: Duration },

    #[error("Access token has expired")]
    TokenExpired,

    #[error("Session resource unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: state::SessionState,
        to: state::SessionState,
    },
}

/// Errors raised while fetching one page or one profile
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Unauthorized response from {url}")]
    Unauthorized { url: String },

    #[error("Profile not found: {url}")]
    NotFound { url: String },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid profile reference: {0}")]
    InvalidProfileUrl(String),

    #[error("Session is not open")]
    SessionClosed,

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Raised by the rate limiter once the per-run action ceiling is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Rate limit ceiling of {limit} actions reached")]
pub struct LimitExceeded {
    pub limit: u32,
}

/// Result type alias for Profile-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use backend::{build_backend, Backend, BackendKind, SearchOutcome};
pub use config::Config;
pub use model::{Profile, ProfileDetails, SearchFilter, SearchRequest, SearchResponse};
pub use state::SessionState;
pub use url::canonical_profile_url;
