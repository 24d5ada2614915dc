//! Backend module: the capability interface callers use
//!
//! Two acquisition strategies sit behind one [`Backend`] trait:
//! - `browser`: an interactive Chromium session driven over CDP
//! - `api`: token-authenticated calls to the remote lead API
//!
//! Both are wrapped by the same [`Adapter`], so searches and detail fetches
//! return identical shapes whichever strategy is configured.

mod adapter;
mod api;
mod browser;
mod query;

pub use adapter::Adapter;
pub use api::{build_api_client, ApiDriver};
pub use browser::{BrowserDriver, BrowserSession, BrowserSettings};
pub use query::{lead_search_body, search_page_url, with_page, with_paging};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::crawler::{EnrichmentReport, StopReason};
use crate::extract::ResultExtractor;
use crate::model::{AuthStatus, Profile, ProfileDetails, SearchFilter, SearchResponse};
use crate::{ConfigError, FetchError, Result};

/// Acquisition strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Interactive browser session
    Browser,
    /// Token-based remote API
    #[default]
    Api,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything one search call produced
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Result profiles in platform order; a prefix may carry details
    pub profiles: Vec<Profile>,
    pub pages_fetched: u32,
    /// Records dropped for missing mandatory fields
    pub dropped: usize,
    pub stop: StopReason,
    /// Present when details were requested
    pub enrichment: Option<EnrichmentReport>,
    /// Rate-limited actions spent by the call
    pub actions: u32,
}

impl SearchOutcome {
    /// Returns true if the result set may be incomplete
    pub fn is_partial(&self) -> bool {
        !self.stop.is_clean()
    }

    pub fn into_response(self, filter: &SearchFilter) -> SearchResponse {
        SearchResponse::new(filter.clone(), self.profiles)
    }
}

/// Search and detail capability shared by every acquisition strategy
///
/// Callers never see which strategy serves them: both take the same filter
/// and return the same `Profile`/`ProfileDetails` shapes.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Opens the session resource and authenticates
    async fn initialize(&self) -> Result<()>;

    /// Runs one search, enriching a prefix of the results when requested
    ///
    /// Authentication failures abort the call. Fetch failures and the action
    /// ceiling only shorten the result; see `SearchOutcome::stop`. A session
    /// rejected mid-call also shortens the result and marks the session
    /// expired for the next call.
    async fn search(&self, filter: &SearchFilter) -> Result<SearchOutcome>;

    /// Fetches one profile's extended record by profile URL or member id
    async fn detail(&self, profile: &str) -> Result<ProfileDetails>;

    async fn auth_status(&self) -> AuthStatus;

    /// Releases the session resource
    async fn shutdown(&self);
}

/// Builds the backend selected by `[backend] kind`
pub fn build_backend(config: &Config) -> Result<Box<dyn Backend>> {
    let extractor = ResultExtractor::new(&config.browser.selectors, &config.api.mapping)?;
    let rate_limit = config.rate_limit_policy();
    let login = config.login_policy();
    let timeout = config.request_timeout();

    let backend: Box<dyn Backend> = match config.backend.kind {
        BackendKind::Browser => {
            let session = BrowserSession::new(BrowserSettings::from(&config.browser));
            let driver = BrowserDriver::new(session, &config.browser)
                .map_err(|e| ConfigError::InvalidUrl(format!("browser.base-url: {}", e)))?;
            Box::new(
                Adapter::new(BackendKind::Browser, driver, extractor, rate_limit, login, timeout)
                    .serialized(),
            )
        }
        BackendKind::Api => {
            let client = build_api_client(timeout).map_err(FetchError::from)?;
            let driver = ApiDriver::new(&config.api, client);
            Box::new(Adapter::new(
                BackendKind::Api,
                driver,
                extractor,
                rate_limit,
                login,
                timeout,
            ))
        }
    };

    tracing::debug!("Built {} backend", backend.kind());
    Ok(backend)
}
