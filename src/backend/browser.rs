//! Interactive browser strategy
//!
//! One Chromium instance with one tab serves every call. The instance lives
//! in a [`BrowserSession`] handle with an explicit acquire/release lifecycle;
//! the profile directory keeps cookies so a login survives restarts.

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use super::query::{search_page_url, with_page};
use crate::config::{BrowserBackendConfig, Secret};
use crate::crawler::{PageSource, SearchQuery};
use crate::extract::RawPayload;
use crate::model::SearchFilter;
use crate::session::{Authenticator, LoginAttempt};
use crate::url::{canonical_profile_url, member_id_from_reference, profile_url_from_member_id};
use crate::{AuthError, FetchError, FetchResult};

const FEED_PATH: &str = "/feed/";
const LOGIN_PATH: &str = "/login";
const LOGGED_IN_MARKER: &str = "nav.global-nav";
const WALL_SECTIONS: [&str; 4] = ["login", "authwall", "checkpoint", "uas"];
const WINDOW_WIDTH: u32 = 1366;
const WINDOW_HEIGHT: u32 = 768;

/// Returns true if a landed URL is a login, authwall or verification page
fn is_login_wall(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .next()
                .map(|section| WALL_SECTIONS.contains(&section))
        })
        .unwrap_or(false)
}

/// Launch settings for the shared browser
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub user_agent: String,
    pub user_data_dir: String,
}

impl From<&BrowserBackendConfig> for BrowserSettings {
    fn from(config: &BrowserBackendConfig) -> Self {
        Self {
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            user_data_dir: config.user_data_dir.clone(),
        }
    }
}

struct OpenBrowser {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

/// Handle to the one browser instance shared by a process
pub struct BrowserSession {
    settings: BrowserSettings,
    inner: Mutex<Option<OpenBrowser>>,
}

impl BrowserSession {
    pub fn new(settings: BrowserSettings) -> Arc<Self> {
        Arc::new(Self {
            settings,
            inner: Mutex::new(None),
        })
    }

    /// Launches the browser unless it is already running
    pub async fn acquire(&self) -> Result<(), String> {
        let mut inner = self.inner.lock().await;
        if inner.is_some() {
            return Ok(());
        }

        tracing::info!(
            "Launching browser (headless: {}, profile: {})",
            self.settings.headless,
            self.settings.user_data_dir
        );

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&self.settings.user_data_dir)
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .no_sandbox();
        if !self.settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build()?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| format!("failed to launch browser: {}", e))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    tracing::trace!("Browser handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("failed to open tab: {}", e))?;
        page.set_user_agent(self.settings.user_agent.clone())
            .await
            .map_err(|e| format!("failed to set user agent: {}", e))?;

        *inner = Some(OpenBrowser {
            browser,
            page,
            handler,
        });
        Ok(())
    }

    /// Closes the browser if it is running
    pub async fn release(&self) {
        let Some(mut open) = self.inner.lock().await.take() else {
            return;
        };
        if let Err(e) = open.browser.close().await {
            tracing::warn!("Browser did not close cleanly: {}", e);
        }
        let _ = open.browser.wait().await;
        open.handler.abort();
        tracing::info!("Browser closed");
    }

    /// The shared tab, if the browser is running
    pub async fn page(&self) -> FetchResult<Page> {
        self.inner
            .lock()
            .await
            .as_ref()
            .map(|open| open.page.clone())
            .ok_or(FetchError::SessionClosed)
    }
}

/// Drives the shared browser for login, search and profile pages
pub struct BrowserDriver {
    session: Arc<BrowserSession>,
    base_url: Url,
    email: String,
    password: Secret,
}

impl BrowserDriver {
    pub fn new(
        session: Arc<BrowserSession>,
        config: &BrowserBackendConfig,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            session,
            base_url: Url::parse(&config.base_url)?,
            email: config.email.clone(),
            password: config.password.clone(),
        })
    }

    fn has_credentials(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    fn url_for(&self, path: &str) -> FetchResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidProfileUrl(format!("{}: {}", path, e)))
    }

    /// Navigates the shared tab and returns it
    async fn navigate(&self, url: &Url) -> FetchResult<Page> {
        let page = self.session.page().await?;
        page.goto(url.as_str())
            .await
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(page)
    }

    async fn current_url(page: &Page) -> String {
        page.url().await.ok().flatten().unwrap_or_default()
    }

    /// Checks the current tab for signs of a live session
    async fn shows_logged_in(page: &Page) -> bool {
        let url = Self::current_url(page).await;
        if url.contains(FEED_PATH) || url.contains("/home") {
            return true;
        }
        page.find_element(LOGGED_IN_MARKER).await.is_ok()
    }

    async fn fill_login_form(&self, page: &Page) -> Result<(), chromiumoxide::error::CdpError> {
        page.find_element("#username")
            .await?
            .click()
            .await?
            .type_str(&self.email)
            .await?;
        page.find_element("#password")
            .await?
            .click()
            .await?
            .type_str(self.password.expose())
            .await?;
        page.find_element("button[type=submit]").await?.click().await?;
        page.wait_for_navigation().await?;
        Ok(())
    }

    async fn page_payload(page: &Page, url: &Url) -> FetchResult<RawPayload> {
        let body = page.content().await.map_err(|e| FetchError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(RawPayload::Html {
            url: url.to_string(),
            body,
        })
    }
}

#[async_trait]
impl Authenticator for BrowserDriver {
    async fn acquire(&self) -> Result<(), AuthError> {
        self.session.acquire().await.map_err(AuthError::Unavailable)
    }

    async fn release(&self) {
        self.session.release().await;
    }

    async fn verify(&self) -> FetchResult<bool> {
        let page = self.navigate(&self.url_for(FEED_PATH)?).await?;
        Ok(Self::shows_logged_in(&page).await)
    }

    async fn submit_credentials(&self) -> LoginAttempt {
        let login_url = match self.url_for(LOGIN_PATH) {
            Ok(url) => url,
            Err(e) => return LoginAttempt::Rejected(AuthError::Unavailable(e.to_string())),
        };
        let page = match self.navigate(&login_url).await {
            Ok(page) => page,
            Err(e) => return LoginAttempt::Rejected(AuthError::Unavailable(e.to_string())),
        };

        // A persisted profile may already be logged in; /login then bounces to the feed.
        if Self::shows_logged_in(&page).await {
            return LoginAttempt::Authenticated;
        }

        if !self.has_credentials() {
            tracing::info!("No credentials configured, please log in in the browser window");
            return LoginAttempt::ManualRequired;
        }

        if let Err(e) = self.fill_login_form(&page).await {
            tracing::warn!("Automated login form failed: {}", e);
            return LoginAttempt::ManualRequired;
        }

        let url = Self::current_url(&page).await;
        if url.contains("checkpoint") || url.contains("challenge") {
            tracing::info!("Login needs a verification step, waiting for the user");
            LoginAttempt::ManualRequired
        } else if Self::shows_logged_in(&page).await {
            LoginAttempt::Authenticated
        } else if url.contains(LOGIN_PATH) || url.contains("login-submit") {
            LoginAttempt::Rejected(AuthError::InvalidCredentials(
                "login form was returned after submit".to_string(),
            ))
        } else {
            LoginAttempt::ManualRequired
        }
    }

    async fn login_signal(&self) -> bool {
        match self.session.page().await {
            Ok(page) => Self::shows_logged_in(&page).await,
            Err(_) => false,
        }
    }

    fn token_expired(&self) -> bool {
        false
    }
}

#[async_trait]
impl PageSource for BrowserDriver {
    fn build_query(&self, filter: &SearchFilter) -> FetchResult<SearchQuery> {
        search_page_url(&self.base_url, filter)
            .map(SearchQuery::Url)
            .map_err(|e| FetchError::Navigation {
                url: self.base_url.to_string(),
                message: e.to_string(),
            })
    }

    async fn fetch_search_page(&self, query: &SearchQuery, page: u32) -> FetchResult<RawPayload> {
        let SearchQuery::Url(url) = query else {
            return Err(FetchError::Navigation {
                url: query.describe(page),
                message: "browser searches need a page URL".to_string(),
            });
        };

        let url = with_page(url, page);
        let tab = self.navigate(&url).await?;
        let landed = Self::current_url(&tab).await;
        if is_login_wall(&landed) {
            return Err(FetchError::Unauthorized {
                url: url.to_string(),
            });
        }
        Self::page_payload(&tab, &url).await
    }

    async fn fetch_profile(&self, profile: &str) -> FetchResult<RawPayload> {
        let target = canonical_profile_url(profile, Some(&self.base_url))
            .or_else(|| {
                member_id_from_reference(profile).and_then(|id| profile_url_from_member_id(&id))
            })
            .ok_or_else(|| FetchError::InvalidProfileUrl(profile.to_string()))?;
        let url = Url::parse(&target).map_err(|_| FetchError::InvalidProfileUrl(target.clone()))?;

        let tab = self.navigate(&url).await?;
        let landed = Self::current_url(&tab).await;
        if landed.contains("/404") || landed.contains("/in/unavailable") {
            return Err(FetchError::NotFound { url: target });
        }
        if is_login_wall(&landed) {
            return Err(FetchError::Unauthorized { url: target });
        }

        // Lower profile sections render lazily.
        if let Err(e) = tab
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
        {
            tracing::debug!("Scroll on {} failed: {}", target, e);
        }

        Self::page_payload(&tab, &url).await
    }
}
