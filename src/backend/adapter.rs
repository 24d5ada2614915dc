use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use super::{Backend, BackendKind, SearchOutcome};
use crate::crawler::{
    CrawlOutcome, DetailFetcher, PageSource, RateLimitPolicy, RateLimiter, SearchCrawler,
    StopReason,
};
use crate::extract::ResultExtractor;
use crate::model::{AuthStatus, ProfileDetails, SearchFilter};
use crate::session::{Authenticator, LoginPolicy, SessionManager};
use crate::{FetchError, HarvestError, Result};

/// The one `Backend` implementation, generic over a strategy driver
///
/// The driver supplies authentication and raw pages; the adapter owns the
/// session state, the extractor and the pacing, so every strategy honors the
/// same contracts.
pub struct Adapter<D> {
    kind: BackendKind,
    session: SessionManager<D>,
    extractor: ResultExtractor,
    limiter: RateLimiter,
    request_timeout: Duration,
    call_lock: Option<Mutex<()>>,
}

impl<D: Authenticator + PageSource> Adapter<D> {
    pub fn new(
        kind: BackendKind,
        driver: D,
        extractor: ResultExtractor,
        rate_limit: RateLimitPolicy,
        login: LoginPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            kind,
            session: SessionManager::new(driver, login),
            extractor,
            limiter: RateLimiter::new(rate_limit),
            request_timeout,
            call_lock: None,
        }
    }

    /// Makes concurrent calls wait for the call in flight
    ///
    /// Needed when the driver's resource cannot serve two navigations at once.
    pub fn serialized(mut self) -> Self {
        self.call_lock = Some(Mutex::new(()));
        self
    }

    pub fn session(&self) -> &SessionManager<D> {
        &self.session
    }

    async fn lock_calls(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.call_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    async fn ensure_ready(&self) -> Result<()> {
        self.session.acquire().await?;
        self.session.ensure_authenticated().await?;
        Ok(())
    }
}

#[async_trait]
impl<D> Backend for Adapter<D>
where
    D: Authenticator + PageSource + 'static,
{
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn initialize(&self) -> Result<()> {
        let _call = self.lock_calls().await;
        tracing::info!("Initializing {} backend", self.kind);
        self.ensure_ready().await
    }

    async fn search(&self, filter: &SearchFilter) -> Result<SearchOutcome> {
        let _call = self.lock_calls().await;
        self.ensure_ready().await?;

        let limiter = self.limiter.for_run();
        let driver = self.session.authenticator();

        let CrawlOutcome {
            mut profiles,
            pages_fetched,
            dropped,
            stop,
        } = SearchCrawler::new(driver, &self.extractor, &limiter, self.request_timeout)
            .run(filter)
            .await;

        let mut session_lost = matches!(stop, StopReason::SessionExpired(_));
        let budget = if session_lost {
            0
        } else {
            filter.detail_budget(profiles.len())
        };
        let enrichment = if budget > 0 {
            let fetcher =
                DetailFetcher::new(driver, &self.extractor, &limiter, self.request_timeout);
            let report = fetcher.enrich_prefix(&mut profiles, budget).await;
            session_lost |= report.session_expired;
            Some(report)
        } else {
            None
        };
        if session_lost {
            self.session.mark_expired();
        }

        Ok(SearchOutcome {
            profiles,
            pages_fetched,
            dropped,
            stop,
            enrichment,
            actions: limiter.actions_taken(),
        })
    }

    async fn detail(&self, profile: &str) -> Result<ProfileDetails> {
        let _call = self.lock_calls().await;
        self.ensure_ready().await?;

        let limiter = self.limiter.for_run();
        let fetcher = DetailFetcher::new(
            self.session.authenticator(),
            &self.extractor,
            &limiter,
            self.request_timeout,
        );

        let result = fetcher.enrich(profile).await;
        if let Err(HarvestError::Fetch(FetchError::Unauthorized { .. })) = &result {
            self.session.mark_expired();
        }
        result
    }

    async fn auth_status(&self) -> AuthStatus {
        self.session.auth_status()
    }

    async fn shutdown(&self) {
        let _call = self.lock_calls().await;
        tracing::info!("Shutting down {} backend", self.kind);
        self.session.release().await;
    }
}
