//! Paginated search crawl
//!
//! Drives one search through successive result pages until the requested
//! count is reached or the backend runs out of pages. Fetch failures end the
//! crawl early but never discard what was already collected.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use super::{PageSource, RateLimiter};
use crate::extract::ResultExtractor;
use crate::model::{Profile, SearchFilter};
use crate::FetchError;

/// Why a crawl stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason", content = "message")]
pub enum StopReason {
    /// `max_results` unique profiles were collected
    ReachedMax,
    /// The last page advertised no further page
    Exhausted,
    /// A page came back empty, or held only profiles already collected,
    /// while still claiming a next page
    Stalled,
    /// A page fetch failed or timed out
    FetchFailed(String),
    /// The platform rejected the session mid-crawl
    SessionExpired(String),
    /// The rate limiter's action ceiling was reached
    LimitExceeded,
}

impl StopReason {
    /// Returns true if the crawl ended without any error condition
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::ReachedMax | Self::Exhausted)
    }
}

/// Result of one crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlOutcome {
    /// Unique profiles in platform order, at most `max_results` of them
    pub profiles: Vec<Profile>,
    pub pages_fetched: u32,
    /// Records dropped by the extractor across all pages
    pub dropped: usize,
    pub stop: StopReason,
}

/// Runs paginated searches against one page source
pub struct SearchCrawler<'a, S: PageSource + ?Sized> {
    source: &'a S,
    extractor: &'a ResultExtractor,
    limiter: &'a RateLimiter,
    request_timeout: Duration,
}

impl<'a, S: PageSource + ?Sized> SearchCrawler<'a, S> {
    pub fn new(
        source: &'a S,
        extractor: &'a ResultExtractor,
        limiter: &'a RateLimiter,
        request_timeout: Duration,
    ) -> Self {
        Self {
            source,
            extractor,
            limiter,
            request_timeout,
        }
    }

    /// Collects up to `filter.max_results()` unique profiles
    ///
    /// Pages are fetched strictly one after another, each behind the rate
    /// limiter. The loop ends on the first of: enough profiles, no next page,
    /// an empty or repeated page, a failed fetch, a rejected session, or the
    /// action ceiling.
    pub async fn run(&self, filter: &SearchFilter) -> CrawlOutcome {
        let max = filter.max_results() as usize;
        let mut outcome = CrawlOutcome {
            profiles: Vec::with_capacity(max),
            pages_fetched: 0,
            dropped: 0,
            stop: StopReason::Exhausted,
        };

        let query = match self.source.build_query(filter) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!("Could not build search query: {}", e);
                outcome.stop = StopReason::FetchFailed(e.to_string());
                return outcome;
            }
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut page: u32 = 0;

        outcome.stop = loop {
            if let Err(e) = self.limiter.gate().await {
                tracing::warn!("Stopping search after {} pages: {}", outcome.pages_fetched, e);
                break StopReason::LimitExceeded;
            }

            tracing::debug!("Fetching search page {} ({})", page + 1, query.describe(page));
            let fetched = tokio::time::timeout(
                self.request_timeout,
                self.source.fetch_search_page(&query, page),
            )
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout {
                    url: query.describe(page),
                })
            });

            let raw = match fetched {
                Ok(raw) => raw,
                Err(e @ FetchError::Unauthorized { .. }) => {
                    tracing::warn!(
                        "Session rejected on search page {}, keeping {} profiles: {}",
                        page + 1,
                        outcome.profiles.len(),
                        e
                    );
                    break StopReason::SessionExpired(e.to_string());
                }
                Err(e) => {
                    tracing::warn!(
                        "Search page {} failed, keeping {} profiles: {}",
                        page + 1,
                        outcome.profiles.len(),
                        e
                    );
                    break StopReason::FetchFailed(e.to_string());
                }
            };
            outcome.pages_fetched += 1;

            let parsed = self.extractor.parse_page(&raw);
            outcome.dropped += parsed.dropped;

            let before = outcome.profiles.len();
            let records = parsed.profiles.len() + parsed.dropped;
            for profile in parsed.profiles {
                if outcome.profiles.len() >= max {
                    break;
                }
                if seen.insert(profile.profile_url.clone()) {
                    outcome.profiles.push(profile);
                }
            }
            let added = outcome.profiles.len() - before;
            tracing::debug!(
                "Page {} added {} profiles ({} total)",
                page + 1,
                added,
                outcome.profiles.len()
            );

            if outcome.profiles.len() >= max {
                break StopReason::ReachedMax;
            }
            if !parsed.has_next {
                break StopReason::Exhausted;
            }
            // Dropped-only pages advance; empty or fully repeated pages stall.
            if records == 0 || (added == 0 && records > parsed.dropped) {
                tracing::warn!("Page {} added no new profiles, stopping", page + 1);
                break StopReason::Stalled;
            }
            page += 1;
        };

        tracing::info!(
            "Search finished with {} profiles from {} pages ({:?})",
            outcome.profiles.len(),
            outcome.pages_fetched,
            outcome.stop
        );
        outcome
    }
}
