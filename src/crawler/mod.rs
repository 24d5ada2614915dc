//! Crawler module for paginated search and detail fetching
//!
//! This module contains the acquisition pipeline that sits between a session
//! and the extractor:
//! - Rate limiting of every backend action
//! - Paginated search crawling with deduplication
//! - Prefix enrichment of result lists with profile details
//!
//! Backends plug in through the [`PageSource`] trait.

mod detail;
mod rate_limiter;
mod search;

pub use detail::{DetailFetcher, EnrichmentFailure, EnrichmentReport};
pub use rate_limiter::{RateLimitPolicy, RateLimiter, DEFAULT_MAX_ACTIONS, DEFAULT_REQUEST_DELAY};
pub use search::{CrawlOutcome, SearchCrawler, StopReason};

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::extract::RawPayload;
use crate::model::SearchFilter;
use crate::FetchResult;

/// Backend-specific form of a search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// Search page URL; the page number is added per fetch
    Url(Url),
    /// Request body; paging fields are added per fetch
    Body(Value),
}

impl SearchQuery {
    /// Short description of one page of this query, for logs and errors
    pub fn describe(&self, page: u32) -> String {
        match self {
            Self::Url(url) => format!("{} (page {})", url, page + 1),
            Self::Body(_) => format!("search request (page {})", page + 1),
        }
    }
}

/// Source of raw search pages and profile payloads
///
/// Implementations perform exactly one navigation or request per fetch call
/// and never pace themselves; pacing is the caller's job.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Translates a filter into a query, omitting every absent filter field
    fn build_query(&self, filter: &SearchFilter) -> FetchResult<SearchQuery>;

    /// Fetches one zero-based page of search results
    async fn fetch_search_page(&self, query: &SearchQuery, page: u32) -> FetchResult<RawPayload>;

    /// Fetches the page or record for one profile URL or member id
    async fn fetch_profile(&self, profile: &str) -> FetchResult<RawPayload>;
}
