//! Per-profile detail fetching
//!
//! Enrichment runs over a prefix of a result list. One failing profile is
//! recorded and skipped; only the action ceiling or a rejected session stops
//! the batch.

use std::time::Duration;

use serde::Serialize;

use super::{PageSource, RateLimiter};
use crate::extract::ResultExtractor;
use crate::model::{Profile, ProfileDetails};
use crate::{FetchError, HarvestError};

/// One profile that could not be enriched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentFailure {
    /// Position in the result list
    pub index: usize,
    pub profile_url: String,
    pub reason: String,
}

/// Summary of one enrichment batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentReport {
    /// Detail fetches started
    pub attempted: usize,
    /// Profiles that received details
    pub enriched: usize,
    pub failures: Vec<EnrichmentFailure>,
    /// Set when the action ceiling cut the batch short
    pub limit_hit: bool,
    /// Set when the platform rejected the session during the batch
    pub session_expired: bool,
}

/// Fetches and normalizes extended profile records
pub struct DetailFetcher<'a, S: PageSource + ?Sized> {
    source: &'a S,
    extractor: &'a ResultExtractor,
    limiter: &'a RateLimiter,
    request_timeout: Duration,
}

impl<'a, S: PageSource + ?Sized> DetailFetcher<'a, S> {
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

    /// Fetches one profile's extended record
    ///
    /// A payload that yields no field at all is reported as not found.
    pub async fn enrich(&self, profile_url: &str) -> Result<ProfileDetails, HarvestError> {
        self.limiter.gate().await?;

        let raw = tokio::time::timeout(self.request_timeout, self.source.fetch_profile(profile_url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: profile_url.to_string(),
            })??;

        let details = self.extractor.parse_detail(&raw);
        if details.is_empty() {
            return Err(FetchError::NotFound {
                url: profile_url.to_string(),
            }
            .into());
        }
        Ok(details)
    }

    /// Enriches the first `max` profiles in order
    ///
    /// Profiles that already carry details are skipped. Failures leave the
    /// profile without details and are listed in the report. An unauthorized
    /// response ends the batch.
    pub async fn enrich_prefix(&self, profiles: &mut [Profile], max: usize) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();
        let count = max.min(profiles.len());

        for (index, profile) in profiles.iter_mut().take(count).enumerate() {
            if profile.has_details() {
                continue;
            }

            report.attempted += 1;
            match self.enrich(&profile.profile_url).await {
                Ok(details) => {
                    if profile.attach_details(details).is_ok() {
                        report.enriched += 1;
                    }
                }
                Err(HarvestError::LimitExceeded(e)) => {
                    report.attempted -= 1;
                    report.limit_hit = true;
                    tracing::warn!("Stopping enrichment at profile {}: {}", index, e);
                    break;
                }
                Err(e @ HarvestError::Fetch(FetchError::Unauthorized { .. })) => {
                    tracing::warn!("Stopping enrichment at profile {}: {}", index, e);
                    report.session_expired = true;
                    report.failures.push(EnrichmentFailure {
                        index,
                        profile_url: profile.profile_url.clone(),
                        reason: e.to_string(),
                    });
                    break;
                }
                Err(e) => {
                    tracing::warn!("Could not enrich {}: {}", profile.profile_url, e);
                    report.failures.push(EnrichmentFailure {
                        index,
                        profile_url: profile.profile_url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Enriched {} of {} profiles ({} failed)",
            report.enriched,
            report.attempted,
            report.failures.len()
        );
        report
    }
}
