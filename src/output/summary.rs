//! Human-readable run summaries

use std::fmt;

use crate::backend::SearchOutcome;
use crate::crawler::StopReason;

/// Plain-text report of one search outcome
pub struct Summary<'a>(pub &'a SearchOutcome);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;

        writeln!(f, "=== Search Summary ===\n")?;
        writeln!(f, "Profiles found: {}", outcome.profiles.len())?;
        writeln!(f, "Pages fetched: {}", outcome.pages_fetched)?;
        writeln!(f, "Rate-limited actions: {}", outcome.actions)?;
        if outcome.dropped > 0 {
            writeln!(f, "Incomplete records skipped: {}", outcome.dropped)?;
        }
        writeln!(f, "Stopped: {}", describe_stop(&outcome.stop))?;

        if let Some(report) = &outcome.enrichment {
            writeln!(f, "\nDetails: {} of {} enriched", report.enriched, report.attempted)?;
            if report.limit_hit {
                writeln!(f, "  Action ceiling reached before all details were fetched")?;
            }
            if report.session_expired {
                writeln!(f, "  Session was rejected before all details were fetched")?;
            }
            for failure in &report.failures {
                writeln!(
                    f,
                    "  #{} {}: {}",
                    failure.index + 1,
                    failure.profile_url,
                    failure.reason
                )?;
            }
        }

        if !outcome.profiles.is_empty() {
            writeln!(f, "\nProfiles:")?;
            for (i, profile) in outcome.profiles.iter().enumerate() {
                let marker = if profile.has_details() { "*" } else { " " };
                writeln!(
                    f,
                    "{}{:>3}. {} | {} | {} | {}",
                    marker,
                    i + 1,
                    profile.name,
                    profile.title,
                    profile.location,
                    profile.profile_url
                )?;
            }
        }

        Ok(())
    }
}

/// Formats a search outcome as a plain-text report
pub fn format_summary(outcome: &SearchOutcome) -> String {
    Summary(outcome).to_string()
}

/// Prints a search outcome to stdout
pub fn print_summary(outcome: &SearchOutcome) {
    print!("{}", Summary(outcome));
}

fn describe_stop(stop: &StopReason) -> String {
    match stop {
        StopReason::ReachedMax => "requested number of results reached".to_string(),
        StopReason::Exhausted => "no more result pages".to_string(),
        StopReason::Stalled => "result pages stopped yielding new profiles".to_string(),
        StopReason::FetchFailed(reason) => {
            format!("page fetch failed ({}), results are partial", reason)
        }
        StopReason::SessionExpired(reason) => {
            format!("session rejected ({}), results are partial", reason)
        }
        StopReason::LimitExceeded => "action ceiling reached, results are partial".to_string(),
    }
}
