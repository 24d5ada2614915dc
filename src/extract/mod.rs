//! Result extraction for Profile-Harvester
//!
//! Turns raw backend payloads (rendered HTML or decoded JSON) into canonical
//! `Profile` and `ProfileDetails` records. Both strategies go through the
//! same [`ResultExtractor`]; only the mapping table differs.

mod html;
mod json;
mod mapping;

pub use json::lookup;
pub use mapping::{HtmlMapping, JsonMapping};

use serde_json::Value;

use crate::model::{Profile, ProfileDetails};
use crate::ConfigError;
use html::HtmlSelectors;

/// One page or one profile as returned by a backend, before extraction
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Rendered document together with the URL it was loaded from
    Html { url: String, body: String },
    Json(Value),
}

/// Records extracted from one search page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    pub profiles: Vec<Profile>,
    /// Records skipped for lacking a name or profile URL
    pub dropped: usize,
    /// Whether the payload advertises another page
    pub has_next: bool,
}

/// Maps raw payloads to canonical records
#[derive(Debug, Clone)]
pub struct ResultExtractor {
    html: HtmlSelectors,
    json: JsonMapping,
}

impl ResultExtractor {
    /// Builds an extractor, compiling every selector up front
    pub fn new(html: &HtmlMapping, json: &JsonMapping) -> Result<Self, ConfigError> {
        let html = HtmlSelectors::compile(html).map_err(ConfigError::InvalidSelector)?;
        json.validate().map_err(ConfigError::Validation)?;
        Ok(Self {
            html,
            json: json.clone(),
        })
    }

    /// Extracts the result records of one search page
    pub fn parse_page(&self, raw: &RawPayload) -> ParsedPage {
        let page = match raw {
            RawPayload::Html { url, body } => self.html.parse_search(body, url),
            RawPayload::Json(value) => self.json.parse_search(value),
        };

        if page.dropped > 0 {
            tracing::debug!(
                "Extracted {} records, dropped {} incomplete",
                page.profiles.len(),
                page.dropped
            );
        }
        page
    }

    /// Extracts the extended record of one profile
    ///
    /// Missing sections come back empty; an entirely empty result means the
    /// payload did not describe a profile.
    pub fn parse_detail(&self, raw: &RawPayload) -> ProfileDetails {
        match raw {
            RawPayload::Html { body, .. } => self.html.parse_profile(body),
            RawPayload::Json(value) => self.json.parse_detail(value),
        }
    }
}
