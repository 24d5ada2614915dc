//! Data model shared by every stage of the pipeline
//!
//! - `SearchRequest`: the loosely typed caller input
//! - `SearchFilter`: the validated, immutable filter built from a request
//! - `Profile` / `ProfileDetails`: the canonical output shape, identical for
//!   every backend
//! - `SearchResponse` / `AuthStatus`: shapes handed back to callers

mod filter;
mod profile;
mod request;

pub use filter::{
    ConnectionDegree, ExperienceLevel, SearchFilter, DEFAULT_MAX_DETAILED, DEFAULT_MAX_RESULTS,
    MAX_DETAILED_LIMIT, MAX_RESULTS_LIMIT,
};
pub use profile::{Education, Experience, Profile, ProfileDetails};
pub use request::SearchRequest;

use serde::Serialize;

/// Response returned to callers of a search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub filters: SearchFilter,
    pub profiles: Vec<Profile>,
}

impl SearchResponse {
    pub fn new(filters: SearchFilter, profiles: Vec<Profile>) -> Self {
        Self {
            count: profiles.len(),
            filters,
            profiles,
        }
    }
}

/// Authentication status as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub token_expired: bool,
}
