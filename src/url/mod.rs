//! URL handling module for Profile-Harvester
//!
//! Profile URLs are the unique key of a search result set, so every URL that
//! enters the pipeline goes through this module first. It also converts between
//! profile URLs and the member identifiers the remote API expects.

mod member;
mod normalize;

// Re-export main functions
pub use member::{member_id_from_reference, profile_url_from_member_id};
pub use normalize::{canonical_profile_url, PLATFORM_HOST};
