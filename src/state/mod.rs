//! State module for tracking session progress
//!
//! This module defines the authentication state machine shared by both
//! acquisition strategies.
//!
//! # Components
//!
//! - `SessionState`: where a backend's session currently stands (unauthenticated,
//!   waiting on a manual login, authenticated, expired) and which moves are legal

mod session_state;

// Re-export main types
pub use session_state::SessionState;
