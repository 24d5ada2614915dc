/// Session state definitions for tracking authentication progress
///
/// This module defines all possible states a backend session can be in.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a backend session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// No session has been established yet
    Unauthenticated,

    /// Automated login could not finish; waiting for a human to complete it
    PendingManualLogin,

    /// Session is live and was verified
    Authenticated,

    /// A previously live session failed re-verification
    Expired,
}

impl SessionState {
    /// Position of this state along the forward path
    fn rank(&self) -> u8 {
        match self {
            Self::Unauthenticated => 0,
            Self::PendingManualLogin => 1,
            Self::Authenticated => 2,
            Self::Expired => 3,
        }
    }

    /// Returns true if moving from this state to `next` is legal
    ///
    /// Transitions only move forward, with two exceptions: a live session may
    /// expire, and an expired session may go back to waiting for a login.
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        if *self == next {
            return true;
        }

        match (self, next) {
            (Self::Authenticated, Self::Expired) => true,
            (Self::Expired, Self::PendingManualLogin) => true,
            (Self::Expired, _) => false,
            _ => next.rank() > self.rank(),
        }
    }

    /// Returns true if the session can be used for fetching
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Converts the state to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PendingManualLogin => "pending_manual_login",
            Self::Authenticated => "authenticated",
            Self::Expired => "expired",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Unauthenticated
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
