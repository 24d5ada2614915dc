//! Session module for authentication management
//!
//! A [`SessionManager`] owns one backend's session resource through an
//! [`Authenticator`] and drives it through the `SessionState` machine:
//! cheap re-verification of live sessions, automated credential submission,
//! and a bounded wait for manual login when automation cannot finish.

mod manager;

pub use manager::{LoginPolicy, SessionManager, DEFAULT_LOGIN_TIMEOUT, DEFAULT_POLL_INTERVAL};

use async_trait::async_trait;

use crate::{AuthError, FetchResult};

/// Outcome of one automated login attempt
#[derive(Debug)]
pub enum LoginAttempt {
    /// The session is live
    Authenticated,
    /// Automation cannot finish; a human has to complete the login
    ManualRequired,
    /// The platform refused the credentials or token
    Rejected(AuthError),
}

/// Strategy-specific access to a session resource
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Opens the underlying resource (browser, HTTP client); idempotent
    async fn acquire(&self) -> Result<(), AuthError>;

    /// Closes the underlying resource
    async fn release(&self);

    /// Low-cost check that the session is still live
    async fn verify(&self) -> FetchResult<bool>;

    /// Tries to log in without human help
    async fn submit_credentials(&self) -> LoginAttempt;

    /// Checks whether a manual login has completed, without navigating away
    async fn login_signal(&self) -> bool;

    /// Returns true if a known credential expiry has passed
    fn token_expired(&self) -> bool;
}
