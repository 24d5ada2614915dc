use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::{Authenticator, LoginAttempt};
use crate::model::AuthStatus;
use crate::state::SessionState;
use crate::AuthError;

/// Default interval between manual-login checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default time to wait for a manual login
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Timing of the manual-login wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}

/// Owner of one session resource and its authentication state
///
/// The manager never persists anything. Concurrent `ensure_authenticated`
/// calls are serialized so only one login runs at a time; callers that waited
/// re-check the state the winner left behind.
pub struct SessionManager<A> {
    auth: A,
    state: RwLock<SessionState>,
    login_lock: tokio::sync::Mutex<()>,
    policy: LoginPolicy,
}

impl<A: Authenticator> SessionManager<A> {
    pub fn new(auth: A, policy: LoginPolicy) -> Self {
        Self {
            auth,
            state: RwLock::new(SessionState::Unauthenticated),
            login_lock: tokio::sync::Mutex::new(()),
            policy,
        }
    }

    pub fn authenticator(&self) -> &A {
        &self.auth
    }

    pub fn current_state(&self) -> SessionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn auth_status(&self) -> AuthStatus {
        AuthStatus {
            authenticated: self.current_state().is_authenticated(),
            token_expired: self.auth.token_expired(),
        }
    }

    /// Opens the session resource
    pub async fn acquire(&self) -> Result<(), AuthError> {
        self.auth.acquire().await
    }

    /// Closes the session resource and starts over from `Unauthenticated`
    pub async fn release(&self) {
        let _guard = self.login_lock.lock().await;
        self.auth.release().await;
        self.reset();
    }

    /// Starts a new lifecycle at `Unauthenticated`
    ///
    /// Only valid after the resource is closed; it bypasses the transition
    /// rules of the released session.
    fn reset(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != SessionState::Unauthenticated {
            tracing::debug!("Session state {} reset on release", *state);
        }
        *state = SessionState::Unauthenticated;
    }

    /// Moves a live session to `Expired` after the platform rejected it
    pub fn mark_expired(&self) {
        if self.current_state().is_authenticated() {
            if let Err(e) = self.transition(SessionState::Expired) {
                tracing::warn!("{}", e);
            }
        }
    }

    /// Makes sure the session is live, logging in if needed
    ///
    /// A live session is re-verified first; a failed check (including a
    /// network error during the check) expires it and triggers a new login.
    pub async fn ensure_authenticated(&self) -> Result<(), AuthError> {
        let _guard = self.login_lock.lock().await;

        if self.current_state().is_authenticated() {
            match self.auth.verify().await {
                Ok(true) => return Ok(()),
                Ok(false) => tracing::info!("Session verification failed, session expired"),
                Err(e) => tracing::warn!("Session check failed, treating as expired: {}", e),
            }
            self.transition(SessionState::Expired)?;
        }

        self.login().await
    }

    async fn login(&self) -> Result<(), AuthError> {
        if self.current_state() == SessionState::Expired {
            self.transition(SessionState::PendingManualLogin)?;
        }

        tracing::info!("Attempting automated login");
        match self.auth.submit_credentials().await {
            LoginAttempt::Authenticated => {
                self.transition(SessionState::Authenticated)?;
                tracing::info!("Login succeeded");
                Ok(())
            }
            LoginAttempt::Rejected(e) => {
                tracing::warn!("Login rejected: {}", e);
                Err(e)
            }
            LoginAttempt::ManualRequired => {
                self.transition(SessionState::PendingManualLogin)?;
                self.wait_for_manual_login().await?;
                self.transition(SessionState::Authenticated)?;
                tracing::info!("Manual login completed");
                Ok(())
            }
        }
    }

    async fn wait_for_manual_login(&self) -> Result<(), AuthError> {
        let LoginPolicy {
            poll_interval,
            timeout,
        } = self.policy;
        tracing::info!(
            "Waiting up to {:?} for manual login, checking every {:?}",
            timeout,
            poll_interval
        );

        let poll = async {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if self.auth.login_signal().await {
                    return;
                }
                tracing::debug!("Still waiting for manual login");
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| AuthError::Timeout { waited: timeout })
    }

    fn transition(&self, next: SessionState) -> Result<(), AuthError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.can_transition_to(next) {
            return Err(AuthError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        if *state != next {
            tracing::debug!("Session state {} -> {}", *state, next);
        }
        *state = next;
        Ok(())
    }
}
