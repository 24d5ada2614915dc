//! Action pacing for one acquisition session
//!
//! Every page load, API request and detail fetch passes through
//! [`RateLimiter::gate`], which enforces a fixed delay between consecutive
//! actions and a hard ceiling on the number of actions in one run.

use crate::LimitExceeded;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default delay between two gated actions
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(2000);

/// Default action ceiling for one run
pub const DEFAULT_MAX_ACTIONS: u32 = 100;

/// Pacing policy, read-only once built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Minimum time between the start of two consecutive actions
    pub request_delay: Duration,

    /// Actions allowed before `gate` reports `LimitExceeded`
    pub max_actions_per_session: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            request_delay: DEFAULT_REQUEST_DELAY,
            max_actions_per_session: DEFAULT_MAX_ACTIONS,
        }
    }
}

/// Gate keeper for rate-limited actions
///
/// The inter-action clock is shared by every limiter derived with
/// [`for_run`](Self::for_run); the action count is not. Waiting callers
/// queue on the clock's mutex, so spacing also holds across concurrent runs.
#[derive(Debug)]
pub struct RateLimiter {
    policy: Arc<RateLimitPolicy>,
    last_action: Arc<Mutex<Option<Instant>>>,
    actions: AtomicU32,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
            last_action: Arc::new(Mutex::new(None)),
            actions: AtomicU32::new(0),
        }
    }

    /// Derives a limiter for one pipeline run
    ///
    /// The new limiter starts with a zero action count but keeps pacing
    /// relative to the last action of any sibling limiter.
    pub fn for_run(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            last_action: Arc::clone(&self.last_action),
            actions: AtomicU32::new(0),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Waits until the next action is permitted and records it
    ///
    /// Returns `LimitExceeded` without waiting once the ceiling is reached.
    pub async fn gate(&self) -> Result<(), LimitExceeded> {
        let mut last = self.last_action.lock().await;

        let limit = self.policy.max_actions_per_session;
        self.actions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < limit).then_some(n + 1)
            })
            .map_err(|_| LimitExceeded { limit })?;

        if let Some(previous) = *last {
            let ready_at = previous + self.policy.request_delay;
            if Instant::now() < ready_at {
                tracing::trace!(
                    "Rate limiter waiting {:?}",
                    ready_at.saturating_duration_since(Instant::now())
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
        Ok(())
    }

    /// Records an action that did not pass through `gate`
    ///
    /// It counts toward the ceiling and restarts the delay clock.
    pub async fn record_action(&self) {
        let mut last = self.last_action.lock().await;
        self.actions.fetch_add(1, Ordering::SeqCst);
        *last = Some(Instant::now());
    }

    pub fn actions_taken(&self) -> u32 {
        self.actions.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> u32 {
        self.policy
            .max_actions_per_session
            .saturating_sub(self.actions_taken())
    }
}
