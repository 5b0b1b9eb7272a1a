//! Fixed-backoff convergence polling.
//!
//! The rendering surface's viewport setter is idempotent but racy: an
//! auto-fit pass may overwrite an assignment that happened moments
//! earlier. Instead of a stack of hardcoded timeouts, callers describe
//! the reapplication as a [`RetryPolicy`] and let
//! [`converge_on`](RetryPolicy::converge_on) drive it: apply, wait,
//! check, until the check holds or attempts run out.

use std::time::Duration;

/// A bounded reapplication schedule with a success check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Number of apply attempts before giving up.
    pub attempts: u32,
    /// Fixed pause between apply and check.
    pub backoff: Duration,
    /// Coordinate tolerance for equality checks driven by this policy.
    pub tolerance: f64,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(attempts: u32, backoff: Duration, tolerance: f64) -> Self {
        Self {
            attempts,
            backoff,
            tolerance,
        }
    }

    /// Repeatedly apply an assignment to `subject` until `check`
    /// confirms it stuck.
    ///
    /// Returns `true` when the check passed, `false` when every attempt
    /// was exhausted. The final state is whatever the last apply left
    /// behind; callers treat `false` as best-effort and log it.
    pub async fn converge_on<T, A, C>(&self, subject: &mut T, mut apply: A, check: C) -> bool
    where
        T: ?Sized,
        A: FnMut(&mut T),
        C: Fn(&T) -> bool,
    {
        for attempt in 0..self.attempts.max(1) {
            apply(subject);
            if !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff).await;
            }
            if check(subject) {
                return true;
            }
            tracing::trace!(attempt, "convergence check failed, reapplying");
        }
        false
    }

    /// Whether `actual` is within this policy's tolerance of `target`.
    #[must_use]
    pub fn within_tolerance(&self, target: f64, actual: f64) -> bool {
        (target - actual).abs() <= self.tolerance
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(25),
            tolerance: 1.0,
        }
    }
}
