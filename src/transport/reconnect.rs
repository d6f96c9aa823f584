//! Reconnect policy and timer.
//!
//! Fixed interval, bounded attempts. The counter is reset only by a
//! successful open; at most one timer is pending at a time.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Fixed-interval, bounded reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before each attempt.
    pub interval: Duration,
    /// Attempts allowed since the last successful open.
    pub max_attempts: u32,
}

// ============================================================================
// Reconnector
// ============================================================================

/// Attempt counter plus the single pending reconnect timer.
#[derive(Debug)]
pub struct Reconnector {
    policy: ReconnectPolicy,
    attempts: u32,
    timer: Option<JoinHandle<()>>,
}

impl Reconnector {
    /// Creates a reconnector with no attempts made.
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            timer: None,
        }
    }

    /// Attempts made since the last successful open.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns `true` once the attempt budget is spent.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    /// Returns the policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// Counts a new attempt, returning its 1-based number, or `None` if
    /// the budget is spent.
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    /// Resets the counter after a successful open.
    #[inline]
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Runs `attempt` after the policy interval, replacing any pending timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, attempt: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let delay = self.policy.interval;
        self.timer = Some(tokio::spawn(async move {
            sleep(delay).await;
            attempt.await;
        }));
    }

    /// Cancels the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Returns `true` while a timer is waiting to fire.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Reconnector {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            interval: Duration::from_millis(100),
            max_attempts,
        }
    }

    #[test]
    fn test_attempts_are_bounded() {
        let mut reconnector = Reconnector::new(policy(3));
        assert_eq!(reconnector.next_attempt(), Some(1));
        assert_eq!(reconnector.next_attempt(), Some(2));
        assert_eq!(reconnector.next_attempt(), Some(3));
        assert_eq!(reconnector.next_attempt(), None);
        assert!(reconnector.is_exhausted());
        assert_eq!(reconnector.attempts(), 3);
    }

    #[test]
    fn test_reset_restores_budget() {
        let mut reconnector = Reconnector::new(policy(1));
        assert_eq!(reconnector.next_attempt(), Some(1));
        assert_eq!(reconnector.next_attempt(), None);

        reconnector.reset();
        assert_eq!(reconnector.attempts(), 0);
        assert_eq!(reconnector.next_attempt(), Some(1));
    }

    #[test]
    fn test_zero_budget_never_attempts() {
        let mut reconnector = Reconnector::new(policy(0));
        assert_eq!(reconnector.next_attempt(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_after_interval() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut reconnector = Reconnector::new(policy(3));

        let counter = Arc::clone(&fired);
        reconnector.schedule(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(reconnector.is_pending());

        sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!reconnector.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut reconnector = Reconnector::new(policy(3));

        for _ in 0..3 {
            let counter = Arc::clone(&fired);
            reconnector.schedule(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_attempt() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut reconnector = Reconnector::new(policy(3));

        let counter = Arc::clone(&fired);
        reconnector.schedule(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        reconnector.cancel();
        reconnector.cancel();

        sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!reconnector.is_pending());
    }
}
