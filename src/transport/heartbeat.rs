//! Heartbeat ticker.
//!
//! Runs only while a connection is open. The transport starts one on
//! open and stops it on close; dropping the handle also stops it.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, trace};

// ============================================================================
// Constants
// ============================================================================

/// Shortest interval the ticker accepts.
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// Heartbeat
// ============================================================================

/// Handle to a running heartbeat task.
#[derive(Debug)]
pub struct Heartbeat {
    task: JoinHandle<()>,
    interval: Duration,
}

impl Heartbeat {
    /// Spawns a ticker calling `tick` every `interval`, first after one interval.
    ///
    /// The task ends when `tick` returns `false` or the handle is stopped.
    /// Intervals below [`MIN_HEARTBEAT_INTERVAL`] are raised to it.
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        if interval < MIN_HEARTBEAT_INTERVAL {
            error!(
                interval_ms = interval.as_millis() as u64,
                "Heartbeat interval too short, clamping"
            );
        }
        let interval = interval.max(MIN_HEARTBEAT_INTERVAL);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !tick() {
                    trace!("Heartbeat owner gone, ticker exiting");
                    break;
                }
            }
        });

        Self { task, interval }
    }

    /// Configured interval.
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` while the ticker task is alive.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels the ticker.
    #[inline]
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
