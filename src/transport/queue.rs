//! Outbound frame queue.
//!
//! Holds frames submitted while the socket is not open. Strict FIFO; the
//! queue is drained once per successful open.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::collections::vec_deque::Drain;

use crate::config::OverflowPolicy;
use crate::protocol::Frame;

// ============================================================================
// PushOutcome
// ============================================================================

/// Result of [`OutboundQueue::push`].
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// Frame appended.
    Queued,
    /// Frame appended after evicting the oldest one.
    DroppedOldest(Frame),
    /// Queue full, frame refused.
    Rejected(Frame),
}

// ============================================================================
// OutboundQueue
// ============================================================================

/// FIFO buffer of frames awaiting an open connection.
#[derive(Debug, Clone, Default)]
pub struct OutboundQueue {
    frames: VecDeque<Frame>,
    capacity: Option<usize>,
    policy: OverflowPolicy,
}

impl OutboundQueue {
    /// Creates a queue. `None` capacity means unbounded.
    #[must_use]
    pub fn new(capacity: Option<usize>, policy: OverflowPolicy) -> Self {
        Self {
            frames: VecDeque::new(),
            capacity,
            policy,
        }
    }

    /// Appends a frame, applying the overflow policy if full.
    pub fn push(&mut self, frame: Frame) -> PushOutcome {
        let Some(capacity) = self.capacity else {
            self.frames.push_back(frame);
            return PushOutcome::Queued;
        };

        if self.frames.len() < capacity {
            self.frames.push_back(frame);
            return PushOutcome::Queued;
        }

        match self.policy {
            OverflowPolicy::RejectNew => PushOutcome::Rejected(frame),
            OverflowPolicy::DropOldest => {
                let evicted = self.frames.pop_front();
                self.frames.push_back(frame);
                match evicted {
                    Some(old) => PushOutcome::DroppedOldest(old),
                    None => PushOutcome::Queued,
                }
            }
        }
    }

    /// Removes and yields every queued frame in submission order.
    pub fn drain(&mut self) -> Drain<'_, Frame> {
        self.frames.drain(..)
    }

    /// Number of queued frames.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Configured capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

// ============================================================================
// Tests
// ============================================================================
