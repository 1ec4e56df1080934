//! # Runtime events emitted by the arbiter, producers and service.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Render events**: what the arbiter did with the display
//! - **Producer events**: fetch results, coalesced pushes, ignored triggers
//! - **Shutdown events**: signal observed, grace outcome
//! - **Subscriber events**: overflow and panics inside subscribers
//!
//! The [`Event`] struct carries optional metadata (source, reason, attempt, delay).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use quotetower::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RenderFailed)
//!     .with_source("refresh")
//!     .with_reason("render rejected by display: busy");
//!
//! assert_eq!(ev.kind, EventKind::RenderFailed);
//! assert_eq!(ev.source.as_deref(), Some("refresh"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Render events ===
    /// Content was rendered (refresh event or post-reveal restore).
    ///
    /// Sets:
    /// - `source`: `"refresh"` or `"restore"`
    ContentRendered,

    /// A display call sequence failed and was abandoned.
    ///
    /// Sets:
    /// - `source`: event kind being handled (`"refresh"`, `"reveal"`, `"restore"`)
    /// - `reason`: display error
    RenderFailed,

    /// A reveal sequence started.
    ///
    /// Sets:
    /// - `source`: topic
    /// - `attempt`: number of characters
    RevealStarted,

    /// A reveal sequence ran to completion.
    ///
    /// Sets:
    /// - `source`: topic
    RevealFinished,

    /// A reveal sequence stopped early (cancellation or display failure).
    ///
    /// Sets:
    /// - `source`: topic
    /// - `attempt`: characters fully shown
    /// - `reason`: why it stopped
    RevealAborted,

    // === Producer events ===
    /// A refetch produced new content.
    ///
    /// Sets:
    /// - `attempt`: attempt number (startup retries), 1 otherwise
    FetchSucceeded,

    /// A fetch failed; the previous content stays authoritative.
    ///
    /// Sets:
    /// - `attempt`: attempt number
    /// - `reason`: fetch error
    FetchFailed,

    /// A startup fetch retry was scheduled.
    ///
    /// Sets:
    /// - `attempt`: failed attempt number
    /// - `delay_ms`: delay before the next attempt
    /// - `reason`: last fetch error
    BackoffScheduled,

    /// A push overwrote a pending event that the arbiter never saw.
    ///
    /// Sets:
    /// - `source`: queue name (`"refresh"` or `"reveal"`)
    EventCoalesced,

    /// A trigger delivery was dropped (other topic, empty payload).
    ///
    /// Sets:
    /// - `source`: topic
    /// - `reason`: why it was dropped
    TriggerIgnored,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// All tasks stopped within configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not stop in time.
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: `"full"` or `"closed"`
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// What the event is about (event kind, queue, topic, subscriber).
    pub source: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Attempt or item count (starting from 1).
    pub attempt: Option<u32>,
    /// Delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            reason: None,
            attempt: None,
            delay_ms: None,
        }
    }

    /// Attaches what the event is about.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt or item count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }

    /// True for events emitted by the subscriber machinery itself.
    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::ShutdownRequested);
        let b = Event::new(EventKind::ShutdownRequested);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_delay_saturates() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
