//! # LogWriter — runtime events as `tracing` records
//!
//! Failures go out at `warn`/`error`, routine renders at `debug`, lifecycle
//! milestones at `info`.
//!
//! ## Example output (fmt layer)
//! ```text
//! DEBUG quotetower::log: content rendered source="refresh"
//! INFO  quotetower::log: reveal started topic="tower/secret" chars=2
//! WARN  quotetower::log: fetch failed attempt=1 err="unexpected status 503"
//! WARN  quotetower::log: render failed source="refresh" err="render rejected by display: busy"
//! INFO  quotetower::log: shutdown requested
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::ContentRendered => {
                tracing::debug!(target: "quotetower::log", source, "content rendered");
            }
            EventKind::RenderFailed => {
                tracing::warn!(target: "quotetower::log", source, err = reason, "render failed");
            }
            EventKind::RevealStarted => {
                tracing::info!(target: "quotetower::log", topic = source, chars = e.attempt, "reveal started");
            }
            EventKind::RevealFinished => {
                tracing::debug!(target: "quotetower::log", topic = source, "reveal finished");
            }
            EventKind::RevealAborted => {
                tracing::warn!(
                    target: "quotetower::log",
                    topic = source,
                    shown = e.attempt,
                    err = reason,
                    "reveal aborted"
                );
            }
            EventKind::FetchSucceeded => {
                tracing::debug!(target: "quotetower::log", attempt = e.attempt, "fetch succeeded");
            }
            EventKind::FetchFailed => {
                tracing::warn!(target: "quotetower::log", attempt = e.attempt, err = reason, "fetch failed");
            }
            EventKind::BackoffScheduled => {
                tracing::info!(
                    target: "quotetower::log",
                    after_attempt = e.attempt,
                    delay_ms = e.delay_ms,
                    err = reason,
                    "fetch retry scheduled"
                );
            }
            EventKind::EventCoalesced => {
                tracing::debug!(target: "quotetower::log", queue = source, "pending event overwritten");
            }
            EventKind::TriggerIgnored => {
                tracing::debug!(target: "quotetower::log", topic = source, why = reason, "trigger ignored");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "quotetower::log", "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "quotetower::log", "all tasks stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::error!(target: "quotetower::log", "grace exceeded");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                // Already logged by the subscriber set.
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
