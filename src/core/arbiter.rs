//! # Arbiter: the single writer of the display.
//!
//! The arbiter owns the authoritative [`ContentState`] and the [`Display`].
//! It takes one event at a time from the coalescing queues and runs it to
//! completion before looking at the queues again.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► select! (fair, no priority):
//!   │     ├─ token cancelled      → Stopped
//!   │     ├─ refresh.pop()        → Dispatching(refresh)
//!   │     └─ reveal.pop()         → Dispatching(reveal)
//!   ├─► Rendering:
//!   │     ├─ refresh: replace content, draw content
//!   │     └─ reveal:  per char { show c, hold(on), blank, hold(off) }
//!   │                 then restore content
//!   └─► Idle
//! }
//! ```
//!
//! ## Rules
//! - Events are handled **one at a time**; display calls of two events never interleave.
//! - A reveal is **not preemptible** by refresh events; a refresh that arrives
//!   meanwhile waits in its slot (and may be overwritten by a newer one).
//! - Cancellation is honoured at **safe points** only: while idle, at a
//!   character boundary, and during reveal holds. A started call sequence is
//!   never cut between its steps.
//! - A display failure abandons the rest of that sequence, is logged and
//!   published, and the loop keeps going.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    config::RevealPacing,
    content::{ContentState, markup::escape_char},
    display::{Display, Roll, TextCommand},
    error::DisplayError,
    events::{Bus, Event, EventKind},
    queue::SlotReceiver,
};

/// Replace the displayed content with `content` and draw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshEvent {
    /// Full snapshot to show.
    pub content: ContentState,
}

impl RefreshEvent {
    /// Wraps a content snapshot.
    pub fn new(content: ContentState) -> Self {
        Self { content }
    }
}

/// Animate `payload` character by character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealEvent {
    /// Topic the request arrived on.
    pub topic: String,
    /// Text to reveal.
    pub payload: String,
}

/// How a reveal sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Every character was shown and blanked.
    Completed,
    /// Cancellation was observed at a safe point.
    Cancelled,
    /// A display call failed.
    Failed,
}

enum Job {
    Refresh(RefreshEvent),
    Reveal(RevealEvent),
}

/// Single consumer of the refresh and reveal queues.
pub struct Arbiter<D> {
    display: D,
    content: ContentState,
    pacing: RevealPacing,
    bus: Bus,
}

impl<D: Display> Arbiter<D> {
    /// Creates an arbiter driving `display`, starting with empty content.
    pub fn new(display: D, pacing: RevealPacing, bus: Bus) -> Self {
        Self {
            display,
            content: ContentState::default(),
            pacing,
            bus,
        }
    }

    /// Runs until `token` is cancelled or both queues are closed.
    ///
    /// Returns the display so the caller can release it.
    pub async fn run(
        mut self,
        mut refresh: SlotReceiver<RefreshEvent>,
        mut reveal: SlotReceiver<RevealEvent>,
        token: CancellationToken,
    ) -> D {
        let mut refresh_open = true;
        let mut reveal_open = true;

        while refresh_open || reveal_open {
            // Ready branches are polled in random order.
            let job = select! {
                _ = token.cancelled() => break,
                ev = refresh.pop(), if refresh_open => match ev {
                    Some(ev) => Job::Refresh(ev),
                    None => { refresh_open = false; continue; }
                },
                ev = reveal.pop(), if reveal_open => match ev {
                    Some(ev) => Job::Reveal(ev),
                    None => { reveal_open = false; continue; }
                },
            };
            // A job may win the race against an already cancelled token.
            if token.is_cancelled() {
                break;
            }
            self.dispatch(job, &token).await;
        }
        tracing::debug!(display = self.display.name(), "arbiter stopped");
        self.display
    }

    async fn dispatch(&mut self, job: Job, token: &CancellationToken) {
        match job {
            Job::Refresh(ev) => {
                self.content = ev.content;
                self.render_content("refresh").await;
            }
            Job::Reveal(ev) => {
                let outcome = self.reveal(&ev, token).await;
                if outcome == RevealOutcome::Completed
                    && !self.content.is_empty()
                    && !token.is_cancelled()
                {
                    self.render_content("restore").await;
                }
            }
        }
    }

    async fn render_content(&mut self, source: &'static str) {
        match self.draw_content().await {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::ContentRendered).with_source(source));
            }
            Err(e) => self.render_failed(source, &e),
        }
    }

    async fn draw_content(&mut self) -> Result<(), DisplayError> {
        let text = TextCommand::new(self.content.markup());
        self.display.start_drawing().await?;
        self.display.init().await?;
        self.display.write_text(&text).await?;
        self.display.auto_roll(&Roll::NEXT).await?;
        self.display.render().await
    }

    async fn draw_char(&mut self, c: char) -> Result<(), DisplayError> {
        let text = TextCommand::new(escape_char(c));
        self.display.start_drawing().await?;
        self.display.init().await?;
        self.display.write_text(&text).await?;
        self.display.auto_roll(&Roll::STOP).await?;
        self.display.render().await
    }

    async fn draw_blank(&mut self) -> Result<(), DisplayError> {
        self.display.start_drawing().await?;
        self.display.init().await?;
        self.display.render().await
    }

    /// Runs one reveal sequence.
    async fn reveal(&mut self, ev: &RevealEvent, token: &CancellationToken) -> RevealOutcome {
        let total = ev.payload.chars().count();
        self.bus.publish(
            Event::new(EventKind::RevealStarted)
                .with_source(ev.topic.as_str())
                .with_attempt(saturating_u32(total)),
        );

        let mut shown: usize = 0;
        for c in ev.payload.chars() {
            if token.is_cancelled() {
                return self.reveal_aborted(ev, shown, "cancelled", RevealOutcome::Cancelled);
            }
            if let Err(e) = self.draw_char(c).await {
                self.render_failed("reveal", &e);
                return self.reveal_aborted(ev, shown, &e.to_string(), RevealOutcome::Failed);
            }
            if !hold(self.pacing.on, token).await {
                return self.reveal_aborted(ev, shown, "cancelled", RevealOutcome::Cancelled);
            }
            if let Err(e) = self.draw_blank().await {
                self.render_failed("reveal", &e);
                return self.reveal_aborted(ev, shown, &e.to_string(), RevealOutcome::Failed);
            }
            shown += 1;
            if !hold(self.pacing.off, token).await {
                return self.reveal_aborted(ev, shown, "cancelled", RevealOutcome::Cancelled);
            }
        }

        self.bus
            .publish(Event::new(EventKind::RevealFinished).with_source(ev.topic.as_str()));
        RevealOutcome::Completed
    }

    fn reveal_aborted(
        &self,
        ev: &RevealEvent,
        shown: usize,
        reason: &str,
        outcome: RevealOutcome,
    ) -> RevealOutcome {
        self.bus.publish(
            Event::new(EventKind::RevealAborted)
                .with_source(ev.topic.as_str())
                .with_attempt(saturating_u32(shown))
                .with_reason(reason),
        );
        outcome
    }

    fn render_failed(&self, source: &'static str, err: &DisplayError) {
        tracing::warn!(
            kind = source,
            label = err.as_label(),
            error = %err,
            "display sequence abandoned"
        );
        self.bus.publish(
            Event::new(EventKind::RenderFailed)
                .with_source(source)
                .with_reason(err.to_string()),
        );
    }
}

/// Sleeps for `d`; returns `false` if cancelled first.
async fn hold(d: Duration, token: &CancellationToken) -> bool {
    if token.is_cancelled() {
        return false;
    }
    let sleep = time::sleep(d);
    tokio::pin!(sleep);
    select! {
        _ = &mut sleep => true,
        _ = token.cancelled() => false,
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
