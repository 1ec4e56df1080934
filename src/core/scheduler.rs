//! # Scheduler: wall-clock cadence → refresh events.
//!
//! Two independent tickers:
//! - **refresh**: re-send the last known content (no fetch)
//! - **refetch**: fetch a new quote; on success keep it, publish it on the
//!   content feed and send it; on failure keep the previous one
//!
//! ```text
//! refresh tick ──► push(Refresh(current))
//! refetch tick ──► source.fetch()
//!                    ├─ Ok(c)  ─► current = c; feed ← c; push(Refresh(c))
//!                    └─ Err(e) ─► publish FetchFailed (current unchanged)
//! ```
//!
//! The scheduler never touches the display; it only enqueues.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::content::{ContentState, QuoteSource};
use crate::core::arbiter::RefreshEvent;
use crate::events::{Bus, Event, EventKind};
use crate::queue::SlotSender;

/// Timed producer of [`RefreshEvent`]s.
pub struct Scheduler {
    source: Arc<dyn QuoteSource>,
    refresh_tx: SlotSender<RefreshEvent>,
    feed: watch::Sender<ContentState>,
    refresh_every: Option<Duration>,
    refetch_every: Option<Duration>,
    bus: Bus,
}

impl Scheduler {
    /// Creates a scheduler. The current content is whatever `feed` holds.
    ///
    /// `None` cadences never tick.
    pub fn new(
        source: Arc<dyn QuoteSource>,
        refresh_tx: SlotSender<RefreshEvent>,
        feed: watch::Sender<ContentState>,
        refresh_every: Option<Duration>,
        refetch_every: Option<Duration>,
        bus: Bus,
    ) -> Self {
        Self {
            source,
            refresh_tx,
            feed,
            refresh_every,
            refetch_every,
            bus,
        }
    }

    /// Ticks until `token` is cancelled.
    pub async fn run(self, token: CancellationToken) {
        let mut current = self.feed.borrow().clone();
        let mut refresh = ticker(self.refresh_every);
        let mut refetch = ticker(self.refetch_every);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tick(&mut refresh) => {
                    self.send(current.clone());
                }
                _ = tick(&mut refetch) => {
                    let res = tokio::select! {
                        res = self.source.fetch() => res,
                        _ = token.cancelled() => break,
                    };
                    match res {
                        Ok(content) => {
                            self.bus.publish(Event::new(EventKind::FetchSucceeded).with_attempt(1));
                            current = content;
                            self.feed.send_replace(current.clone());
                            self.send(current.clone());
                        }
                        Err(e) => {
                            tracing::warn!(label = e.as_label(), error = %e, "refetch failed; keeping previous quote");
                            self.bus.publish(
                                Event::new(EventKind::FetchFailed)
                                    .with_attempt(1)
                                    .with_reason(e.to_string()),
                            );
                        }
                    }
                }
            }
        }
        tracing::debug!("scheduler stopped");
    }

    fn send(&self, content: ContentState) {
        if self.refresh_tx.push(RefreshEvent::new(content)) {
            self.bus
                .publish(Event::new(EventKind::EventCoalesced).with_source("refresh"));
        }
    }
}

/// First tick one period from now; late ticks are skipped, not bunched.
fn ticker(period: Option<Duration>) -> Option<Interval> {
    period.map(|p| {
        let mut iv = time::interval_at(Instant::now() + p, p);
        iv.set_missed_tick_behavior(MissedTickBehavior::Skip);
        iv
    })
}

async fn tick(iv: &mut Option<Interval>) {
    match iv {
        Some(iv) => {
            iv.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::queue::slot;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns scripted results, then fails forever.
    struct Scripted(Mutex<Vec<Result<ContentState, FetchError>>>);

    #[async_trait]
    impl QuoteSource for Scripted {
        async fn fetch(&self) -> Result<ContentState, FetchError> {
            let mut script = self.0.lock().unwrap();
            if script.is_empty() {
                Err(FetchError::Status { status: 503 })
            } else {
                script.remove(0)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_resends_current_without_fetching() {
        let (tx, mut rx) = slot();
        let (feed, _feed_rx) = watch::channel(ContentState::new("q", "a"));
        let source = Arc::new(Scripted(Mutex::new(vec![])));
        let token = CancellationToken::new();
        let sched = Scheduler::new(
            source,
            tx,
            feed,
            Some(Duration::from_secs(10)),
            None,
            Bus::new(8),
        );
        let handle = tokio::spawn(sched.run(token.clone()));

        let ev = rx.pop().await.unwrap();
        assert_eq!(ev.content, ContentState::new("q", "a"));
        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_failure_keeps_previous_content() {
        let (tx, mut rx) = slot();
        let (feed, feed_rx) = watch::channel(ContentState::new("first", "a"));
        let source = Arc::new(Scripted(Mutex::new(vec![
            Ok(ContentState::new("second", "b")),
            Err(FetchError::Transport("down".into())),
        ])));
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let token = CancellationToken::new();
        let sched = Scheduler::new(
            source,
            tx,
            feed,
            Some(Duration::from_secs(15)),
            Some(Duration::from_secs(10)),
            bus,
        );
        let handle = tokio::spawn(sched.run(token.clone()));

        // t=10 refetch ok
        assert_eq!(rx.pop().await.unwrap().content, ContentState::new("second", "b"));
        assert_eq!(*feed_rx.borrow(), ContentState::new("second", "b"));
        // t=15 refresh
        assert_eq!(rx.pop().await.unwrap().content, ContentState::new("second", "b"));
        // t=20 refetch fails, t=30 refresh still carries the last good quote
        assert_eq!(rx.pop().await.unwrap().content, ContentState::new("second", "b"));
        token.cancel();
        handle.await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::FetchSucceeded));
        assert!(kinds.contains(&EventKind::FetchFailed));
    }
}
