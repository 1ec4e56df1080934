//! # Trigger: external deliveries → reveal events.
//!
//! [`TriggerProducer`] adapts `(topic, payload)` deliveries into a
//! [`RevealEvent`] followed by a [`RefreshEvent`] carrying the latest content,
//! so the display goes back to the quote once the reveal is over.
//!
//! [`TriggerListener`] is the shipped transport: a TCP listener accepting
//! newline-delimited JSON messages from any number of publishers.
//!
//! ```text
//! publisher ── {"topic":"quotetower/reveal","payload":"HI"}\n ──► TriggerListener
//!                                                                    │ deliver(topic, payload)
//!                                                                    ▼
//!                                       TriggerProducer ──► reveal slot: Reveal("HI")
//!                                                       └─► refresh slot: Refresh(feed.borrow())
//! ```
//!
//! Delivery order relative to the scheduler is unconstrained.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;

use crate::content::ContentState;
use crate::core::arbiter::{RefreshEvent, RevealEvent};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::queue::SlotSender;

/// Longest accepted trigger line in bytes; longer lines close the connection.
pub(crate) const MAX_LINE_LEN: usize = 64 * 1024;

/// One message on the trigger transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Text to reveal.
    pub payload: String,
}

/// Turns deliveries on one topic into reveal + refresh events.
///
/// Cheap to clone; every clone feeds the same queues.
#[derive(Clone)]
pub struct TriggerProducer {
    topic: Arc<str>,
    reveal_tx: SlotSender<RevealEvent>,
    refresh_tx: SlotSender<RefreshEvent>,
    feed: watch::Receiver<ContentState>,
    bus: Bus,
}

impl TriggerProducer {
    /// Creates a producer accepting deliveries on `topic`.
    pub fn new(
        topic: impl Into<Arc<str>>,
        reveal_tx: SlotSender<RevealEvent>,
        refresh_tx: SlotSender<RefreshEvent>,
        feed: watch::Receiver<ContentState>,
        bus: Bus,
    ) -> Self {
        Self {
            topic: topic.into(),
            reveal_tx,
            refresh_tx,
            feed,
            bus,
        }
    }

    /// Topic this producer listens to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Handles one delivery. Returns `true` if a reveal was enqueued.
    pub fn deliver(&self, topic: &str, payload: &str) -> bool {
        if topic != &*self.topic {
            self.ignored(topic, "other topic");
            return false;
        }
        if payload.is_empty() {
            self.ignored(topic, "empty payload");
            return false;
        }

        let reveal = RevealEvent {
            topic: topic.to_string(),
            payload: payload.to_string(),
        };
        if self.reveal_tx.push(reveal) {
            self.coalesced("reveal");
        }
        let content = self.feed.borrow().clone();
        if self.refresh_tx.push(RefreshEvent::new(content)) {
            self.coalesced("refresh");
        }
        true
    }

    fn ignored(&self, topic: &str, why: &'static str) {
        tracing::debug!(%topic, why, "trigger ignored");
        self.bus.publish(
            Event::new(EventKind::TriggerIgnored)
                .with_source(topic)
                .with_reason(why),
        );
    }

    fn coalesced(&self, queue: &'static str) {
        self.bus
            .publish(Event::new(EventKind::EventCoalesced).with_source(queue));
    }
}

/// TCP transport for trigger messages.
pub struct TriggerListener {
    listener: TcpListener,
}

impl TriggerListener {
    /// Binds `addr`.
    pub async fn bind(addr: &str) -> Result<Self, RuntimeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RuntimeError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self { listener })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections and forwards their messages until `token` is cancelled.
    pub async fn run(self, producer: TriggerProducer, token: CancellationToken) {
        let mut conns = JoinSet::new();
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "trigger publisher connected");
                        conns.spawn(read_messages(stream, producer.clone(), token.clone()));
                    }
                    Err(e) => tracing::warn!(error = %e, "trigger accept failed"),
                },
                Some(_) = conns.join_next(), if !conns.is_empty() => {}
            }
        }
        conns.shutdown().await;
        tracing::debug!("trigger listener stopped");
    }
}

async fn read_messages(stream: TcpStream, producer: TriggerProducer, token: CancellationToken) {
    let mut lines = FramedRead::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN));
    loop {
        let line = tokio::select! {
            _ = token.cancelled() => return,
            line = lines.next() => line,
        };
        match line {
            Some(Ok(line)) if line.trim().is_empty() => {}
            Some(Ok(line)) => match serde_json::from_str::<TriggerMessage>(&line) {
                Ok(msg) => {
                    producer.deliver(&msg.topic, &msg.payload);
                }
                Err(e) => tracing::warn!(error = %e, "malformed trigger message skipped"),
            },
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                tracing::warn!(max = MAX_LINE_LEN, "trigger line too long; dropping connection");
                return;
            }
            Some(Err(LinesCodecError::Io(e))) => {
                tracing::warn!(error = %e, "trigger connection failed");
                return;
            }
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{SlotReceiver, slot};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn producer() -> (
        TriggerProducer,
        SlotReceiver<RevealEvent>,
        SlotReceiver<RefreshEvent>,
        watch::Sender<ContentState>,
    ) {
        let (reveal_tx, reveal_rx) = slot();
        let (refresh_tx, refresh_rx) = slot();
        let (feed_tx, feed_rx) = watch::channel(ContentState::new("q", "a"));
        let p = TriggerProducer::new("secret", reveal_tx, refresh_tx, feed_rx, Bus::new(8));
        (p, reveal_rx, refresh_rx, feed_tx)
    }

    #[test]
    fn test_deliver_pushes_reveal_then_refresh() {
        let (p, mut reveal_rx, mut refresh_rx, feed_tx) = producer();
        feed_tx.send_replace(ContentState::new("latest", "b"));

        assert!(p.deliver("secret", "HI"));
        assert_eq!(reveal_rx.try_pop().unwrap().payload, "HI");
        assert_eq!(
            refresh_rx.try_pop().unwrap().content,
            ContentState::new("latest", "b")
        );
    }

    #[test]
    fn test_other_topic_and_empty_payload_are_ignored() {
        let (p, reveal_rx, refresh_rx, _feed) = producer();
        assert!(!p.deliver("other", "HI"));
        assert!(!p.deliver("secret", ""));
        assert!(!reveal_rx.is_ready());
        assert!(!refresh_rx.is_ready());
    }

    #[tokio::test]
    async fn test_listener_forwards_json_lines() {
        let (p, mut reveal_rx, _refresh_rx, _feed) = producer();
        let listener = TriggerListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(listener.run(p, token.clone()));

        let mut conn = TcpStream::connect(addr).await.unwrap();
        conn.write_all(b"not json\n{\"topic\":\"secret\",\"payload\":\"OK\"}\n")
            .await
            .unwrap();

        let ev = tokio::time::timeout(Duration::from_secs(5), reveal_rx.pop())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ev.payload, "OK");

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_overlong_line_drops_connection() {
        let (p, mut reveal_rx, _refresh_rx, _feed) = producer();
        let listener = TriggerListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(listener.run(p, token.clone()));

        let mut flood = TcpStream::connect(addr).await.unwrap();
        let _ = flood.write_all(&vec![b'x'; MAX_LINE_LEN + 1]).await;
        let mut buf = [0u8; 16];
        let closed = tokio::time::timeout(Duration::from_secs(5), flood.read(&mut buf))
            .await
            .unwrap();
        assert!(matches!(closed, Ok(0) | Err(_)), "connection still open: {closed:?}");

        // The listener keeps serving other publishers.
        let mut conn = TcpStream::connect(addr).await.unwrap();
        conn.write_all(b"{\"topic\":\"secret\",\"payload\":\"OK\"}\n")
            .await
            .unwrap();
        let ev = tokio::time::timeout(Duration::from_secs(5), reveal_rx.pop())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ev.payload, "OK");

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure_is_runtime_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();
        let err = TriggerListener::bind(&addr).await.err().unwrap();
        assert_eq!(err.as_label(), "runtime_bind");
    }
}
