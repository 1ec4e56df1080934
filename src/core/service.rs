//! # Service: wiring, startup, and graceful shutdown.
//!
//! The [`Service`] owns the queues, the event bus and the subscriber set. It
//! fetches the first quote, spawns the arbiter and the producers, and tears
//! everything down when a termination signal arrives.
//!
//! ## High-level architecture
//! ```text
//! run_until(display, source, shutdown):
//!   - event_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   - initial_fetch(): source.fetch() with startup backoff (fatal when exhausted)
//!   - feed ← first quote; refresh slot ← Refresh(first quote)
//!
//! Spawn (one JoinSet, child tokens of the root token):
//!   Arbiter::run(refresh_rx, reveal_rx)     ◄── sole owner of the display
//!   Scheduler::run()                        ──► refresh slot
//!   TriggerListener::run() (if configured)  ──► reveal slot, refresh slot
//!
//! Shutdown path:
//!   shutdown future completes
//!             └─► Bus.publish(ShutdownRequested)
//!             └─► root_token.cancel()   → producers stop, arbiter stops at a safe point
//!             └─► wait_all_with_grace(cfg.grace):
//!                    ├─ Ok (all joined)    → display.close(), AllStoppedWithin
//!                    └─ Timeout exceeded   → abort tasks, GraceExceeded
//! ```

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    content::{ContentState, QuoteSource},
    core::{
        arbiter::{Arbiter, RefreshEvent, RevealEvent},
        scheduler::Scheduler,
        shutdown,
        trigger::{TriggerListener, TriggerProducer},
    },
    display::Display,
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    queue::{SlotReceiver, SlotSender, slot},
    subscribers::{Subscribe, SubscriberSet},
};

const ARBITER: &str = "arbiter";
const SCHEDULER: &str = "scheduler";
const TRIGGER: &str = "trigger-listener";

enum Stopped<D> {
    Arbiter(D),
    Producer(&'static str),
}

/// Runs the arbiter and both producers until shutdown.
pub struct Service {
    cfg: Config,
    bus: Bus,
    subs: SubscriberSet,
    refresh: (SlotSender<RefreshEvent>, SlotReceiver<RefreshEvent>),
    reveal: (SlotSender<RevealEvent>, SlotReceiver<RevealEvent>),
    feed: watch::Sender<ContentState>,
}

impl Service {
    /// Starts building a service from `cfg`.
    pub fn builder(cfg: Config) -> ServiceBuilder {
        ServiceBuilder::new(cfg)
    }

    /// A producer feeding this service's queues, for in-process triggers.
    pub fn trigger(&self) -> TriggerProducer {
        TriggerProducer::new(
            self.cfg.topic.as_str(),
            self.reveal.0.clone(),
            self.refresh.0.clone(),
            self.feed.subscribe(),
            self.bus.clone(),
        )
    }

    /// Runs until SIGINT/SIGTERM/SIGQUIT (Ctrl-C on non-Unix).
    pub async fn run<D: Display>(
        self,
        display: D,
        source: Arc<dyn QuoteSource>,
    ) -> Result<(), RuntimeError> {
        self.run_until(display, source, shutdown::wait_for_shutdown_signal())
            .await
    }

    /// Runs until `shutdown` completes.
    ///
    /// Fails before touching the display if the trigger address cannot be bound
    /// or the first quote cannot be fetched.
    pub async fn run_until<D, F>(
        self,
        display: D,
        source: Arc<dyn QuoteSource>,
        shutdown: F,
    ) -> Result<(), RuntimeError>
    where
        D: Display,
        F: Future<Output = std::io::Result<()>>,
    {
        let Service {
            cfg,
            bus,
            subs,
            refresh,
            reveal,
            feed,
        } = self;

        let listener_stop = CancellationToken::new();
        let listener = event_listener(&bus, subs, listener_stop.clone());

        let wiring = Wiring {
            refresh,
            reveal,
            feed,
        };
        let res = serve(&cfg, &bus, wiring, display, source, shutdown).await;

        listener_stop.cancel();
        let _ = listener.await;
        res
    }
}

struct Wiring {
    refresh: (SlotSender<RefreshEvent>, SlotReceiver<RefreshEvent>),
    reveal: (SlotSender<RevealEvent>, SlotReceiver<RevealEvent>),
    feed: watch::Sender<ContentState>,
}

async fn serve<D, F>(
    cfg: &Config,
    bus: &Bus,
    wiring: Wiring,
    display: D,
    source: Arc<dyn QuoteSource>,
    shutdown: F,
) -> Result<(), RuntimeError>
where
    D: Display,
    F: Future<Output = std::io::Result<()>>,
{
    let Wiring {
        refresh: (refresh_tx, refresh_rx),
        reveal: (reveal_tx, reveal_rx),
        feed,
    } = wiring;

    let trigger = match cfg.trigger_addr() {
        Some(addr) => Some(TriggerListener::bind(addr).await?),
        None => None,
    };

    let first = initial_fetch(cfg, source.as_ref(), bus).await?;
    tracing::info!(quote = ?first.quote, author = ?first.author, "starting with quote");
    feed.send_replace(first.clone());
    refresh_tx.push(RefreshEvent::new(first));

    let token = CancellationToken::new();
    let mut set: JoinSet<Stopped<D>> = JoinSet::new();
    let mut spawned = vec![ARBITER, SCHEDULER];

    let arbiter = Arbiter::new(display, cfg.reveal, bus.clone());
    let child = token.child_token();
    set.spawn(async move { Stopped::Arbiter(arbiter.run(refresh_rx, reveal_rx, child).await) });

    let producer = TriggerProducer::new(
        cfg.topic.as_str(),
        reveal_tx,
        refresh_tx.clone(),
        feed.subscribe(),
        bus.clone(),
    );
    let scheduler = Scheduler::new(
        source,
        refresh_tx,
        feed,
        cfg.refresh_interval(),
        cfg.refetch_interval(),
        bus.clone(),
    );
    let child = token.child_token();
    set.spawn(async move {
        scheduler.run(child).await;
        Stopped::Producer(SCHEDULER)
    });

    if let Some(listener) = trigger {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, topic = %cfg.topic, "listening for triggers");
        }
        let child = token.child_token();
        set.spawn(async move {
            listener.run(producer, child).await;
            Stopped::Producer(TRIGGER)
        });
        spawned.push(TRIGGER);
    }

    drive_shutdown(cfg, bus, &mut set, &spawned, &token, shutdown).await
}

/// Builder for [`Service`].
pub struct ServiceBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ServiceBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the service. Must be called inside a tokio runtime.
    pub fn build(self) -> Service {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let (feed, _) = watch::channel(ContentState::default());
        Service {
            cfg: self.cfg,
            bus,
            subs,
            refresh: slot(),
            reveal: slot(),
            feed,
        }
    }
}

/// Forwards bus events to the subscriber set until `stop`, then drains and shuts it down.
fn event_listener(
    bus: &Bus,
    subs: SubscriberSet,
    stop: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                ev = rx.recv() => match ev {
                    Ok(ev) => subs.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event listener lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        while let Ok(ev) = rx.try_recv() {
            subs.emit(&ev);
        }
        subs.shutdown().await;
    })
}

/// Fetches the first quote, retrying with the startup backoff.
async fn initial_fetch(
    cfg: &Config,
    source: &dyn QuoteSource,
    bus: &Bus,
) -> Result<ContentState, RuntimeError> {
    let attempts = cfg.startup_attempts_clamped();
    let mut attempt = 1;
    loop {
        match source.fetch().await {
            Ok(content) => {
                bus.publish(Event::new(EventKind::FetchSucceeded).with_attempt(attempt));
                return Ok(content);
            }
            Err(e) => {
                tracing::warn!(attempt, label = e.as_label(), error = %e, "startup fetch failed");
                bus.publish(
                    Event::new(EventKind::FetchFailed)
                        .with_attempt(attempt)
                        .with_reason(e.to_string()),
                );
                if attempt >= attempts {
                    return Err(RuntimeError::startup("initial quote fetch", e));
                }
                let delay = cfg.startup_backoff.next(attempt - 1);
                bus.publish(
                    Event::new(EventKind::BackoffScheduled)
                        .with_attempt(attempt)
                        .with_delay(delay)
                        .with_reason(e.to_string()),
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Waits for `shutdown` (or for every task to end on its own), then stops everything.
async fn drive_shutdown<D, F>(
    cfg: &Config,
    bus: &Bus,
    set: &mut JoinSet<Stopped<D>>,
    spawned: &[&'static str],
    token: &CancellationToken,
    shutdown: F,
) -> Result<(), RuntimeError>
where
    D: Display,
    F: Future<Output = std::io::Result<()>>,
{
    let mut stopped: HashSet<&'static str> = HashSet::new();
    let mut display: Option<D> = None;

    let signal = tokio::select! {
        res = shutdown => res,
        _ = join_all(set, &mut stopped, &mut display) => Ok(()),
    };

    bus.publish(Event::new(EventKind::ShutdownRequested));
    token.cancel();

    let grace = cfg.grace;
    let joined = tokio::time::timeout(grace, join_all(set, &mut stopped, &mut display)).await;

    let res = match joined {
        Ok(()) => {
            bus.publish(Event::new(EventKind::AllStoppedWithin));
            Ok(())
        }
        Err(_) => {
            set.abort_all();
            bus.publish(Event::new(EventKind::GraceExceeded));
            let stuck: Vec<String> = spawned
                .iter()
                .filter(|name| !stopped.contains(*name))
                .map(|name| name.to_string())
                .collect();
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    };

    if let Some(mut display) = display {
        if let Err(e) = display.close().await {
            tracing::warn!(error = %e, "closing display failed");
        }
    }

    signal.map_err(RuntimeError::Signal)?;
    res
}

async fn join_all<D>(
    set: &mut JoinSet<Stopped<D>>,
    stopped: &mut HashSet<&'static str>,
    display: &mut Option<D>,
) where
    D: Display,
{
    while let Some(res) = set.join_next().await {
        match res {
            Ok(Stopped::Arbiter(d)) => {
                stopped.insert(ARBITER);
                *display = Some(d);
            }
            Ok(Stopped::Producer(name)) => {
                stopped.insert(name);
            }
            Err(e) => tracing::error!(error = %e, "service task failed"),
        }
    }
}
