use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::time::Instant;

use quotetower::{
    Config, ContentState, DEFAULT_TOPIC, DisplayCall, DisplayLog, FetchError, MemoryDisplay,
    QuoteSource, RevealPacing, RuntimeError, Service,
};

/// Returns scripted results in order, then fails forever.
struct Scripted {
    script: Mutex<Vec<Result<ContentState, FetchError>>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(script: Vec<Result<ContentState, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for Scripted {
    async fn fetch(&self) -> Result<ContentState, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            Err(FetchError::Transport("connection refused".into()))
        } else {
            script.remove(0)
        }
    }
}

fn config() -> Config {
    Config {
        refresh_every: Duration::from_secs(10),
        refetch_every: Duration::from_secs(25),
        grace: Duration::from_secs(1),
        ..Config::default()
    }
}

fn is_quote(frame: &str) -> bool {
    frame.contains("Stay hungry") && frame.contains("(X)")
}

async fn wait_for(log: &DisplayLog, what: impl Fn(&[String]) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(120);
    while !what(&log.frames()) {
        assert!(Instant::now() < deadline, "timed out, frames: {:?}", log.frames());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn shutdown_on(rx: oneshot::Receiver<()>) -> impl Future<Output = std::io::Result<()>> {
    async move {
        let _ = rx.await;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_quote_reveal_and_failed_refetch() {
    let source = Scripted::new(vec![Ok(ContentState::new("Stay hungry", "X"))]);
    let (display, log) = MemoryDisplay::new();
    let service = Service::builder(config()).build();
    let trigger = service.trigger();
    let (stop_tx, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(service.run_until(display, source.clone(), shutdown_on(stop_rx)));

    // startup render
    wait_for(&log, |f| !f.is_empty()).await;
    assert!(is_quote(&log.frames()[0]));

    // reveal, then the quote comes back
    assert!(trigger.deliver(DEFAULT_TOPIC, "HI"));
    wait_for(&log, |f| {
        f.iter()
            .position(|s| s == "H")
            .is_some_and(|i| f.len() > i + 4)
    })
    .await;
    let frames = log.frames();
    let h = frames.iter().position(|s| s == "H").unwrap();
    assert_eq!(&frames[h..h + 4], &["H", "", "I", ""]);
    assert!(is_quote(&frames[h + 4]));

    // refetch at t=25 fails; the refresh at t=30 still shows the old quote
    let rendered = log.frames().len();
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(source.calls() >= 2);
    let frames = log.frames();
    assert!(frames.len() > rendered);
    assert!(is_quote(frames.last().unwrap()));

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
    assert!(log.is_closed());
    assert_eq!(log.calls().last(), Some(&DisplayCall::Close));
}

#[tokio::test(start_paused = true)]
async fn test_startup_fetch_failure_is_fatal_and_leaves_display_untouched() {
    let source = Scripted::new(vec![]);
    let (display, log) = MemoryDisplay::new();
    let cfg = Config {
        startup_attempts: 2,
        ..config()
    };
    let service = Service::builder(cfg).build();
    let (_stop_tx, stop_rx) = oneshot::channel();

    let err = service
        .run_until(display, source.clone(), shutdown_on(stop_rx))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Startup { .. }));
    assert_eq!(source.calls(), 2);
    assert!(log.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_reveal_stops_within_grace() {
    let source = Scripted::new(vec![Ok(ContentState::new("Stay hungry", "X"))]);
    let (display, log) = MemoryDisplay::new();
    let service = Service::builder(config()).build();
    let trigger = service.trigger();
    let (stop_tx, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(service.run_until(display, source, shutdown_on(stop_rx)));

    wait_for(&log, |f| !f.is_empty()).await;
    trigger.deliver(DEFAULT_TOPIC, "ABCDEFGHIJ");
    wait_for(&log, |f| f.iter().any(|s| s == "B")).await;

    let asked = Instant::now();
    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
    assert!(asked.elapsed() < Duration::from_secs(1));

    let frames = log.frames();
    assert!(!frames.iter().any(|s| s == "J"), "reveal ran to completion");
    let calls = log.calls();
    assert_eq!(calls.last(), Some(&DisplayCall::Close));
    let closed_at = log.len();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(log.len(), closed_at);
}

#[tokio::test(start_paused = true)]
async fn test_quote_is_not_redrawn_after_shutdown_signal() {
    for _ in 0..20 {
        let source = Scripted::new(vec![Ok(ContentState::new("Stay hungry", "X"))]);
        let (display, log) = MemoryDisplay::new();
        let service = Service::builder(config()).build();
        let trigger = service.trigger();
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(service.run_until(display, source, shutdown_on(stop_rx)));

        wait_for(&log, |f| !f.is_empty()).await;
        trigger.deliver(DEFAULT_TOPIC, "ABCDEFGH");
        wait_for(&log, |f| f.iter().any(|s| s == "C")).await;

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        let frames = log.frames();
        let last = frames.last().unwrap();
        assert!(!is_quote(last), "quote drawn after shutdown: {frames:?}");
    }
}

/// Splits a call log into draw sequences; panics on anything interleaved.
fn sequences(calls: &[DisplayCall]) -> usize {
    use DisplayCall::*;

    let mut i = 0;
    let mut n = 0;
    while i < calls.len() {
        match &calls[i..] {
            [StartDrawing, Init, WriteText(_), AutoRoll(_), Render, ..] => i += 5,
            [StartDrawing, Init, Render, ..] => i += 3,
            [Close] => i += 1,
            rest => panic!("interleaved display calls at {i}: {:?}", &rest[..rest.len().min(5)]),
        }
        n += 1;
    }
    n
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_producers_never_interleave_sequences() {
    let source = Scripted::new(
        (0..50)
            .map(|i| Ok(ContentState::new(format!("quote {i}"), "X")))
            .collect(),
    );
    let (display, log) = MemoryDisplay::new();
    let cfg = Config {
        refresh_every: Duration::from_millis(30),
        refetch_every: Duration::from_millis(70),
        reveal: RevealPacing {
            on: Duration::from_millis(5),
            off: Duration::from_millis(5),
        },
        ..config()
    };
    let service = Service::builder(cfg).build();
    let trigger = service.trigger();
    let (stop_tx, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(service.run_until(display, source, shutdown_on(stop_rx)));

    let mut publishers = Vec::new();
    for _ in 0..4 {
        let trigger = trigger.clone();
        publishers.push(tokio::spawn(async move {
            for _ in 0..20 {
                trigger.deliver(DEFAULT_TOPIC, "AB");
                tokio::time::sleep(Duration::from_millis(13)).await;
            }
        }));
    }
    for p in publishers {
        p.await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert!(sequences(&log.calls()) > 10);

    // every reveal that started also finished, with nothing in between
    let frames = log.frames();
    for (i, f) in frames.iter().enumerate() {
        if f == "A" {
            assert_eq!(&frames[i..i + 4], &["A", "", "B", ""], "at frame {i}");
        }
    }
}
