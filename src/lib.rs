//! # quotetower
//!
//! **Quotetower** keeps a quote of the day on a shared text display and lets
//! external publishers interrupt it with a character-by-character "secret"
//! reveal.
//!
//! Two independent producers want the same non-reentrant display. Neither of
//! them touches it: they push events into single-slot coalescing queues, and
//! one [`Arbiter`] task owns the display and runs each event to completion.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────────────┐                      ┌──────────────────────┐
//!   │    Scheduler     │                      │   TriggerListener    │
//!   │ refresh ticks    │                      │ {"topic","payload"}  │
//!   │ refetch ticks ───┼──► QuoteSource       │   └► TriggerProducer │
//!   └────────┬─────────┘      (HTTP)          └──────┬────────┬──────┘
//!            │ Refresh(content)                      │        │ Refresh(feed)
//!            │        ┌──────────── feed (watch) ────┼────────┘
//!            ▼        ▼                              ▼ Reveal(payload)
//!   ┌─────────────────────────┐           ┌─────────────────────────┐
//!   │  refresh slot (1 value) │           │  reveal slot (1 value)  │
//!   └────────────┬────────────┘           └────────────┬────────────┘
//!                └──────────────┬───────────────────────┘
//!                               ▼  fair select
//!                  ┌─────────────────────────┐
//!                  │         Arbiter         │──► Display (TowerClient / MemoryDisplay)
//!                  │ owns ContentState       │
//!                  └────────────┬────────────┘
//!                               │ publishes
//!                               ▼
//!                  Bus (broadcast) ─► SubscriberSet ─► LogWriter (tracing)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Service::run(display, source)
//!   ├─► bind trigger listener (optional)
//!   ├─► first fetch with BackoffPolicy (fatal when exhausted)
//!   ├─► spawn Arbiter, Scheduler, TriggerListener
//!   ├─► wait for SIGINT / SIGTERM / SIGQUIT
//!   ├─► cancel root token → producers stop, arbiter stops at a safe point
//!   └─► wait up to `grace`, then close the display
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                        |
//! |-------------------|----------------------------------------------------------|-------------------------------------------|
//! | **Arbitration**   | Single writer of the display, one event at a time.       | [`Arbiter`], [`RefreshEvent`], [`RevealEvent`] |
//! | **Queues**        | Single-slot latest-wins queues.                          | [`queue::slot`]                           |
//! | **Producers**     | Timed refresh/refetch and external reveal triggers.      | [`Scheduler`], [`TriggerProducer`]        |
//! | **Display**       | Async display trait, TCP client and in-memory recorder. | [`Display`], [`TowerClient`], [`MemoryDisplay`] |
//! | **Content**       | Quote fetching and markup.                               | [`QuoteSource`], [`ContentState`]         |
//! | **Subscriber API**| Hook into runtime events.                                | [`Subscribe`], [`LogWriter`]              |
//! | **Errors**        | Typed errors with stable labels.                         | [`FetchError`], [`DisplayError`], [`RuntimeError`] |
//! | **Configuration** | Immutable runtime settings.                              | [`Config`], [`Cli`]                       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use quotetower::{Config, ContentState, FetchError, MemoryDisplay, QuoteSource, Service};
//!
//! struct Fixed;
//!
//! #[async_trait]
//! impl QuoteSource for Fixed {
//!     async fn fetch(&self) -> Result<ContentState, FetchError> {
//!         Ok(ContentState::new("Stay hungry", "X"))
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (display, log) = MemoryDisplay::new();
//!     let service = Service::builder(Config::default()).build();
//!
//!     // Stop shortly after startup instead of waiting for a signal.
//!     let stop = async {
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         Ok(())
//!     };
//!     service.run_until(display, Arc::new(Fixed), stop).await?;
//!
//!     assert!(log.is_closed());
//!     Ok(())
//! }
//! ```

mod cli;
mod config;
mod content;
mod core;
mod display;
mod error;
mod events;
mod policies;
pub mod queue;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    Arbiter, RefreshEvent, RevealEvent, RevealOutcome, Scheduler, Service, ServiceBuilder,
    TriggerListener, TriggerMessage, TriggerProducer, wait_for_shutdown_signal,
};
pub use cli::Cli;
pub use config::{Config, DEFAULT_TOPIC, RevealPacing};
pub use content::{
    ContentState, DEFAULT_QUOTES_URL, HttpQuoteSource, QuoteEnvelope, QuoteRecord, QuoteSource,
};
pub use display::{
    DEFAULT_FONT, Display, DisplayCall, DisplayLog, MemoryDisplay, PaintMode, Reply, Request, Rgb,
    Roll, RollMode, TextCommand, TowerClient,
};
pub use error::{DisplayError, FetchError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
