//! # Service configuration.
//!
//! Provides [`Config`], the immutable settings handed to the
//! [`Service`](crate::Service) once at startup (usually built from the CLI,
//! see [`Cli`](crate::Cli)).
//!
//! ## Sentinel values
//! - `refresh_every = 0s` → no refresh ticks
//! - `refetch_every = 0s` → no refetch ticks (the startup quote is kept forever)
//! - `trigger_listen = ""` → no trigger listener (reveals only via [`Service::trigger`](crate::Service::trigger))
//! - `startup_attempts = 0` → treated as 1

use std::time::Duration;

use crate::content::DEFAULT_QUOTES_URL;
use crate::policies::BackoffPolicy;

/// Default topic carrying reveal requests.
pub const DEFAULT_TOPIC: &str = "quotetower/reveal";

/// Timing of the per-character reveal animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealPacing {
    /// How long each character stays on screen.
    pub on: Duration,
    /// How long the blank frame after each character stays on screen.
    pub off: Duration,
}

impl Default for RevealPacing {
    /// `on = 500ms`, `off = 200ms`.
    fn default() -> Self {
        Self {
            on: Duration::from_millis(500),
            off: Duration::from_millis(200),
        }
    }
}

/// Global configuration for the service.
///
/// ## Field semantics
/// - `display_addr`: display server endpoint (`host:port`)
/// - `quotes_url`, `category`, `fetch_timeout`: content source
/// - `topic`, `trigger_listen`: trigger transport
/// - `refresh_every`, `refetch_every`: scheduler cadences (`0s` = off)
/// - `reveal`: reveal animation pacing
/// - `grace`: maximum wait for tasks to stop after a shutdown signal
/// - `startup_attempts`, `startup_backoff`: retry budget for the first fetch
/// - `bus_capacity`: runtime event ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Display server endpoint.
    pub display_addr: String,
    /// Quote-of-the-day endpoint.
    pub quotes_url: String,
    /// Quote category (`""` = any).
    pub category: String,
    /// HTTP timeout for one fetch.
    pub fetch_timeout: Duration,
    /// Topic whose deliveries become reveals.
    pub topic: String,
    /// Listen address of the trigger transport (`""` = disabled).
    pub trigger_listen: String,
    /// Cadence of "re-render current content" ticks.
    pub refresh_every: Duration,
    /// Cadence of "fetch a new quote" ticks.
    pub refetch_every: Duration,
    /// Reveal animation pacing.
    pub reveal: RevealPacing,
    /// Shutdown grace period.
    pub grace: Duration,
    /// Attempts for the startup fetch before giving up.
    pub startup_attempts: u32,
    /// Delays between startup fetch attempts.
    pub startup_backoff: BackoffPolicy,
    /// Capacity of the runtime event bus.
    pub bus_capacity: usize,
}

impl Config {
    /// Refresh cadence, `None` when disabled.
    #[inline]
    pub fn refresh_interval(&self) -> Option<Duration> {
        Some(self.refresh_every).filter(|d| !d.is_zero())
    }

    /// Refetch cadence, `None` when disabled.
    #[inline]
    pub fn refetch_interval(&self) -> Option<Duration> {
        Some(self.refetch_every).filter(|d| !d.is_zero())
    }

    /// Trigger listen address, `None` when disabled.
    #[inline]
    pub fn trigger_addr(&self) -> Option<&str> {
        Some(self.trigger_listen.as_str()).filter(|a| !a.is_empty())
    }

    /// Startup fetch attempts, at least 1.
    #[inline]
    pub fn startup_attempts_clamped(&self) -> u32 {
        self.startup_attempts.max(1)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - display at `localhost:10000`, category `students`
    /// - refresh every 60s, refetch every hour
    /// - reveal pacing 500ms / 200ms
    /// - trigger listener disabled
    /// - `grace = 5s`, 3 startup attempts
    fn default() -> Self {
        Self {
            display_addr: "localhost:10000".to_string(),
            quotes_url: DEFAULT_QUOTES_URL.to_string(),
            category: "students".to_string(),
            fetch_timeout: Duration::from_secs(10),
            topic: DEFAULT_TOPIC.to_string(),
            trigger_listen: String::new(),
            refresh_every: Duration::from_secs(60),
            refetch_every: Duration::from_secs(3600),
            reveal: RevealPacing::default(),
            grace: Duration::from_secs(5),
            startup_attempts: 3,
            startup_backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
        }
    }
}
