//! Retry timing for the startup content fetch.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy applied on top of the base delay
//!
//! ## Quick wiring
//! ```text
//! Config { startup_attempts, startup_backoff: BackoffPolicy }
//!      └─► core::service::initial_fetch uses:
//!           - startup_backoff.next(attempt) between failed fetches
//!           - startup_attempts as the budget before RuntimeError::Startup
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=500ms, factor=2.0, max=10s, jitter=Equal.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
