//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out,
//! and the built-in [`LogWriter`] that turns runtime events into `tracing` records.
//!
//! ## Architecture
//! ```text
//! Arbiter/Scheduler/Trigger ── publish(Event) ──► Bus ──► Service listener
//!                                                              │
//!                                                      SubscriberSet::emit
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter   Custom     ...
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
