//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the arbiter, the producers
//! and the service.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! Runtime events are observability only. The display itself is driven through
//! the coalescing queues in [`crate::queue`], never through the bus.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
