//! Runtime core: arbitration and lifecycle.
//!
//! The public entry point is [`Service`], which wires the queues, fetches the
//! first quote and supervises the tasks below until shutdown.
//!
//! Internal modules:
//! - [`arbiter`]: sole owner of the display; consumes both queues;
//! - [`scheduler`]: timed refresh and refetch producer;
//! - [`trigger`]: external reveal producer and its TCP transport;
//! - [`service`]: startup, task wiring, graceful shutdown;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod arbiter;
mod scheduler;
mod service;
mod shutdown;
mod trigger;

pub use arbiter::{Arbiter, RefreshEvent, RevealEvent, RevealOutcome};
pub use scheduler::Scheduler;
pub use service::{Service, ServiceBuilder};
pub use shutdown::wait_for_shutdown_signal;
pub use trigger::{TriggerListener, TriggerMessage, TriggerProducer};
