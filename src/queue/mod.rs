//! Coalescing queues between the producers and the arbiter.
//!
//! One [`slot`] per event kind. A slot holds at most one pending value and
//! overwrites it on push ("latest wins"), so producers never block and the
//! arbiter never sees a backlog.
//!
//! ## Quick reference
//! ```text
//! Scheduler ──┐ push (overwrite)            pop (wait)
//!             ├──────────► [ refresh slot ] ──────────┐
//! Trigger ────┤                                       ├──► Arbiter
//!             └──────────► [ reveal slot  ] ──────────┘
//! ```

mod slot;

pub use slot::{SlotReceiver, SlotSender, slot};
