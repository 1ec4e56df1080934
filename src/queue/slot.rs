//! # Single-slot coalescing queue.
//!
//! [`slot`] creates a connected ([`SlotSender`], [`SlotReceiver`]) pair sharing one
//! buffer of capacity 1.
//!
//! ## Rules
//! - **Non-blocking push**: [`SlotSender::push`] stores the value and returns. It never fails.
//! - **Latest wins**: a push into a full slot overwrites the pending value; the old one is dropped.
//! - **Blocking pop**: [`SlotReceiver::pop`] waits until a value is present, then empties the slot.
//! - **Close**: once every sender is dropped and the slot is empty, `pop` returns `None`.
//!
//! ## Concurrency
//! - Senders are `Clone`; pushes from several producers are serialized by a short lock.
//! - There is exactly one receiver (it is not `Clone`).
//! - `pop` is cancel-safe: a value is only taken in the same poll that returns it,
//!   so using it as a `tokio::select!` branch never loses an event.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

struct State<T> {
    value: Option<T>,
    senders: usize,
    coalesced: u64,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // Critical sections never panic; a poisoned lock still holds a consistent slot.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer half of a coalescing slot.
pub struct SlotSender<T> {
    shared: Arc<Shared<T>>,
}

/// Consumer half of a coalescing slot.
pub struct SlotReceiver<T> {
    shared: Arc<Shared<T>>,
}

/// Creates a new empty single-slot queue.
///
/// # Example
/// ```
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let (tx, mut rx) = quotetower::queue::slot();
///     tx.push("a");
///     tx.push("b");
///     assert_eq!(rx.pop().await, Some("b"));
/// }
/// ```
pub fn slot<T>() -> (SlotSender<T>, SlotReceiver<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            value: None,
            senders: 1,
            coalesced: 0,
        }),
        notify: Notify::new(),
    });
    (
        SlotSender {
            shared: Arc::clone(&shared),
        },
        SlotReceiver { shared },
    )
}

impl<T> SlotSender<T> {
    /// Stores `value`, replacing any value still pending.
    ///
    /// Returns `true` if an older value was overwritten.
    pub fn push(&self, value: T) -> bool {
        let replaced = {
            let mut st = self.shared.lock();
            let replaced = st.value.replace(value).is_some();
            if replaced {
                st.coalesced += 1;
            }
            replaced
        };
        self.shared.notify.notify_one();
        replaced
    }
}

impl<T> Clone for SlotSender<T> {
    fn clone(&self) -> Self {
        self.shared.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for SlotSender<T> {
    fn drop(&mut self) {
        let last = {
            let mut st = self.shared.lock();
            st.senders -= 1;
            st.senders == 0
        };
        if last {
            self.shared.notify.notify_one();
        }
    }
}

impl<T> SlotReceiver<T> {
    /// Waits for a value and takes it, leaving the slot empty.
    ///
    /// Returns `None` once all senders are gone and nothing is pending.
    pub async fn pop(&mut self) -> Option<T> {
        loop {
            {
                let mut st = self.shared.lock();
                if let Some(v) = st.value.take() {
                    return Some(v);
                }
                if st.senders == 0 {
                    return None;
                }
            }
            // `notify_one` keeps a permit when nobody waits, so a push racing
            // with this point still wakes us.
            self.shared.notify.notified().await;
        }
    }

    /// Takes the pending value without waiting.
    pub fn try_pop(&mut self) -> Option<T> {
        self.shared.lock().value.take()
    }

    /// True if a value is pending.
    pub fn is_ready(&self) -> bool {
        self.shared.lock().value.is_some()
    }

    /// Number of values dropped because a newer one overwrote them.
    pub fn coalesced(&self) -> u64 {
        self.shared.lock().coalesced
    }
}
