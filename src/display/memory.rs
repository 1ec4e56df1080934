//! # MemoryDisplay — in-process recording display
//!
//! Records every call and the frames it commits. Used by tests and by the
//! binary's `--dry-run` mode.
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use quotetower::{Display, MemoryDisplay, TextCommand};
//!
//! let (mut display, log) = MemoryDisplay::new();
//! display.start_drawing().await.unwrap();
//! display.init().await.unwrap();
//! display.write_text(&TextCommand::new("A")).await.unwrap();
//! display.render().await.unwrap();
//!
//! assert_eq!(log.frames(), vec!["A".to_string()]);
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::display::{Display, Roll, TextCommand};
use crate::error::DisplayError;

/// A recorded display call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayCall {
    /// `start_drawing`
    StartDrawing,
    /// `init`
    Init,
    /// `write_text`
    WriteText(TextCommand),
    /// `auto_roll`
    AutoRoll(Roll),
    /// `render`
    Render,
    /// `close`
    Close,
}

impl DisplayCall {
    /// Operation name, as used in [`DisplayError::Remote`].
    pub fn op(&self) -> &'static str {
        match self {
            DisplayCall::StartDrawing => "start_drawing",
            DisplayCall::Init => "init",
            DisplayCall::WriteText(_) => "write_text",
            DisplayCall::AutoRoll(_) => "auto_roll",
            DisplayCall::Render => "render",
            DisplayCall::Close => "close",
        }
    }
}

#[derive(Default)]
struct Inner {
    calls: Vec<DisplayCall>,
    frames: Vec<String>,
    canvas: String,
    fail: Vec<&'static str>,
    closed: bool,
}

/// Shared view of what a [`MemoryDisplay`] received.
#[derive(Clone, Default)]
pub struct DisplayLog {
    inner: Arc<Mutex<Inner>>,
}

impl DisplayLog {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call received so far, failed ones included.
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.lock().calls.clone()
    }

    /// Text of every committed frame, in order; a blank frame is `""`.
    pub fn frames(&self) -> Vec<String> {
        self.lock().frames.clone()
    }

    /// Number of calls received so far.
    pub fn len(&self) -> usize {
        self.lock().calls.len()
    }

    /// True if no call was received.
    pub fn is_empty(&self) -> bool {
        self.lock().calls.is_empty()
    }

    /// Makes the next call to `op` fail with [`DisplayError::Remote`].
    ///
    /// Queue the same op several times to fail several calls.
    pub fn fail_next(&self, op: &'static str) {
        self.lock().fail.push(op);
    }

    /// True once the display was closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// [`Display`] that keeps everything in memory.
pub struct MemoryDisplay {
    log: DisplayLog,
}

impl MemoryDisplay {
    /// Creates a display and the log handle observing it.
    pub fn new() -> (Self, DisplayLog) {
        let log = DisplayLog::default();
        (Self { log: log.clone() }, log)
    }

    async fn record(&mut self, call: DisplayCall) -> Result<(), DisplayError> {
        // Give other tasks a chance to run between calls, like a remote device would.
        tokio::task::yield_now().await;

        let mut inner = self.log.lock();
        let op = call.op();
        if inner.closed {
            return Err(DisplayError::Closed);
        }
        let failing = inner.fail.iter().position(|f| *f == op);
        match &call {
            DisplayCall::Init => inner.canvas.clear(),
            DisplayCall::WriteText(t) => inner.canvas.push_str(&t.text),
            DisplayCall::Render if failing.is_none() => {
                let frame = inner.canvas.clone();
                inner.frames.push(frame);
            }
            DisplayCall::Close => inner.closed = true,
            _ => {}
        }
        inner.calls.push(call);
        if let Some(i) = failing {
            inner.fail.remove(i);
            return Err(DisplayError::Remote {
                op,
                message: "injected failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Display for MemoryDisplay {
    fn name(&self) -> &str {
        "memory"
    }

    async fn start_drawing(&mut self) -> Result<(), DisplayError> {
        self.record(DisplayCall::StartDrawing).await
    }

    async fn init(&mut self) -> Result<(), DisplayError> {
        self.record(DisplayCall::Init).await
    }

    async fn write_text(&mut self, text: &TextCommand) -> Result<(), DisplayError> {
        self.record(DisplayCall::WriteText(text.clone())).await
    }

    async fn auto_roll(&mut self, roll: &Roll) -> Result<(), DisplayError> {
        self.record(DisplayCall::AutoRoll(*roll)).await
    }

    async fn render(&mut self) -> Result<(), DisplayError> {
        self.record(DisplayCall::Render).await
    }

    async fn close(&mut self) -> Result<(), DisplayError> {
        self.record(DisplayCall::Close).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_frame_is_empty_string() {
        let (mut d, log) = MemoryDisplay::new();
        d.start_drawing().await.unwrap();
        d.init().await.unwrap();
        d.render().await.unwrap();
        assert_eq!(log.frames(), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let (mut d, log) = MemoryDisplay::new();
        log.fail_next("init");

        assert!(d.init().await.is_err());
        assert!(d.init().await.is_ok());
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_close_refuses_further_calls() {
        let (mut d, log) = MemoryDisplay::new();
        d.close().await.unwrap();
        assert!(log.is_closed());
        assert!(matches!(d.render().await, Err(DisplayError::Closed)));
    }
}
