//! Error types used by the quotetower runtime and its collaborators.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`] — errors raised by the service itself (startup, signals, shutdown).
//! - [`FetchError`] — failures of the quote content source.
//! - [`DisplayError`] — failures of a display call sequence.
//!
//! All of them provide `as_label` (stable snake_case, for logs and events).
//! Fetch and display errors are recoverable: they cost one cycle, never the process.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the quotetower service.
///
/// These abort [`Service::run`](crate::Service::run) and should end the process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No valid starting state: the display or the first quote could not be obtained.
    #[error("startup failed: {reason}")]
    Startup {
        /// What was being set up and why it failed.
        reason: String,
    },

    /// Registering OS signal handlers failed.
    #[error("signal registration failed: {0}")]
    Signal(#[source] std::io::Error),

    /// The trigger listener could not bind its address.
    #[error("trigger listener bind {addr} failed: {source}")]
    Bind {
        /// Requested listen address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Shutdown grace period was exceeded; some tasks remained stuck and were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the tasks that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use quotetower::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Startup { .. } => "runtime_startup",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::Bind { .. } => "runtime_bind",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Wraps a startup failure of `what`.
    pub fn startup(what: &str, err: impl std::fmt::Display) -> Self {
        RuntimeError::Startup {
            reason: format!("{what}: {err}"),
        }
    }
}

/// # Errors produced while fetching a quote.
///
/// Transport failures and protocol failures (an empty or malformed payload)
/// are handled the same way: the refetch cycle is skipped and the previous
/// content stays authoritative.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The content service answered with a non-success status.
    #[error("unexpected status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The body was not a valid quote envelope.
    #[error("unable to decode quote: {0}")]
    Decode(String),

    /// The envelope reported no quotes (`success.total < 1` or an empty list).
    #[error("invalid quote: success total {total}")]
    Empty {
        /// The reported success count.
        total: i64,
    },
}

impl FetchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "fetch_transport",
            FetchError::Status { .. } => "fetch_status",
            FetchError::Decode(_) => "fetch_decode",
            FetchError::Empty { .. } => "fetch_empty",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// # Errors produced by a display call.
///
/// Any of these abandons the remaining steps of the current call sequence.
/// The device is left in whatever partial state resulted.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DisplayError {
    /// Establishing the connection failed.
    #[error("connect {addr} failed: {source}")]
    Connect {
        /// Endpoint address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the connection failed.
    #[error("display i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The device rejected an operation.
    #[error("{op} rejected by display: {message}")]
    Remote {
        /// Operation name.
        op: &'static str,
        /// Message returned by the device.
        message: String,
    },

    /// The device sent something that is not a valid reply.
    #[error("display protocol error: {0}")]
    Protocol(String),

    /// The connection was closed (by the peer or by [`Display::close`](crate::Display::close)).
    #[error("display connection closed")]
    Closed,
}

impl DisplayError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use quotetower::DisplayError;
    ///
    /// let err = DisplayError::Remote { op: "render", message: "busy".into() };
    /// assert_eq!(err.as_label(), "display_remote");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DisplayError::Connect { .. } => "display_connect",
            DisplayError::Io(_) => "display_io",
            DisplayError::Remote { .. } => "display_remote",
            DisplayError::Protocol(_) => "display_protocol",
            DisplayError::Closed => "display_closed",
        }
    }
}
