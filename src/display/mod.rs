//! The display device and its implementations.
//!
//! ## Contents
//! - [`Display`] the non-reentrant device contract (`&mut self` everywhere)
//! - [`TextCommand`], [`Roll`], [`Rgb`], [`PaintMode`], [`RollMode`] call parameters
//! - [`TowerClient`] line-delimited JSON over TCP
//! - [`MemoryDisplay`] in-process recorder (tests, dry runs)

mod client;
mod device;
mod memory;

pub use client::{Reply, Request, TowerClient};
pub use device::{DEFAULT_FONT, Display, PaintMode, Rgb, Roll, RollMode, TextCommand};
pub use memory::{DisplayCall, DisplayLog, MemoryDisplay};
