//! # Display abstraction.
//!
//! The [`Display`] trait is the only way the arbiter talks to the device.
//! Every method takes `&mut self`: whoever owns the display is the only writer,
//! and each call is awaited before the next one can be issued.
//!
//! ## Call sequences
//! ```text
//! content:  start_drawing → init → write_text(markup) → auto_roll(next) → render
//! reveal:   start_drawing → init → write_text(c, no roll) → render
//! blank:    start_drawing → init → render
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DisplayError;

/// Default bitmap font.
pub const DEFAULT_FONT: &str = "6x8";

/// 24-bit colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `dodgerblue`
    pub const DODGER_BLUE: Rgb = Rgb(30, 144, 255);
    /// `gold`
    pub const GOLD: Rgb = Rgb(255, 215, 0);
    /// `lime`
    pub const LIME: Rgb = Rgb(0, 255, 0);
}

/// How text pixels are combined with the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintMode {
    /// Overwrite background and foreground.
    #[default]
    Paint,
    /// Draw foreground only.
    Over,
}

/// Rolling behaviour of the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    /// No rolling.
    Stop,
    /// Keep the current roll going.
    Continue,
    /// Roll to the next entry, wrapping around.
    Next,
}

/// A `write_text` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCommand {
    /// Text, possibly with inline `<font color="..">` markup.
    pub text: String,
    /// Font name.
    pub font: String,
    /// Horizontal offset.
    pub x: i32,
    /// Default colour.
    pub color: Rgb,
    /// Vertical offset.
    pub y: i32,
    /// Paint mode.
    pub mode: PaintMode,
}

impl TextCommand {
    /// Text at the origin with the default font and colour.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: DEFAULT_FONT.to_string(),
            x: 0,
            color: Rgb::DODGER_BLUE,
            y: 0,
            mode: PaintMode::Paint,
        }
    }
}

/// An `auto_roll` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roll {
    /// Layer the roll applies to.
    pub layer: u8,
    /// Roll mode.
    pub mode: RollMode,
    /// Entry column.
    pub entry: i32,
    /// Separator width.
    pub separator: i32,
}

impl Roll {
    /// Continuous roll used for quotes.
    pub const NEXT: Roll = Roll {
        layer: 0,
        mode: RollMode::Next,
        entry: 0,
        separator: 0,
    };

    /// Rolling disabled, used for reveal characters.
    pub const STOP: Roll = Roll {
        layer: 0,
        mode: RollMode::Stop,
        entry: 0,
        separator: 0,
    };
}

/// A stateful, non-reentrant display device.
#[async_trait]
pub trait Display: Send + 'static {
    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        "display"
    }

    /// Acquires a drawing frame.
    async fn start_drawing(&mut self) -> Result<(), DisplayError>;

    /// Resets the canvas.
    async fn init(&mut self) -> Result<(), DisplayError>;

    /// Writes text onto the canvas.
    async fn write_text(&mut self, text: &TextCommand) -> Result<(), DisplayError>;

    /// Sets the rolling mode.
    async fn auto_roll(&mut self, roll: &Roll) -> Result<(), DisplayError>;

    /// Commits the frame to the device.
    async fn render(&mut self) -> Result<(), DisplayError>;

    /// Releases the connection. Further calls fail with [`DisplayError::Closed`].
    async fn close(&mut self) -> Result<(), DisplayError>;
}

#[async_trait]
impl<D: Display + ?Sized> Display for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }
    async fn start_drawing(&mut self) -> Result<(), DisplayError> {
        (**self).start_drawing().await
    }
    async fn init(&mut self) -> Result<(), DisplayError> {
        (**self).init().await
    }
    async fn write_text(&mut self, text: &TextCommand) -> Result<(), DisplayError> {
        (**self).write_text(text).await
    }
    async fn auto_roll(&mut self, roll: &Roll) -> Result<(), DisplayError> {
        (**self).auto_roll(roll).await
    }
    async fn render(&mut self) -> Result<(), DisplayError> {
        (**self).render().await
    }
    async fn close(&mut self) -> Result<(), DisplayError> {
        (**self).close().await
    }
}
