//! Displayable content and where it comes from.
//!
//! ## Contents
//! - [`ContentState`] the value the arbiter renders, plus its markup
//! - [`QuoteSource`] fetch seam, [`HttpQuoteSource`] the `reqwest` implementation

pub(crate) mod markup;
mod source;
mod state;

pub use source::{DEFAULT_QUOTES_URL, HttpQuoteSource, QuoteEnvelope, QuoteRecord, QuoteSource};
pub use state::ContentState;
