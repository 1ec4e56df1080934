//! # Quote-of-the-day source.
//!
//! [`QuoteSource`] is the seam between the scheduler and the remote content
//! service. [`HttpQuoteSource`] implements it over `reqwest`.
//!
//! ## Wire format
//! ```text
//! GET {base}?category={category}
//!
//! { "success":  { "total": 1 },
//!   "contents": { "quotes": [ { "quote": "...", "author": "...", ... } ],
//!                 "copyright": "..." } }
//! ```
//! `success.total < 1` or an empty `quotes` list is a [`FetchError::Empty`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::content::ContentState;
use crate::error::FetchError;

/// Default quote-of-the-day endpoint.
pub const DEFAULT_QUOTES_URL: &str = "http://quotes.rest/qod.json";

/// Something that can produce a fresh [`ContentState`].
#[async_trait]
pub trait QuoteSource: Send + Sync + 'static {
    /// Fetches the current quote.
    async fn fetch(&self) -> Result<ContentState, FetchError>;
}

#[derive(Debug, Default, Deserialize)]
struct Success {
    #[serde(default)]
    total: i64,
}

/// One quote record as served by the content service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteRecord {
    /// Quote text.
    pub quote: String,
    /// Author, if known.
    #[serde(default)]
    pub author: Option<String>,
    /// Length as reported by the service (a string on the wire).
    #[serde(default)]
    pub length: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Category the quote was picked from.
    #[serde(default)]
    pub category: Option<String>,
    /// Date the quote is for.
    #[serde(default)]
    pub date: Option<String>,
    /// Title of the quote of the day.
    #[serde(default)]
    pub title: Option<String>,
    /// Background image URL.
    #[serde(default)]
    pub background: Option<String>,
    /// Service identifier.
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Contents {
    #[serde(default)]
    quotes: Vec<QuoteRecord>,
    #[serde(default)]
    #[allow(dead_code)]
    copyright: Option<String>,
}

/// Quote-of-the-day response envelope.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteEnvelope {
    #[serde(default)]
    success: Success,
    #[serde(default)]
    contents: Contents,
}

impl QuoteEnvelope {
    /// Parses an envelope from a JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Extracts the first quote, rejecting envelopes that report no success.
    pub fn into_content(self) -> Result<ContentState, FetchError> {
        let total = self.success.total;
        if total < 1 {
            return Err(FetchError::Empty { total });
        }
        let first = self
            .contents
            .quotes
            .into_iter()
            .next()
            .ok_or(FetchError::Empty { total })?;

        Ok(ContentState {
            quote: Some(first.quote),
            author: first.author.filter(|a| !a.is_empty()),
        })
    }
}

/// [`QuoteSource`] backed by the quote-of-the-day HTTP API.
#[derive(Clone, Debug)]
pub struct HttpQuoteSource {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl HttpQuoteSource {
    /// Creates a source for `base`, filtering by `category` unless it is empty.
    pub fn new(base: &str, category: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut url =
            reqwest::Url::parse(base).map_err(|e| FetchError::Transport(e.to_string()))?;
        if !category.is_empty() {
            url.query_pairs_mut().append_pair("category", category);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client, url })
    }

    /// Full request URL, query included.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch(&self) -> Result<ContentState, FetchError> {
        tracing::debug!(url = %self.url, "fetching quote of the day");
        let res = self.client.get(self.url.clone()).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = res.bytes().await?;
        QuoteEnvelope::from_slice(&body)?.into_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_first_quote() {
        let body = br#"{
            "success": {"total": 1},
            "contents": {
                "quotes": [{"quote": "Stay hungry", "author": "X", "tags": ["a"], "id": "q1"}],
                "copyright": "2017-19 theysaidso.com"
            }
        }"#;
        let content = QuoteEnvelope::from_slice(body).unwrap().into_content().unwrap();
        assert_eq!(content, ContentState::new("Stay hungry", "X"));
    }

    #[test]
    fn test_envelope_zero_total_is_empty() {
        let body = br#"{"success": {"total": 0}, "contents": {"quotes": []}}"#;
        let err = QuoteEnvelope::from_slice(body).unwrap().into_content().unwrap_err();
        assert!(matches!(err, FetchError::Empty { total: 0 }));
        assert_eq!(err.as_label(), "fetch_empty");
    }

    #[test]
    fn test_envelope_missing_quotes_is_empty() {
        let body = br#"{"success": {"total": 3}, "contents": {}}"#;
        let err = QuoteEnvelope::from_slice(body).unwrap().into_content().unwrap_err();
        assert!(matches!(err, FetchError::Empty { total: 3 }));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let err = QuoteEnvelope::from_slice(b"<html>").unwrap_err();
        assert_eq!(err.as_label(), "fetch_decode");
    }

    #[test]
    fn test_url_carries_category() {
        let src =
            HttpQuoteSource::new(DEFAULT_QUOTES_URL, "students", Duration::from_secs(1)).unwrap();
        assert_eq!(src.url(), "http://quotes.rest/qod.json?category=students");

        let src = HttpQuoteSource::new(DEFAULT_QUOTES_URL, "", Duration::from_secs(1)).unwrap();
        assert_eq!(src.url(), "http://quotes.rest/qod.json");
    }
}
