//! # What the display should show.
//!
//! [`ContentState`] is a plain value. The arbiter owns the authoritative copy;
//! everybody else only ever holds snapshots and sends whole replacements.

use crate::content::markup::escape_into;

/// Current displayable content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentState {
    /// Quote text.
    pub quote: Option<String>,
    /// Quote author.
    pub author: Option<String>,
}

impl ContentState {
    /// Creates a state holding `quote` attributed to `author`.
    pub fn new(quote: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            quote: Some(quote.into()),
            author: Some(author.into()),
        }
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.quote.is_none() && self.author.is_none()
    }

    /// Renders the display markup for this content.
    ///
    /// ```
    /// use quotetower::ContentState;
    ///
    /// let m = ContentState::new("Stay hungry", "X").markup();
    /// assert!(m.contains(r#"<font color="dodgerblue">Stay hungry</font>"#));
    /// assert!(m.contains(r#"<font color="gold">(X)</font>"#));
    /// ```
    pub fn markup(&self) -> String {
        let mut out = String::from("<text>");
        if let Some(quote) = &self.quote {
            out.push_str(r#"<font color="dodgerblue">"#);
            escape_into(&mut out, quote);
            out.push_str("</font> ");
        }
        if let Some(author) = &self.author {
            out.push_str(r#"<font color="gold">("#);
            escape_into(&mut out, author);
            out.push_str(")</font> ");
        }
        if !self.is_empty() {
            out.push_str(r#"<font color="lime">&gt;&gt;&gt;</font> "#);
        }
        out.push_str("</text>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_full() {
        let m = ContentState::new("Stay hungry", "X").markup();
        assert_eq!(
            m,
            r#"<text><font color="dodgerblue">Stay hungry</font> <font color="gold">(X)</font> <font color="lime">&gt;&gt;&gt;</font> </text>"#
        );
    }

    #[test]
    fn test_markup_escapes_tags() {
        let m = ContentState::new("a <b> & c", "<me>").markup();
        assert!(m.contains("a &lt;b&gt; &amp; c"));
        assert!(m.contains("(&lt;me&gt;)"));
    }

    #[test]
    fn test_markup_without_author() {
        let s = ContentState {
            quote: Some("only".into()),
            author: None,
        };
        let m = s.markup();
        assert!(m.contains("only"));
        assert!(!m.contains("gold"));
    }

    #[test]
    fn test_markup_empty() {
        assert_eq!(ContentState::default().markup(), "<text></text>");
    }
}
