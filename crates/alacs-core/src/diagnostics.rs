//! Positioned error items and the aggregated `thiserror`/`miette` error
//! raised by a public [`crate::engine::Engine`] operation whenever its
//! scratch error list is non-empty when the call completes.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Headline for a failed [`crate::engine::Engine::decode`].
pub const DECODE_HEADLINE: &str = "parse errors";
/// Headline for a failed [`crate::engine::Engine::encode`].
pub const ENCODE_HEADLINE: &str = "encode errors";
/// Headline for a failed [`crate::engine::Engine::to_plain`].
pub const TO_PLAIN_HEADLINE: &str = "illegal non-`Value` data";
/// Headline for a failed [`crate::engine::Engine::from_plain`].
pub const FROM_PLAIN_HEADLINE: &str = "can't be converted to `Value`";

/// Where the path sits relative to the message. Decode/encode errors
/// trail it (`#<line>: <message> @<path>`, spec §7); the plain-data
/// bridge leads with it instead (`#<line>: @<path>: <message>`), per
/// `unit_tests.py`'s literal `TestPython`/`TestFile` assertions (e.g.
/// `"#0: @.k: value is <class 'ellipsis'>"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStyle {
    TrailingPath,
    LeadingPath,
}

/// One positioned failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorItem {
    pub line: usize,
    pub path: String,
    pub message: String,
    pub style: ErrorStyle,
}

impl ErrorItem {
    #[must_use]
    pub fn new(line: usize, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_style(line, path, message, ErrorStyle::TrailingPath)
    }

    #[must_use]
    pub fn with_style(line: usize, path: impl Into<String>, message: impl Into<String>, style: ErrorStyle) -> Self {
        Self {
            line,
            path: path.into(),
            message: message.into(),
            style,
        }
    }
}

impl fmt::Display for ErrorItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            ErrorStyle::TrailingPath => write!(f, "#{}: {} @{}", self.line, self.message, self.path),
            ErrorStyle::LeadingPath => write!(f, "#{}: @{}: {}", self.line, self.path, self.message),
        }
    }
}

/// The failure raised by a public engine operation once its scratch
/// error list is non-empty: a headline identifying the phase, followed
/// by every item tab-indented, one per line.
#[derive(Debug, Error, Diagnostic)]
#[error("{headline}:\n{body}")]
pub struct AggregatedError {
    headline: &'static str,
    body: String,
    pub items: Vec<ErrorItem>,
}

impl AggregatedError {
    #[must_use]
    pub fn new(headline: &'static str, items: Vec<ErrorItem>) -> Self {
        let body = items
            .iter()
            .map(|item| format!("\t{item}"))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            headline,
            body,
            items,
        }
    }
}

/// The engine's reusable scratch error list, invalidated at the start
/// of each public call.
#[derive(Debug, Default)]
pub struct ErrorList(Vec<ErrorItem>);

impl ErrorList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: usize, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ErrorItem::new(line, path, message));
    }

    /// Like [`Self::push`], but rendered `#<line>: @<path>: <message>`
    /// (the plain-data bridge's convention; see [`ErrorStyle`]).
    pub fn push_leading_path(&mut self, line: usize, path: impl Into<String>, message: impl Into<String>) {
        self.0
            .push(ErrorItem::with_style(line, path, message, ErrorStyle::LeadingPath));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[ErrorItem] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Drain the list into an [`AggregatedError`] if non-empty, leaving
    /// it cleared either way.
    pub fn finish(&mut self, headline: &'static str) -> Option<AggregatedError> {
        if self.0.is_empty() {
            return None;
        }
        Some(AggregatedError::new(headline, std::mem::take(&mut self.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorList, DECODE_HEADLINE};

    #[test]
    fn empty_list_finishes_to_none() {
        let mut errors = ErrorList::new();
        assert!(errors.finish(DECODE_HEADLINE).is_none());
    }

    #[test]
    fn non_empty_list_renders_tab_indented_body() {
        let mut errors = ErrorList::new();
        errors.push(2, "", "more than one blank line");
        errors.push(3, "/k", "duplicate key: k");
        let aggregated = errors.finish(DECODE_HEADLINE).unwrap();
        assert_eq!(
            aggregated.to_string(),
            "parse errors:\n\t#2: more than one blank line @\n\t#3: duplicate key: k @/k"
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn leading_path_style_puts_path_before_message() {
        let mut errors = ErrorList::new();
        errors.push_leading_path(0, ".k", "value is text");
        let aggregated = errors.finish("can't be converted to `Value`").unwrap();
        assert_eq!(aggregated.items[0].to_string(), "#0: @.k: value is text");
    }

    #[test]
    fn item_display_is_line_then_path_then_message() {
        let mut errors = ErrorList::new();
        errors.push(2, "/", "more than one blank line");
        let aggregated = errors.finish(DECODE_HEADLINE).unwrap();
        assert_eq!(aggregated.items[0].to_string(), "#2: more than one blank line @/");
    }
}
