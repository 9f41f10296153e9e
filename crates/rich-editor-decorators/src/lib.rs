//! `rich-editor-decorators` - Regex-based decorator strategies for `rich-editor-core`.
//!
//! Lightweight matchers for inline entities that are recognizable from text alone (links,
//! hashtags, `@handles`). Each [`RegexStrategy`] plugs into a
//! [`CompositeDecorator`](rich_editor_core::CompositeDecorator); the presets below build a
//! ready-to-use decorator.

use rich_editor_core::{CompositeDecorator, ContentBlock, DecoratorStrategy};
use regex::Regex;
use tracing::trace;

/// A decorator strategy that reports every regex match within a block.
#[derive(Debug, Clone)]
pub struct RegexStrategy {
    regex: Regex,
    capture_group: Option<usize>,
}

impl RegexStrategy {
    /// Compile `pattern`.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            capture_group: None,
        })
    }

    /// Decorate only a capture group of each match.
    ///
    /// Example (hashtag not glued to a preceding word):
    /// - pattern: `(?:^|[^\w#])(#\w+)`
    /// - capture_group: `1` (the tag, without the leading separator)
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    /// The compiled pattern.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl DecoratorStrategy for RegexStrategy {
    fn find_ranges(&self, block: &ContentBlock, found: &mut dyn FnMut(usize, usize)) {
        let text = block.text();
        let mut matches = 0usize;

        let mut report = |start: usize, end: usize| {
            if let Some((start, end)) = char_range(text, start, end) {
                matches += 1;
                found(start, end);
            }
        };

        match self.capture_group {
            Some(group) => {
                for caps in self.regex.captures_iter(text) {
                    if let Some(m) = caps.get(group) {
                        report(m.start(), m.end());
                    }
                }
            }
            None => {
                for m in self.regex.find_iter(text) {
                    report(m.start(), m.end());
                }
            }
        }

        if matches > 0 {
            trace!(pattern = self.regex.as_str(), matches, block = %block.key(), "regex matches");
        }
    }
}

/// Strategy index of links in [`default_decorator`].
pub const LINK_STRATEGY: usize = 0;
/// Strategy index of `@handles` in [`default_decorator`].
pub const HANDLE_STRATEGY: usize = 1;
/// Strategy index of `#hashtags` in [`default_decorator`].
pub const HASHTAG_STRATEGY: usize = 2;

/// `http://` and `https://` links up to the next whitespace.
pub fn link_strategy() -> Result<RegexStrategy, regex::Error> {
    RegexStrategy::new(r#"\bhttps?://[^\s<>"']+"#)
}

/// `@handle` mentions not glued to a preceding word.
pub fn handle_strategy() -> Result<RegexStrategy, regex::Error> {
    Ok(RegexStrategy::new(r"(?:^|[^\w@])(@\w+)")?.with_capture_group(1))
}

/// `#hashtag`s not glued to a preceding word.
pub fn hashtag_strategy() -> Result<RegexStrategy, regex::Error> {
    Ok(RegexStrategy::new(r"(?:^|[^\w#])(#\w+)")?.with_capture_group(1))
}

/// Links, handles, and hashtags, in that order of precedence.
pub fn default_decorator() -> Result<CompositeDecorator, regex::Error> {
    Ok(CompositeDecorator::default()
        .with_strategy(link_strategy()?)
        .with_strategy(handle_strategy()?)
        .with_strategy(hashtag_strategy()?))
}

/// Convert a byte range of `text` into a non-empty char range.
fn char_range(text: &str, start_byte: usize, end_byte: usize) -> Option<(usize, usize)> {
    if start_byte >= end_byte || end_byte > text.len() {
        return None;
    }
    let start = text[..start_byte].chars().count();
    let end = start + text[start_byte..end_byte].chars().count();
    Some((start, end))
}
