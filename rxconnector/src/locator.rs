//! Locator strings and extraction of the addressable element tag.
//!
//! A locator is an XPath-like path such as `/form[@title='Login']/text[@name='user']`.
//! The element kind the backend has to materialize is named by one of the trailing
//! segments; which one depends on how the path ends.

use std::fmt;

/// An immutable, path-like address of one UI element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segments of the path, split naively on `/`.
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').collect()
    }

    /// Raw (unvalidated) tag text of the element this locator addresses.
    pub fn tag(&self) -> &str {
        extract_tag(&self.0)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Locator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extracts the element tag from a locator. Never fails; an empty result means
/// no element was entered.
///
/// Rules are tried in order, predicate detection first:
///
/// 1. last segment holds a `[` predicate: text before the `[`
/// 2. the previous segment opened a `[` and the last one closes it with `]`, i.e. a
///    `/` inside the predicate value fragmented the split: text before the `[` of
///    the previous segment
/// 3. last segment is a `..` parent step: the segment three from the end
/// 4. otherwise the last segment itself
///
/// A `..` locator must have at least three segments. Shorter ones yield an empty
/// tag instead of a guessed one.
pub fn extract_tag(locator: &str) -> &str {
    let segments: Vec<&str> = locator.split('/').collect();
    let n = segments.len();
    let last = segments[n - 1];

    if let Some((tag, _)) = last.split_once('[') {
        return tag;
    }

    if n >= 2 {
        let previous = segments[n - 2];
        if previous.contains('[') && last.contains(']') {
            if let Some((tag, _)) = previous.split_once('[') {
                return tag;
            }
        }
    }

    if last.contains("..") {
        return if n >= 3 { segments[n - 3] } else { "" };
    }

    last
}
