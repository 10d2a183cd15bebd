//! Ordered header list shared by [`crate::request::HttpRequest`] and
//! [`crate::response::HttpResponse`].
//!
//! Grounded on the teacher's single-pair `Header` (`serve/common/header.rs`)
//! grown into the ordered collection both the request and response sides
//! need; a single line still parses with [`Header::from_str`].

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key_eq_ignore_ascii_case(&self, other: &str) -> bool {
        self.key.eq_ignore_ascii_case(other)
    }
}

impl FromStr for Header {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_end_matches(['\r', '\n']);
        let (key, value) = trimmed
            .split_once(':')
            .ok_or_else(|| Error::wire(format!("malformed header line: {s:?}")))?;
        Ok(Self::new(key.trim(), value.trim()))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// Ordered, insertion-preserving list of headers. Lookup by name is
/// case-sensitive as stored (`get`); the wire decoder uses
/// `get_ignore_ascii_case` for the small set of headers it interprets so
/// that it tolerates whatever casing a server sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<Header>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(Header::new(key, value));
    }

    /// Sets the header, replacing every existing entry with that name
    /// (case-insensitive), preserving the position of the first match.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut seen = false;
        self.0.retain_mut(|h| {
            if !h.key_eq_ignore_ascii_case(&key) {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            h.value.clone_from(&value);
            true
        });
        if !seen {
            self.0.push(Header::new(key, value));
        }
    }

    /// Sets the header only if no header of that name (case-insensitive)
    /// is already present. Used to inject defaults without clobbering a
    /// caller-supplied value.
    pub fn set_if_absent(&mut self, key: &str, value: impl Into<String>) {
        if !self.contains(key) {
            self.0.push(Header::new(key, value));
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|h| h.key_eq_ignore_ascii_case(key))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|h| h.key == key)
            .map(|h| h.value.as_str())
    }

    pub fn get_ignore_ascii_case(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|h| h.key_eq_ignore_ascii_case(key))
            .map(|h| h.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Headers {
    type Item = Header;
    type IntoIter = std::vec::IntoIter<Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_if_absent_does_not_clobber() {
        let mut h = Headers::new();
        h.push("Host", "example.com");
        h.set_if_absent("Host", "other.com");
        assert_eq!(h.get("Host"), Some("example.com"));
    }

    #[test]
    fn lookup_is_case_insensitive_variant_available() {
        let mut h = Headers::new();
        h.push("content-length", "17");
        assert_eq!(h.get("Content-Length"), None);
        assert_eq!(h.get_ignore_ascii_case("Content-Length"), Some("17"));
    }

    #[test]
    fn header_line_parses() {
        let h: Header = "Content-Type: text/plain\r\n".parse().unwrap();
        assert_eq!(h.key, "Content-Type");
        assert_eq!(h.value, "text/plain");
    }
}
