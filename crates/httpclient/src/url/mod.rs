//! URL & HostInfo — MODULE A.
//!
//! `HostInfo` is the origin key the connection pool and job scheduler group
//! connections by. `URL` adds the path and query that a single request needs
//! on top of that origin.

mod parser;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// `scheme://[user[:pass]@]host[:port]` — the tuple that keys a connection
/// pool. Two `HostInfo`s are equal iff all five fields are equal; a
/// `HostInfo` is `Ord` so it can key a `BTreeMap`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostInfo {
    pub scheme: Scheme,
    pub hostname: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl HostInfo {
    /// The effective port: the explicit one if present, else the scheme's
    /// default (443 for https, 80 for http).
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(self.scheme.default_port())
    }

    pub fn is_ssl(&self) -> bool {
        matches!(self.scheme, Scheme::Https)
    }

    /// `host:port`, suitable for DNS resolution / `TcpStream::connect`.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.hostname, self.port())
    }
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme.as_str())?;
        if let Some(user) = &self.username {
            write!(f, "{user}")?;
            if let Some(pass) = &self.password {
                write!(f, ":{pass}")?;
            }
            write!(f, "@")?;
        }
        write!(f, "{}", self.hostname)?;
        if let Some(port) = self.port
            && port != self.scheme.default_port()
        {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

pub type QueryParameters = BTreeMap<String, String>;

/// A `HostInfo` plus the path and query a single request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub host: HostInfo,
    /// Empty, or starting with `/`. Percent-escapes are kept verbatim.
    pub path: String,
    /// Raw (not percent-decoded) key/value pairs, ordered by key.
    pub query: QueryParameters,
}

impl Url {
    pub fn parse(input: &str) -> Result<Self> {
        parser::parse(input)
    }

    /// Renders back to a string with default ports elided. Round-trips with
    /// `parse` for any well-formed input modulo that elision.
    pub fn render(&self) -> String {
        let mut out = self.host.to_string();
        out.push_str(&self.path);
        if !self.query.is_empty() {
            out.push('?');
            let mut first = true;
            for (k, v) in &self.query {
                if !first {
                    out.push('&');
                }
                first = false;
                out.push_str(k);
                out.push('=');
                out.push_str(v);
            }
        }
        out
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl std::str::FromStr for Url {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Url::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_elided_on_render() {
        let url = Url::parse("http://example.com/a").unwrap();
        assert_eq!(url.render(), "http://example.com/a");
        let url = Url::parse("https://example.com:443/a").unwrap();
        assert_eq!(url.render(), "https://example.com/a");
    }

    #[test]
    fn non_default_port_kept() {
        let url = Url::parse("http://example.com:8080/a").unwrap();
        assert_eq!(url.render(), "http://example.com:8080/a");
    }

    #[test]
    fn host_info_equality_ignores_path() {
        let a = Url::parse("https://u:p@example.com:8443/a?x=1").unwrap();
        let b = Url::parse("https://u:p@example.com:8443/b").unwrap();
        assert_eq!(a.host, b.host);
    }
}
