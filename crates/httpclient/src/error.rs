//! The closed error taxonomy the engine surfaces to callers.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! side is always one of the variants below. There is no generic "other"
//! bucket: a caller matching on [`Error`] can rely on the list being
//! exhaustive for what this crate itself can fail with.

use std::fmt;

use crate::body::Body;

pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong performing an HTTP exchange.
#[derive(Debug)]
pub enum Error {
    /// The URL parser did not consume the full input.
    MalformedUrl(String),
    /// DNS resolution failed for every candidate resolver.
    Resolve(String),
    /// TCP connect failed against every resolved endpoint.
    Connect(String),
    /// The TLS handshake completed at the transport level but certificate
    /// verification (chain, expiry, or hostname identity) failed.
    TlsVerify(String),
    /// TLS graceful shutdown returned something other than one of the
    /// benign outcomes documented on [`crate::connection::Connection::close`].
    TlsShutdown(String),
    /// The response status line, a header line, or the chunked framing was
    /// malformed.
    WireParse(String),
    /// The wire exchange completed but the status line's reason phrase was
    /// not the literal word `OK`. Carries the numeric code and the body
    /// that was read before this error was raised.
    HttpStatus { code: u16, body: Body },
    /// Reading or writing a [`Body`]'s backing storage failed.
    Io(std::io::Error),
}

impl Error {
    pub(crate) fn wire(msg: impl Into<String>) -> Self {
        Error::WireParse(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedUrl(s) => write!(f, "malformed URL: {s}"),
            Error::Resolve(s) => write!(f, "DNS resolution failed: {s}"),
            Error::Connect(s) => write!(f, "connect failed: {s}"),
            Error::TlsVerify(s) => write!(f, "TLS verification failed: {s}"),
            Error::TlsShutdown(s) => write!(f, "TLS shutdown failed: {s}"),
            Error::WireParse(s) => write!(f, "malformed HTTP wire data: {s}"),
            Error::HttpStatus { code, .. } => write!(f, "non-OK HTTP status: {code}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
