//! `HTTPResponse` — numeric status, [`Headers`], [`Body`].

use crate::body::Body;
use crate::headers::Headers;

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    /// The status line's reason phrase, verbatim. Only the literal word
    /// `OK` is treated as success (spec §9 open question, resolved in
    /// DESIGN.md: kept as the original behaves rather than switched to
    /// "2xx is success").
    pub reason: String,
    pub headers: Headers,
    /// Pre-initialized by the caller (e.g. file-backed) when the response
    /// should stream straight to disk; otherwise starts empty and the
    /// decoder fills it in place.
    pub body: Body,
}

impl HttpResponse {
    pub(crate) fn new(status: u16, reason: String, headers: Headers, body: Body) -> Self {
        Self {
            status,
            reason,
            headers,
            body,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.reason == "OK"
    }
}
