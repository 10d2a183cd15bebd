//! `HTTPRequest` — verb, path, [`Headers`], [`Body`].
//!
//! Constructed by the caller; the engine only ever adds headers the caller
//! left absent (see [`crate::wire::encode`]), never removes or overrides one.

use crate::body::Body;
use crate::headers::Headers;

#[derive(Debug)]
pub struct HttpRequest {
    /// Uppercase ASCII verb token (`GET`, `PUT`, ...). The engine imposes
    /// no fixed list; whatever the caller writes here goes on the wire.
    pub verb: String,
    pub path: String,
    pub headers: Headers,
    pub body: Body,
}

impl HttpRequest {
    pub fn new(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            headers: Headers::new(),
            body: Body::empty(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path)
    }

    pub fn put(path: impl Into<String>, body: Body) -> Self {
        let mut r = Self::new("PUT", path);
        r.body = body;
        r
    }

    pub fn post(path: impl Into<String>, body: Body) -> Self {
        let mut r = Self::new("POST", path);
        r.body = body;
        r
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(key, value);
        self
    }
}
