//! Wire codec — MODULE C: request serialization and response parsing over
//! a byte stream, including chunked transfer and gzip decoding.

pub mod chunked;
pub mod decode;
pub mod encode;

pub use decode::read_response;
pub use encode::write_request;

use futures_lite::io::AsyncRead;

use crate::error::Error;

/// Single growable read buffer shared by the status-line/header/chunked
/// parsers. Draws from the underlying stream in amounts no smaller than
/// needed to advance state; never reads past the boundary the caller asks
/// for, so it never consumes bytes belonging to the next response on a
/// keep-alive connection (spec's buffer-hygiene invariant).
pub(crate) struct Buffered<S> {
    stream: S,
    buf: Vec<u8>,
    pos: usize,
}

impl<S: AsyncRead + Unpin> Buffered<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream,
            buf: Vec::new(),
            pos: 0,
        }
    }

    fn unread(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Bytes still sitting in the buffer, unconsumed. Must be 0 once a
    /// response has been fully read on a keep-alive connection.
    pub(crate) fn unread_len(&self) -> usize {
        self.buf.len() - self.pos
    }

    async fn fill_more(&mut self) -> crate::error::Result<usize> {
        use futures_lite::io::AsyncReadExt;
        let mut tmp = [0u8; 4096];
        let n = self.stream.read(&mut tmp).await?;
        if n > 0 {
            self.buf.extend_from_slice(&tmp[..n]);
        }
        Ok(n)
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }

    /// Reads one CRLF-terminated line, the CRLF itself stripped.
    pub(crate) async fn read_line(&mut self) -> crate::error::Result<String> {
        loop {
            if let Some(idx) = find_crlf(self.unread()) {
                let line = String::from_utf8_lossy(&self.unread()[..idx]).into_owned();
                self.pos += idx + 2;
                self.compact();
                return Ok(line);
            }
            if self.fill_more().await? == 0 {
                return Err(Error::wire("connection closed before a full line was read"));
            }
        }
    }

    pub(crate) async fn read_exact(&mut self, n: usize) -> crate::error::Result<Vec<u8>> {
        while self.unread().len() < n {
            if self.fill_more().await? == 0 {
                return Err(Error::wire("connection closed before the expected body length was read"));
            }
        }
        let out = self.unread()[..n].to_vec();
        self.pos += n;
        self.compact();
        Ok(out)
    }

    /// Reads until the peer closes the stream (used for close-delimited
    /// bodies only; never leaves bytes for a next response).
    pub(crate) async fn read_until_eof(&mut self) -> crate::error::Result<Vec<u8>> {
        loop {
            if self.fill_more().await? == 0 {
                break;
            }
        }
        let out = self.unread().to_vec();
        self.pos = self.buf.len();
        self.compact();
        Ok(out)
    }

    /// Reads the status line plus every header line up to and including
    /// the terminating blank line, as one block — the shape `httparse`
    /// expects to parse a response head in one call.
    pub(crate) async fn read_head(&mut self) -> crate::error::Result<Vec<u8>> {
        loop {
            if let Some(idx) = find_double_crlf(self.unread()) {
                let head = self.unread()[..idx + 4].to_vec();
                self.pos += idx + 4;
                self.compact();
                return Ok(head);
            }
            if self.fill_more().await? == 0 {
                return Err(Error::wire("connection closed before a full response head was read"));
            }
        }
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

fn find_double_crlf(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}
