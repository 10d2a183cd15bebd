//! Response parsing state machine S0..S6 (MODULE C, read side).
//!
//! Grounded on `HTTP_ReadReply.hpp`'s `readHTTPReply`: read the status
//! line, read headers until a bare CRLF, pick a body framing from the
//! headers observed, read the body under that framing, interpose gzip
//! after framing is resolved, decide keep-alive from `Connection: close`.
//! The status-line/header block (S0/S1) is parsed with `httparse`, the
//! same crate `httproxy`/`httpserver` use for HTTP head bytes elsewhere
//! in the pack; body framing, chunked decoding and gzip are hand-rolled
//! on top since `httparse` only parses the head, not the body.

use async_compression::futures::bufread::GzipDecoder;
use futures_lite::io::{AsyncRead, AsyncReadExt, BufReader, Cursor};

use crate::body::Body;
use crate::error::{Error, Result};
use crate::headers::Headers;
use crate::response::HttpResponse;
use crate::wire::{chunked, Buffered};

const MAX_RESPONSE_HEADERS: usize = 64;

/// Parses one HTTP/1.1 response from `stream`. `body_override`, when
/// given, becomes the response's [`Body`] up front (e.g. a file-backed
/// body for `get_to_file`) so the decoder streams straight into it
/// instead of materializing the response in memory first.
///
/// Returns the parsed response and whether the connection may be reused.
/// Does *not* raise `HttpStatus` itself — the caller (`Connection::action`)
/// decides that once it also knows whether to close the socket.
pub(crate) async fn read_response<S: AsyncRead + Unpin>(
    stream: S,
    body_override: Option<Body>,
) -> Result<(HttpResponse, bool)> {
    let mut buffered = Buffered::new(stream);

    // S0 StatusLine, S1 Headers: read the whole head in one shot, parse
    // it with httparse.
    let head = buffered.read_head().await?;
    let mut header_storage = [httparse::EMPTY_HEADER; MAX_RESPONSE_HEADERS];
    let mut parsed = httparse::Response::new(&mut header_storage);
    match parsed.parse(&head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(Error::wire("response head was incomplete"));
        }
        Err(e) => return Err(Error::wire(format!("malformed status line or headers: {e}"))),
    }

    let code = parsed.code.ok_or_else(|| Error::wire("response missing status code"))?;
    let reason = parsed.reason.unwrap_or("").to_string();

    let mut headers = Headers::new();
    for h in parsed.headers.iter() {
        headers.push(h.name.to_string(), String::from_utf8_lossy(h.value).into_owned());
    }

    // S2 BodyFraming
    let content_length = headers
        .get_ignore_ascii_case("Content-Length")
        .map(|v| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| Error::wire(format!("non-numeric Content-Length: {v:?}")))
        })
        .transpose()?;
    let keep_alive = !headers
        .get_ignore_ascii_case("Connection")
        .is_some_and(|v| v.eq_ignore_ascii_case("close"));
    let chunked_body = headers
        .get_ignore_ascii_case("Transfer-Encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));
    let gzipped = headers
        .get_ignore_ascii_case("Content-Encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

    let raw_body: Vec<u8> = if chunked_body {
        // S3 Chunked -> S1' TrailerHeaders -> S6
        let (bytes, trailers) = chunked::decode_chunked_streaming(&mut buffered).await?;
        for header in trailers {
            headers.push(header.key, header.value);
        }
        bytes
    } else if let Some(len) = content_length
        && len > 0
    {
        // S4 Sized
        buffered.read_exact(len).await?
    } else if !keep_alive && content_length.is_none() {
        // S5 UntilClose
        buffered.read_until_eof().await?
    } else {
        // S6 Done, zero-length body
        Vec::new()
    };

    debug_assert_eq!(buffered.unread_len(), 0, "response buffer must be drained at S6");

    let mut body = body_override.unwrap_or_default();
    if gzipped {
        // Gzip is interposed on the concatenated, already-framed payload,
        // never on the still-chunked wire bytes.
        let cursor: BufReader<Cursor<Vec<u8>>> = BufReader::new(Cursor::new(raw_body));
        let mut decoder = GzipDecoder::new(cursor);
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded).await?;
        body.consume(&decoded).await?;
    } else {
        body.consume(&raw_body).await?;
    }

    Ok((HttpResponse::new(code, reason, headers, body), keep_alive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::io::Cursor as TestCursor;

    #[test]
    fn parses_sized_body() {
        smol::block_on(async {
            let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello";
            let (mut resp, keep_alive) = read_response(TestCursor::new(raw.to_vec()), None)
                .await
                .unwrap();
            assert_eq!(resp.status, 200);
            assert!(resp.is_ok());
            assert!(keep_alive);
            assert_eq!(resp.body.to_string().await.unwrap(), "hello");
        });
    }

    #[test]
    fn connection_close_disables_keep_alive() {
        smol::block_on(async {
            let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nhi";
            let (_resp, keep_alive) = read_response(TestCursor::new(raw.to_vec()), None)
                .await
                .unwrap();
            assert!(!keep_alive);
        });
    }

    #[test]
    fn non_ok_reason_is_preserved_for_caller_to_check() {
        smol::block_on(async {
            let raw = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
            let (resp, _) = read_response(TestCursor::new(raw.to_vec()), None)
                .await
                .unwrap();
            assert_eq!(resp.status, 404);
            assert!(!resp.is_ok());
        });
    }

    #[test]
    fn chunked_body_is_decoded_and_trailers_merged() {
        smol::block_on(async {
            let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\nX-Trailer: v\r\n\r\n";
            let (mut resp, _) = read_response(TestCursor::new(raw.to_vec()), None)
                .await
                .unwrap();
            assert_eq!(resp.body.to_string().await.unwrap(), "hello");
            assert_eq!(resp.headers.get("X-Trailer"), Some("v"));
        });
    }

    #[test]
    fn buffer_is_drained_on_keep_alive_connection() {
        smol::block_on(async {
            let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi";
            let mut buffered = Buffered::new(TestCursor::new(raw.to_vec()));
            let status_line = buffered.read_line().await.unwrap();
            assert_eq!(status_line, "HTTP/1.1 200 OK");
            loop {
                let line = buffered.read_line().await.unwrap();
                if line.is_empty() {
                    break;
                }
            }
            let _ = buffered.read_exact(2).await.unwrap();
            assert_eq!(buffered.unread_len(), 0);
        });
    }
}
