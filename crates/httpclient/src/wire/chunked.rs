//! Chunked transfer-encoding — encoder for the request side, decoder for
//! the response side (MODULE C).
//!
//! Grounded on `HTTP.cpp`'s `chunkedTransmit` (4 KiB reads, hex-length
//! line, trailing `0\r\n\r\n`) for encoding, and `HTTP_ReadReply.hpp` /
//! `HTTP_readChunk.hpp`'s chunk loop for decoding: read a hex length line,
//! that many bytes, a CRLF, repeat until a zero-length chunk, then read
//! trailing headers.

use futures_lite::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Cursor};

use crate::error::{Error, Result};
use crate::headers::Header;
use crate::wire::Buffered;

const CHUNK_SIZE: usize = 4096;

/// Reads `reader` to completion, writing it to `writer` as chunked
/// transfer-encoded data terminated by the zero-length chunk.
pub async fn encode_chunked<R, W>(reader: &mut R, writer: &mut W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(format!("{n:x}\r\n").as_bytes()).await?;
        writer.write_all(&buf[..n]).await?;
        writer.write_all(b"\r\n").await?;
    }
    writer.write_all(b"0\r\n\r\n").await?;
    Ok(())
}

/// Decodes a chunked body from an already-positioned [`Buffered`] source,
/// returning the concatenated payload and any trailer headers following
/// the terminating chunk.
pub(crate) async fn decode_chunked_streaming<S>(buffered: &mut Buffered<S>) -> Result<(Vec<u8>, Vec<Header>)>
where
    S: AsyncRead + Unpin,
{
    let mut body = Vec::new();
    loop {
        let line = buffered.read_line().await?;
        let size_token = line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_token, 16)
            .map_err(|_| Error::wire(format!("invalid chunk size line: {line:?}")))?;
        if size == 0 {
            break;
        }
        let chunk = buffered.read_exact(size).await?;
        body.extend_from_slice(&chunk);
        let crlf = buffered.read_line().await?;
        if !crlf.is_empty() {
            return Err(Error::wire("chunk data not followed by CRLF"));
        }
    }

    let mut trailers = Vec::new();
    loop {
        let line = buffered.read_line().await?;
        if line.is_empty() {
            break;
        }
        trailers.push(line.parse::<Header>()?);
    }

    Ok((body, trailers))
}

/// Standalone decode over a fully in-memory chunked byte sequence; used by
/// the round-trip property test and by callers who already hold the whole
/// encoded response in memory.
pub async fn decode_chunked(data: &[u8]) -> Result<Vec<u8>> {
    let mut buffered = Buffered::new(Cursor::new(data.to_vec()));
    let (body, _trailers) = decode_chunked_streaming(&mut buffered).await?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_payload() {
        smol::block_on(async {
            let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
            let mut encoded = Cursor::new(Vec::new());
            encode_chunked(&mut Cursor::new(payload.clone()), &mut encoded)
                .await
                .unwrap();
            let decoded = decode_chunked(&encoded.into_inner()).await.unwrap();
            assert_eq!(decoded, payload);
        });
    }

    #[test]
    fn round_trips_empty_payload() {
        smol::block_on(async {
            let mut encoded = Cursor::new(Vec::new());
            encode_chunked(&mut Cursor::new(Vec::new()), &mut encoded)
                .await
                .unwrap();
            let encoded = encoded.into_inner();
            assert_eq!(encoded, b"0\r\n\r\n");
            let decoded = decode_chunked(&encoded).await.unwrap();
            assert!(decoded.is_empty());
        });
    }

    #[test]
    fn trailer_headers_are_parsed() {
        smol::block_on(async {
            let mut raw = Vec::new();
            raw.extend_from_slice(b"5\r\nhello\r\n0\r\nX-Trailer: yes\r\n\r\n");
            let mut buffered = Buffered::new(Cursor::new(raw));
            let (body, trailers) = decode_chunked_streaming(&mut buffered).await.unwrap();
            assert_eq!(body, b"hello");
            assert_eq!(trailers.len(), 1);
            assert_eq!(trailers[0].key, "X-Trailer");
        });
    }
}
