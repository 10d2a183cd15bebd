//! Request serialization (MODULE C, write side).

use futures_lite::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::request::HttpRequest;
use crate::url::HostInfo;
use crate::wire::chunked;

/// Writes `VERB SP PATH SP HTTP/1.1 CRLF`, then headers, then the body,
/// injecting the default headers spec §4.C/§6 names whenever the caller
/// left them absent. Never overrides a header the caller already set.
pub async fn write_request<W: AsyncWrite + Unpin>(
    out: &mut W,
    host: &HostInfo,
    req: &mut HttpRequest,
) -> Result<()> {
    let size = req.body.size().await?;

    req.headers.set_if_absent("Host", host.hostname.clone());
    req.headers.set_if_absent("Accept", "*/*");
    req.headers.set_if_absent("Accept-Encoding", "gzip, deflate");
    req.headers.set_if_absent("TE", "trailers");
    if size >= 0 {
        req.headers.set_if_absent("Content-Length", size.to_string());
    } else {
        req.headers.set_if_absent("Transfer-Encoding", "chunked");
    }

    out.write_all(format!("{} {} HTTP/1.1\r\n", req.verb, req.path).as_bytes())
        .await?;
    for header in req.headers.iter() {
        out.write_all(format!("{header}\r\n").as_bytes()).await?;
    }
    out.write_all(b"\r\n").await?;

    if size >= 0 {
        let mut reader = req.body.read_stream().await?;
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n]).await?;
        }
    } else {
        let mut reader = req.body.read_stream().await?;
        chunked::encode_chunked(&mut reader, out).await?;
    }
    out.flush().await?;
    Ok(())
}
