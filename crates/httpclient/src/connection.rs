//! `Connection` — MODULE D: one socket (plain or TLS), DNS resolution,
//! handshake, request/response turns, keep-alive reuse, graceful shutdown.
//!
//! Grounded on `ConnectionPool.hpp`'s `Connection` (resolve once, connect,
//! optionally handshake, `action()` drives one request/response turn) and
//! the teacher's own `httpclient` sketch for the plain-TCP half.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_lite::io::{AsyncRead, AsyncWrite};
use futures_rustls::client::TlsStream;
use smol::net::TcpStream;

use crate::body::Body;
use crate::dns::DnsResolver;
use crate::error::{Error, Result};
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use crate::url::HostInfo;
use crate::{tls, wire};

enum Socket {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Socket {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Socket::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Socket::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Socket {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Socket::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Socket::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Socket::Plain(s) => Pin::new(s).poll_flush(cx),
            Socket::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Socket::Plain(s) => Pin::new(s).poll_close(cx),
            Socket::Tls(s) => Pin::new(s.as_mut()).poll_close(cx),
        }
    }
}

/// One HTTP/1.1 connection to a single origin. Owns at most one open
/// socket at a time; `ensure_connection` opens it lazily, `close` tears
/// it down. Not `Clone`: the pool hands out leases, never copies.
pub struct Connection {
    host: HostInfo,
    resolver: Arc<DnsResolver>,
    endpoints: Option<Vec<SocketAddr>>,
    socket: Option<Socket>,
}

impl Connection {
    pub fn new(host: HostInfo, resolver: Arc<DnsResolver>) -> Self {
        Self {
            host,
            resolver,
            endpoints: None,
            socket: None,
        }
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Resolves the host on first use (cached afterwards), then connects
    /// to the first endpoint that accepts a TCP connection, then performs
    /// the TLS handshake if the origin is `https`. A no-op if already open.
    pub async fn ensure_connection(&mut self) -> Result<()> {
        if self.socket.is_some() {
            return Ok(());
        }

        if self.endpoints.is_none() {
            self.endpoints = Some(self.resolver.resolve(&self.host).await?);
        }
        let endpoints = self.endpoints.as_ref().expect("just resolved");

        let mut last_err = None;
        for addr in endpoints {
            match TcpStream::connect(addr).await {
                Ok(tcp) => {
                    if self.host.is_ssl() {
                        let tls_stream = tls::handshake(&self.host.hostname, tcp).await?;
                        self.socket = Some(Socket::Tls(Box::new(tls_stream)));
                    } else {
                        self.socket = Some(Socket::Plain(tcp));
                    }
                    return Ok(());
                }
                Err(e) => {
                    log::debug!("connect to {addr} failed: {e}");
                    last_err = Some(e);
                }
            }
        }

        Err(Error::Connect(format!(
            "{}: {}",
            self.host.authority(),
            last_err.map(|e| e.to_string()).unwrap_or_else(|| "no endpoints resolved".into())
        )))
    }

    /// Closes the connection. If a TLS session is open, attempts graceful
    /// shutdown first; the benign shutdown outcomes documented on
    /// [`tls::graceful_shutdown`] are swallowed there, not here.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(socket) = self.socket.take() {
            if let Socket::Tls(mut s) = socket {
                tls::graceful_shutdown(&mut s).await?;
            }
        }
        Ok(())
    }

    /// Drives one full request/response turn: ensures the connection is
    /// open, injects default headers, writes the request, reads the
    /// response. Closes the connection afterward if the response wasn't
    /// keep-alive. Raises `HttpStatus` when the reason phrase isn't `OK`,
    /// after the body has already been fully read.
    pub async fn action(&mut self, req: &mut HttpRequest, file_path: Option<PathBuf>) -> Result<HttpResponse> {
        self.ensure_connection().await?;

        log::trace!("{} {} -> {}", req.verb, req.path, self.host);
        wire::write_request(self.socket.as_mut().expect("connection just ensured"), &self.host, req).await?;

        let body_override = file_path.map(Body::assign_file);
        let (response, keep_alive) =
            wire::read_response(self.socket.as_mut().expect("connection just ensured"), body_override).await?;
        log::trace!("{} {} <- {} {}", req.verb, req.path, response.status, response.reason);

        if !keep_alive {
            self.close().await?;
        }

        if !response.is_ok() {
            return Err(Error::HttpStatus {
                code: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }

    pub async fn get(&mut self, path: impl Into<String>) -> Result<HttpResponse> {
        self.action(&mut HttpRequest::get(path), None).await
    }

    pub async fn get_to_file(&mut self, path: impl Into<String>, file_path: impl Into<PathBuf>) -> Result<HttpResponse> {
        self.action(&mut HttpRequest::get(path), Some(file_path.into())).await
    }

    pub async fn del(&mut self, path: impl Into<String>) -> Result<HttpResponse> {
        self.action(&mut HttpRequest::delete(path), None).await
    }

    pub async fn put(&mut self, path: impl Into<String>, body: Body) -> Result<HttpResponse> {
        self.action(&mut HttpRequest::put(path, body), None).await
    }

    pub async fn post(&mut self, path: impl Into<String>, body: Body) -> Result<HttpResponse> {
        self.action(&mut HttpRequest::post(path, body), None).await
    }

    /// Identical wire behavior to [`Connection::put`]; named separately
    /// per the operation table for callers handing in a `Body` they built
    /// incrementally through `write_stream`/`consume` rather than a single
    /// buffer up front.
    pub async fn put_stream(&mut self, path: impl Into<String>, body: Body) -> Result<HttpResponse> {
        self.put(path, body).await
    }

    pub async fn post_stream(&mut self, path: impl Into<String>, body: Body) -> Result<HttpResponse> {
        self.post(path, body).await
    }
}
