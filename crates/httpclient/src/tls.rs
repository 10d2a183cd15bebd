//! TLS handshake and shutdown (MODULE D, TLS half).
//!
//! `rustls` + `futures-rustls` supply the handshake and the
//! certificate-chain/hostname verification spec.md §6 requires of "the
//! TLS library" collaborator; this module only wires them onto a
//! `smol` socket and translates rustls's errors into this crate's own
//! `Error::TlsVerify`/`Error::TlsShutdown`.

use std::sync::{Arc, OnceLock};

use futures_lite::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use futures_rustls::TlsConnector as RustlsConnector;
use futures_rustls::client::TlsStream;
use rustls_pki_types::ServerName;

use crate::error::{Error, Result};

fn client_config() -> &'static Arc<rustls::ClientConfig> {
    static CONFIG: OnceLock<Arc<rustls::ClientConfig>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let mut roots = rustls::RootCertStore::empty();
        let loaded = rustls_native_certs::load_native_certs();
        for err in &loaded.errors {
            log::warn!("error loading a native root certificate: {err}");
        }
        for cert in loaded.certs {
            // Certificates the platform store itself refuses to parse
            // are skipped rather than failing client construction.
            let _ = roots.add(cert);
        }
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Arc::new(config)
    })
}

/// Performs the TLS handshake over `stream`, verifying the peer's
/// certificate chains to the OS trust store and that its identity
/// matches `hostname` (RFC 2818 / RFC 6125), via rustls's own verifier.
pub async fn handshake<S>(hostname: &str, stream: S) -> Result<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|e| Error::TlsVerify(format!("invalid hostname {hostname:?}: {e}")))?;
    let connector = RustlsConnector::from(client_config().clone());
    connector
        .connect(server_name, stream)
        .await
        .map_err(|e| Error::TlsVerify(e.to_string()))
}

/// Initiates graceful TLS shutdown and awaits it. Three outcomes are
/// benign and must not surface as errors (spec §4.D): the peer closing
/// the TCP layer without a `close_notify`, a clean mutual `close_notify`
/// followed by EOF, and a shutdown aborted because the peer dropped.
/// Anything else becomes `Error::TlsShutdown`.
pub async fn graceful_shutdown<S>(stream: &mut TlsStream<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    use std::io::ErrorKind;

    match stream.close().await {
        Ok(()) => Ok(()),
        Err(e) if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::NotConnected) => Ok(()),
        Err(e) if matches!(e.kind(), ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe) => Ok(()),
        Err(e) => Err(Error::TlsShutdown(e.to_string())),
    }
}
