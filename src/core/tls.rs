use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::core::socket::RedisStream;
use crate::proto::error::{Error, Result};

/// A TLS-wrapped TCP stream.
///
/// Uses `webpki-roots` for Mozilla's root certificates and `ring` as the
/// crypto provider; hostname verification is rustls' built-in and always
/// on.
pub struct TlsStream {
    inner: StreamOwned<ClientConnection, TcpStream>,
}

/// Wraps a connected TCP stream in a TLS session for `host`.
///
/// The handshake itself runs lazily on first read/write; a failed
/// handshake surfaces there as a transport error.
pub(crate) fn wrap(host: &str, tcp: TcpStream) -> Result<TlsStream> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let server_name =
        ServerName::try_from(host.to_string()).map_err(|_| Error::InvalidArgument {
            message: format!("invalid TLS server name: {host}"),
        })?;

    let conn =
        ClientConnection::new(Arc::new(config), server_name).map_err(|e| Error::Connection {
            message: format!("TLS session setup failed: {e}"),
        })?;

    Ok(TlsStream {
        inner: StreamOwned::new(conn, tcp),
    })
}

impl Read for TlsStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for TlsStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl RedisStream for TlsStream {
    fn is_healthy(&self) -> bool {
        self.inner.sock.peer_addr().is_ok()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.inner.conn.send_close_notify();
        let _ = self.inner.flush();
        self.inner.sock.shutdown(Shutdown::Both)
    }
}
