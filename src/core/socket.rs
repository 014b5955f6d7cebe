use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::core::config::ClientConfig;
use crate::host::HostAndPort;
use crate::proto::error::{Error, Result};

/// A connected duplex byte stream to a Redis server.
///
/// Implemented by plain TCP sockets and by the TLS wrapper when the `tls`
/// feature is enabled. A stream handed to a connection is owned by it
/// exclusively and must not be used elsewhere.
pub trait RedisStream: Read + Write + Send {
    /// Whether the transport still looks usable: bound, open, and with
    /// neither half shut down.
    fn is_healthy(&self) -> bool;

    /// Shuts down both directions. Causes any in-flight blocking read or
    /// write on another handle to fail with a transport error.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl RedisStream for TcpStream {
    fn is_healthy(&self) -> bool {
        self.peer_addr().is_ok()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// Creates connected streams for a [`Connection`](crate::Connection).
///
/// Production code uses [`DefaultSocketFactory`]; tests substitute
/// scripted in-memory implementations.
pub trait SocketFactory: Send {
    /// Returns a freshly connected stream, or fails with a connection
    /// error if no candidate address can be reached.
    fn create(&self) -> Result<Box<dyn RedisStream>>;
}

/// TCP (optionally TLS) socket factory.
///
/// Resolves the target host, tries each resolved address with the
/// configured connect timeout until one succeeds, then applies the read
/// timeout and `TCP_NODELAY` and, when configured, the TLS handshake with
/// hostname verification.
#[derive(Debug)]
pub struct DefaultSocketFactory {
    target: HostAndPort,
    config: ClientConfig,
}

impl DefaultSocketFactory {
    /// Creates a factory for the given target and configuration.
    pub fn new(target: HostAndPort, config: ClientConfig) -> Self {
        Self { target, config }
    }

    /// The endpoint this factory connects to.
    pub fn target(&self) -> &HostAndPort {
        &self.target
    }

    fn connect_tcp(&self) -> Result<TcpStream> {
        let addrs: Vec<SocketAddr> = (self.target.host(), self.target.port())
            .to_socket_addrs()
            .map_err(|e| Error::Connection {
                message: format!("failed to resolve {}: {e}", self.target),
            })?
            .collect();

        let mut last_error: Option<io::Error> = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, self.config.connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(self.config.read_timeout)?;
                    debug!(endpoint = %self.target, %addr, "connected");
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(Error::Connection {
            message: match last_error {
                Some(e) => format!("failed to connect to {}: {e}", self.target),
                None => format!("no addresses resolved for {}", self.target),
            },
        })
    }
}

impl SocketFactory for DefaultSocketFactory {
    fn create(&self) -> Result<Box<dyn RedisStream>> {
        let stream = self.connect_tcp()?;

        if self.config.use_tls {
            #[cfg(feature = "tls")]
            {
                // A failed handshake drops (and thereby closes) the TCP
                // stream before the error propagates.
                return Ok(Box::new(super::tls::wrap(self.target.host(), stream)?));
            }
            #[cfg(not(feature = "tls"))]
            {
                return Err(Error::InvalidArgument {
                    message: "TLS requested but the `tls` feature is not enabled".to_string(),
                });
            }
        }

        Ok(Box::new(stream))
    }
}

/// A cloneable handle over one boxed stream, so the outbound and inbound
/// buffers can each own a reader/writer. The connection is single-caller
/// by contract, so the lock is never contended.
#[derive(Clone)]
pub(crate) struct SharedStream(Arc<Mutex<Box<dyn RedisStream>>>);

impl SharedStream {
    pub(crate) fn new(stream: Box<dyn RedisStream>) -> Self {
        Self(Arc::new(Mutex::new(stream)))
    }

    pub(crate) fn is_healthy(&self) -> bool {
        match self.0.lock() {
            Ok(stream) => stream.is_healthy(),
            Err(_) => false,
        }
    }

    pub(crate) fn shutdown(&self) {
        if let Ok(mut stream) = self.0.lock() {
            let _ = stream.shutdown();
        }
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, Box<dyn RedisStream>>> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "stream lock poisoned"))
    }
}

impl Read for SharedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.lock()?.read(buf)
    }
}

impl Write for SharedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

impl fmt::Debug for SharedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStream").finish_non_exhaustive()
    }
}
