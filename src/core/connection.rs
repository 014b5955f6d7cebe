use std::fmt;

use tracing::{debug, warn};

use crate::core::command::Cmd;
use crate::core::config::ClientConfig;
use crate::core::socket::{DefaultSocketFactory, SharedStream, SocketFactory};
use crate::host::HostAndPort;
use crate::io::{ReadBuf, WriteBuf};
use crate::proto::codec;
use crate::proto::error::{Error, Result};
use crate::proto::frame::Reply;

/// The buffered halves of a live transport.
struct Wires {
    stream: SharedStream,
    sink: WriteBuf<SharedStream>,
    source: ReadBuf<SharedStream>,
}

/// A single blocking connection to a Redis server.
///
/// Owns the transport, the outbound/inbound buffers and the broken flag,
/// and opens the stream lazily on first use. The caller must fully send a
/// command and fully consume its reply before issuing the next one; there
/// is no pipelining, and the connection is not meant for concurrent use
/// from multiple threads.
///
/// Any transport or protocol failure marks the connection broken, and a
/// broken connection refuses further reads without attempting I/O. Server
/// error replies do not break the connection. Broken is terminal: the
/// owner is expected to discard the instance rather than revive it.
///
/// # Example
///
/// ```no_run
/// use respline::{Cmd, Connection, HostAndPort};
///
/// fn main() -> respline::Result<()> {
///     let mut conn = Connection::new(HostAndPort::new("127.0.0.1", 6379));
///     conn.send_command(&Cmd::new("PING"))?;
///     let pong = conn.status_reply()?;
///     assert_eq!(pong.as_deref(), Some("PONG"));
///     Ok(())
/// }
/// ```
pub struct Connection {
    socket_factory: Box<dyn SocketFactory>,
    config: ClientConfig,
    wires: Option<Wires>,
    broken: bool,
}

impl Connection {
    /// Creates a connection to `target` with the default configuration.
    ///
    /// No I/O happens until the first command or an explicit
    /// [`connect`](Connection::connect).
    pub fn new(target: HostAndPort) -> Self {
        Self::with_config(target, ClientConfig::new())
    }

    /// Creates a connection to `target` with the given configuration.
    pub fn with_config(target: HostAndPort, config: ClientConfig) -> Self {
        let factory = DefaultSocketFactory::new(target, config.clone());
        Self::with_factory(Box::new(factory), config)
    }

    /// Creates a connection over a custom [`SocketFactory`], e.g. an
    /// in-memory transport in tests.
    pub fn with_factory(socket_factory: Box<dyn SocketFactory>, config: ClientConfig) -> Self {
        Self {
            socket_factory,
            config,
            wires: None,
            broken: false,
        }
    }

    /// Whether a transport is attached and still healthy.
    pub fn is_connected(&self) -> bool {
        match &self.wires {
            Some(wires) => wires.stream.is_healthy(),
            None => false,
        }
    }

    /// Whether a transport or protocol failure has been observed.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Ensures a healthy transport is attached.
    ///
    /// A no-op when already connected and healthy. Otherwise asks the
    /// socket factory for a fresh stream and wraps it in the buffer pair;
    /// a failure marks the connection broken, and any stale transport is
    /// shut down before it is replaced.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        if let Some(stale) = self.wires.take() {
            stale.stream.shutdown();
        }

        match self.socket_factory.create() {
            Ok(stream) => {
                let stream = SharedStream::new(stream);
                self.wires = Some(Wires {
                    sink: WriteBuf::new(stream.clone(), self.config.output_buffer_size),
                    source: ReadBuf::new(stream.clone(), self.config.input_buffer_size),
                    stream,
                });
                Ok(())
            }
            Err(e) => {
                self.broken = true;
                warn!(error = %e, "connect failed");
                Err(e)
            }
        }
    }

    /// Shuts the transport down and detaches it.
    ///
    /// The connection can be reused afterwards by reconnecting, unless it
    /// is broken.
    pub fn disconnect(&mut self) {
        if let Some(wires) = self.wires.take() {
            wires.stream.shutdown();
            debug!("disconnected");
        }
    }

    /// Encodes a command onto the outbound buffer, connecting first if
    /// needed. The bytes reach the server on the next
    /// [`flush`](Connection::flush).
    ///
    /// On a transport failure, tries to recover a trailing error line the
    /// server may have written before closing (common when it rejected
    /// malformed input) and re-wraps the failure with that context; a
    /// secondary failure during the recovery attempt is discarded. The
    /// connection is marked broken either way.
    pub fn send_command(&mut self, cmd: &Cmd) -> Result<()> {
        self.connect()?;
        let wires = self.wires_mut()?;

        match codec::encode_command(&mut wires.sink, cmd) {
            Ok(()) => Ok(()),
            Err(e) if e.breaks_connection() => {
                let recovered = codec::read_error_line_if_possible(&mut wires.source);
                self.broken = true;
                warn!(error = %e, "send failed, connection marked broken");
                match recovered {
                    Some(line) if !line.is_empty() => Err(Error::Connection {
                        message: format!("{line}; while sending command: {e}"),
                    }),
                    _ => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Flushes the outbound buffer to the server.
    pub fn flush(&mut self) -> Result<()> {
        let wires = self.wires_mut()?;
        if let Err(e) = wires.sink.flush() {
            self.broken = true;
            warn!(error = %e, "flush failed, connection marked broken");
            return Err(e.into());
        }
        Ok(())
    }

    /// Reads one reply.
    ///
    /// Fails immediately, without touching the transport, if the
    /// connection is broken: once a failure has been observed, previously
    /// buffered input is unreliable and is never read again.
    pub fn read_reply(&mut self) -> Result<Reply> {
        if self.broken {
            return Err(Error::Connection {
                message: "attempting to read from a broken connection".to_string(),
            });
        }
        let wires = self.wires_mut()?;
        match codec::read_reply(&mut wires.source) {
            Ok(reply) => Ok(reply),
            Err(e) => {
                if e.breaks_connection() {
                    self.broken = true;
                    warn!(error = %e, "read failed, connection marked broken");
                }
                Err(e)
            }
        }
    }

    /// Flushes, reads one reply, and requires it to be a simple string
    /// (`Some(text)`) or a null bulk string (`None`).
    pub fn status_reply(&mut self) -> Result<Option<String>> {
        self.flush()?;
        match self.read_reply()? {
            Reply::SimpleString(status) => {
                Ok(Some(String::from_utf8_lossy(&status).into_owned()))
            }
            Reply::BulkString(None) => Ok(None),
            other => Err(Error::Protocol {
                message: format!("expected a status reply, got {other:?}"),
            }),
        }
    }

    /// Sends a command, flushes, and reads its reply.
    pub fn execute(&mut self, cmd: &Cmd) -> Result<Reply> {
        self.send_command(cmd)?;
        self.flush()?;
        self.read_reply()
    }

    fn wires_mut(&mut self) -> Result<&mut Wires> {
        self.wires.as_mut().ok_or_else(|| Error::Connection {
            message: "not connected".to_string(),
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.wires.is_some())
            .field("broken", &self.broken)
            .finish()
    }
}
