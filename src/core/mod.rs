//! Connection handling for the respline Redis client.
//!
//! ## Modules
//!
//! - [`connection`] - Single blocking connection management
//! - [`command`] - Command construction helpers
//! - [`config`] - Connection configuration
//! - [`socket`] - Socket factory and stream abstraction

use bytes::Bytes;

pub use crate::proto::error::{Error, Result};

/// Command construction helpers.
pub mod command;
/// Connection configuration.
pub mod config;
/// Low-level connection management.
pub mod connection;
/// Socket factory and stream abstraction.
pub mod socket;

cfg_if::cfg_if! {
    if #[cfg(feature = "tls")] {
        mod tls;
        pub use tls::TlsStream;
    }
}

use crate::host::HostAndPort;
use crate::proto::frame::Reply;
use command::Cmd;
use config::ClientConfig;
use connection::Connection;

/// High-level handle over a single connection.
///
/// Thin by design: this core deliberately exposes only a connectivity
/// smoke check and a raw escape hatch; the full command surface lives in
/// higher layers.
///
/// # Example
///
/// ```no_run
/// use respline::Client;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = Client::connect("redis://localhost:6379")?;
///     assert_eq!(client.ping()?, "PONG");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Client {
    connection: Connection,
}

impl Client {
    /// Connects using a `redis://host:port` or `rediss://host:port` (TLS)
    /// address.
    pub fn connect<T: AsRef<str>>(addr: T) -> Result<Self> {
        Self::connect_with(addr, ClientConfig::new())
    }

    /// Connects with an explicit configuration. A `rediss://` scheme
    /// turns TLS on regardless of the configured flag.
    pub fn connect_with<T: AsRef<str>>(addr: T, config: ClientConfig) -> Result<Self> {
        let parsed = url::Url::parse(addr.as_ref()).map_err(|_| Error::InvalidArgument {
            message: "invalid address format".to_string(),
        })?;

        let config = match parsed.scheme() {
            "redis" => config,
            "rediss" => config.tls(true),
            _ => {
                return Err(Error::InvalidArgument {
                    message: "invalid scheme, expected redis:// or rediss://".to_string(),
                })
            }
        };

        let host = parsed.host_str().ok_or_else(|| Error::InvalidArgument {
            message: "missing host in address".to_string(),
        })?;
        let port = parsed.port().unwrap_or(6379);

        let mut connection = Connection::with_config(HostAndPort::new(host, port), config);
        connection.connect()?;
        Ok(Self { connection })
    }

    /// Sends a PING and returns the status text, normally `PONG`.
    pub fn ping(&mut self) -> Result<String> {
        self.connection.send_command(&command::ping())?;
        self.connection
            .status_reply()?
            .ok_or_else(|| Error::Protocol {
                message: "null reply to PING".to_string(),
            })
    }

    /// Echoes the given message back from the server.
    pub fn echo(&mut self, msg: impl Into<Bytes>) -> Result<Bytes> {
        let reply = self.execute(&command::echo(msg))?;
        match reply {
            Reply::BulkString(Some(payload)) => Ok(payload),
            other => Err(Error::Protocol {
                message: format!("expected a bulk string reply, got {other:?}"),
            }),
        }
    }

    /// Sends an arbitrary command and returns its decoded reply.
    pub fn execute(&mut self, cmd: &Cmd) -> Result<Reply> {
        self.connection.execute(cmd)
    }

    /// The underlying connection.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_bad_scheme() {
        let result = Client::connect("http://localhost:6379");
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_connect_rejects_garbage_address() {
        let result = Client::connect("not a url");
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }
}
