use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A Redis endpoint identified by host and port.
///
/// Used both as the connection target and as the redirection target parsed
/// out of `MOVED`/`ASK` cluster errors.
///
/// # Example
///
/// ```
/// use respline::HostAndPort;
///
/// let hp: HostAndPort = "127.0.0.1:7001".parse().unwrap();
/// assert_eq!(hp.host(), "127.0.0.1");
/// assert_eq!(hp.port(), 7001);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAndPort {
    host: String,
    port: u16,
}

/// Error returned when a `host:port` string cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid host:port: {input}")]
pub struct ParseHostError {
    input: String,
}

impl HostAndPort {
    /// Creates a new endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The hostname or IP literal, without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for HostAndPort {
    type Err = ParseHostError;

    /// Parses `host:port`, splitting on the *last* colon so IPv6 literals
    /// such as `[::1]:7001` or `2001:db8::1:6379` keep their internal
    /// colons on the host side. One level of square brackets is stripped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseHostError {
            input: s.to_string(),
        };

        let (host, port) = s.rsplit_once(':').ok_or_else(err)?;
        if host.is_empty() {
            return Err(err());
        }
        let port: u16 = port.parse().map_err(|_| err())?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        Ok(Self::new(host, port))
    }
}
