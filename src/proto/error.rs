use std::io;

use thiserror::Error;

use crate::host::HostAndPort;

/// Result type alias for respline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to a Redis server.
///
/// Transport and protocol failures ([`Io`](Error::Io),
/// [`Connection`](Error::Connection), [`Protocol`](Error::Protocol)) mark
/// the connection broken; server-side failures ([`Server`](Error::Server))
/// do not — the server answered correctly at the protocol level even
/// though the operation failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An IO error occurred on the transport.
    #[error("IO error: {source}")]
    Io {
        /// The underlying IO error.
        #[from]
        source: io::Error,
    },

    /// The transport closed or became unusable mid-exchange.
    #[error("connection error: {message}")]
    Connection {
        /// Description of the failure.
        message: String,
    },

    /// The byte stream violated the RESP grammar.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the violation.
        message: String,
    },

    /// The server returned an error reply.
    #[error("server error: {source}")]
    Server {
        /// The classified server error.
        #[from]
        source: ServerError,
    },

    /// Invalid argument or configuration provided by the caller.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },
}

impl Error {
    /// Whether this failure must mark the connection broken.
    pub fn breaks_connection(&self) -> bool {
        matches!(
            self,
            Error::Io { .. } | Error::Connection { .. } | Error::Protocol { .. }
        )
    }
}

/// A classified error reply from the server.
///
/// Produced by [`classify_error`] from the text of a `-` line. Redirection
/// kinds carry the routing data a cluster-aware caller would act on; the
/// fixed kinds carry only the original message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServerError {
    /// Permanent redirect: the slot has moved to another node. The caller
    /// should retry against the target.
    #[error("{message}")]
    Moved {
        /// The hash slot that moved.
        slot: u16,
        /// The node now owning the slot.
        target: HostAndPort,
        /// The original error line.
        message: String,
    },

    /// One-shot redirect during slot migration. The caller must send
    /// `ASKING` to the target before retrying, and must not treat the
    /// redirect as permanent.
    #[error("{message}")]
    Ask {
        /// The hash slot being migrated.
        slot: u16,
        /// The node temporarily serving the slot.
        target: HostAndPort,
        /// The original error line.
        message: String,
    },

    /// The cluster is down or the slot is not served.
    #[error("{message}")]
    ClusterDown {
        /// The original error line.
        message: String,
    },

    /// The server is busy running a script.
    #[error("{message}")]
    Busy {
        /// The original error line.
        message: String,
    },

    /// A script referenced by SHA does not exist.
    #[error("{message}")]
    NoScript {
        /// The original error line.
        message: String,
    },

    /// Invalid username/password pair.
    #[error("{message}")]
    WrongPass {
        /// The original error line.
        message: String,
    },

    /// The authenticated user lacks permission for the command.
    #[error("{message}")]
    NoPerm {
        /// The original error line.
        message: String,
    },

    /// Any other server error, e.g. `ERR unknown command`.
    #[error("{message}")]
    Data {
        /// The original error line.
        message: String,
    },
}

impl ServerError {
    /// The original error line as sent by the server.
    pub fn message(&self) -> &str {
        match self {
            ServerError::Moved { message, .. }
            | ServerError::Ask { message, .. }
            | ServerError::ClusterDown { message }
            | ServerError::Busy { message }
            | ServerError::NoScript { message }
            | ServerError::WrongPass { message }
            | ServerError::NoPerm { message }
            | ServerError::Data { message } => message,
        }
    }
}

/// Classifies the text of an error reply (without the leading `-`).
///
/// Prefixes are checked in priority order: `MOVED ` and `ASK ` become
/// redirection errors carrying slot and target, the fixed server
/// categories keep only their message, and everything else is a generic
/// data error. A redirect whose slot or target does not parse is demoted
/// to a data error rather than dropped.
pub fn classify_error(line: &str) -> ServerError {
    let message = line.to_string();

    if let Some(rest) = line.strip_prefix("MOVED ") {
        if let Some((slot, target)) = parse_redirect(rest) {
            return ServerError::Moved {
                slot,
                target,
                message,
            };
        }
    } else if let Some(rest) = line.strip_prefix("ASK ") {
        if let Some((slot, target)) = parse_redirect(rest) {
            return ServerError::Ask {
                slot,
                target,
                message,
            };
        }
    } else if line.starts_with("CLUSTERDOWN ") {
        return ServerError::ClusterDown { message };
    } else if line.starts_with("BUSY ") {
        return ServerError::Busy { message };
    } else if line.starts_with("NOSCRIPT ") {
        return ServerError::NoScript { message };
    } else if line.starts_with("WRONGPASS") {
        return ServerError::WrongPass { message };
    } else if line.starts_with("NOPERM") {
        return ServerError::NoPerm { message };
    }

    ServerError::Data { message }
}

/// Parses redirect arguments: `<slot> <host>:<port>`.
fn parse_redirect(rest: &str) -> Option<(u16, HostAndPort)> {
    let mut fields = rest.split_whitespace();
    let slot: u16 = fields.next()?.parse().ok()?;
    let target: HostAndPort = fields.next()?.parse().ok()?;
    Some((slot, target))
}
