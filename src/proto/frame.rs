use bytes::Bytes;

use crate::proto::error::ServerError;

/// A decoded RESP reply.
///
/// Covers every reply kind the protocol can produce:
/// - `SimpleString`: status replies like `+OK`
/// - `Integer`: numeric replies like `:1000`
/// - `BulkString`: binary-safe payloads; `None` is the null bulk string
///   (`$-1`), distinct from an empty one (`$0`)
/// - `Array`: nested replies; `None` is the null array (`*-1`), distinct
///   from an empty one (`*0`)
/// - `Error`: a classified server error captured *inside* an array.
///
/// A top-level error reply is never returned as a `Reply`; it surfaces as
/// [`Error::Server`](crate::Error::Server) from the decode instead. The
/// `Error` variant exists only so that one failed element does not abort
/// the decode of the array around it.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Simple string (`+OK`), raw status bytes.
    SimpleString(Vec<u8>),
    /// Integer (`:1000`).
    Integer(i64),
    /// Bulk string (`$6\r\nfoobar`); `None` for the null bulk string.
    BulkString(Option<Bytes>),
    /// Array (`*2\r\n...`); `None` for the null array.
    Array(Option<Vec<Reply>>),
    /// A server error decoded in place as an array element.
    Error(ServerError),
}

impl Reply {
    /// The status text of a simple string, decoded as UTF-8 (lossy).
    pub fn as_status(&self) -> Option<String> {
        match self {
            Reply::SimpleString(s) => Some(String::from_utf8_lossy(s).into_owned()),
            _ => None,
        }
    }

    /// The payload of a bulk string; `None` for any other variant.
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            Reply::BulkString(Some(b)) => Some(b),
            _ => None,
        }
    }

    /// The integer value, if this is an integer reply.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The elements, if this is a non-null array reply.
    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(Some(items)) => Some(items),
            _ => None,
        }
    }

    /// True for the null bulk string or null array.
    pub fn is_null(&self) -> bool {
        matches!(self, Reply::BulkString(None) | Reply::Array(None))
    }
}
