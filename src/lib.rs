//! # Respline
//!
//! A minimal blocking Redis client: a byte-exact RESP codec over buffered
//! stream wrappers, with a single-connection state machine that tracks
//! precise broken/not-broken semantics and classifies cluster redirection
//! errors.
//!
//! Out of scope by design: connection pooling, cluster topology, pipelining
//! and the broad command surface — this crate is the wire core those layers
//! build on.
//!
//! ## Features
//!
//! - `tls` - TLS support via rustls (`rediss://` addresses)
//!
//! ## Example
//!
//! ```no_run
//! use respline::Client;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("redis://localhost:6379")?;
//!     assert_eq!(client.ping()?, "PONG");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub(crate) mod core;
mod host;
pub(crate) mod io;
pub(crate) mod proto;

pub use crate::core::command::{self, Cmd};
pub use crate::core::config::ClientConfig;
pub use crate::core::connection::Connection;
pub use crate::core::socket::{DefaultSocketFactory, RedisStream, SocketFactory};
pub use crate::core::{Client, Error, Result};
pub use crate::host::{HostAndPort, ParseHostError};
pub use crate::proto::error::ServerError;
pub use crate::proto::frame::Reply;

#[cfg(feature = "tls")]
pub use crate::core::TlsStream;
