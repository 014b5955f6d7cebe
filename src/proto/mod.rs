//! RESP (Redis Serialization Protocol) support: the reply data model,
//! error classification, and the wire codec.
//!
//! ## Modules
//!
//! - [`codec`] - Command encoding and reply decoding
//! - [`error`] - Error types and server-error classification
//! - [`frame`] - The decoded reply union

pub mod codec;
pub mod error;
pub mod frame;
