//! Fixed-capacity buffered stream wrappers the RESP codec runs on.
//!
//! [`WriteBuf`] owns the outbound buffer and exposes the allocation-free
//! integer writer used for every length prefix on the wire; [`ReadBuf`]
//! owns the inbound buffer with its cursor and valid-data limit.

mod read_buf;
mod write_buf;

pub use read_buf::ReadBuf;
pub use write_buf::WriteBuf;
