//! RESP wire codec: command encoding and reply decoding.
//!
//! Stateless free functions over [`WriteBuf`]/[`ReadBuf`]. Commands go out
//! as an array of bulk strings; replies come back by single-byte dispatch,
//! recursing for arrays. Bulk strings are strictly length-driven — the
//! payload is never scanned for a terminator.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::core::command::Cmd;
use crate::io::{ReadBuf, WriteBuf};
use crate::proto::error::{classify_error, Error, Result};
use crate::proto::frame::Reply;

/// Encodes a command as `*<argc>\r\n` followed by one `$<len>\r\n<bytes>\r\n`
/// block per argument, in the order given. Lengths are always computed from
/// the argument bytes themselves.
///
/// The bytes land in the sink's buffer; the caller decides when to flush.
pub fn encode_command<W: Write>(sink: &mut WriteBuf<W>, cmd: &Cmd) -> Result<()> {
    sink.write_u8(b'*')?;
    sink.write_i64_crlf(cmd.len() as i64)?;
    for arg in cmd.args() {
        sink.write_u8(b'$')?;
        sink.write_i64_crlf(arg.len() as i64)?;
        sink.write_all(arg)?;
        sink.write_crlf()?;
    }
    Ok(())
}

/// Decodes one reply by dispatching on the leading type byte.
///
/// A top-level `-` line is classified and returned as
/// [`Error::Server`] — never as a value. Inside arrays, a failed element
/// is captured in place as [`Reply::Error`] instead of aborting the
/// surrounding decode. Any other failure is a transport or protocol error.
pub fn read_reply<R: Read>(source: &mut ReadBuf<R>) -> Result<Reply> {
    let type_byte = source.read_u8()?;
    match type_byte {
        b'+' => Ok(Reply::SimpleString(source.read_line_bytes()?)),
        b'$' => read_bulk_string(source),
        b'*' => read_array(source),
        b':' => Ok(Reply::Integer(source.read_i64_crlf()?)),
        b'-' => {
            let line = source.read_line()?;
            Err(Error::Server {
                source: classify_error(&line),
            })
        }
        other => Err(Error::Protocol {
            message: format!("unknown reply type byte 0x{other:02x}"),
        }),
    }
}

/// Best-effort read of a trailing error line after a failed send.
///
/// The server may have written an error before closing, which is common
/// when it rejected malformed input. If whatever remains buffered is not
/// an error reply, or reading it fails, returns `None` — this path must
/// never raise.
pub fn read_error_line_if_possible<R: Read>(source: &mut ReadBuf<R>) -> Option<String> {
    let type_byte = source.read_u8().ok()?;
    if type_byte != b'-' {
        return None;
    }
    source.read_line().ok()
}

fn read_bulk_string<R: Read>(source: &mut ReadBuf<R>) -> Result<Reply> {
    let len = source.read_i64_crlf()?;
    if len == -1 {
        return Ok(Reply::BulkString(None));
    }
    let len = usize::try_from(len).map_err(|_| Error::Protocol {
        message: format!("invalid bulk string length {len}"),
    })?;

    let mut payload = vec![0u8; len];
    let mut offset = 0;
    while offset < len {
        offset += source.read_into(&mut payload[offset..])?;
    }

    let cr = source.read_u8()?;
    let lf = source.read_u8()?;
    if cr != b'\r' || lf != b'\n' {
        return Err(Error::Protocol {
            message: "bulk string payload not terminated by CRLF".to_string(),
        });
    }

    Ok(Reply::BulkString(Some(Bytes::from(payload))))
}

fn read_array<R: Read>(source: &mut ReadBuf<R>) -> Result<Reply> {
    let count = source.read_i64_crlf()?;
    if count == -1 {
        return Ok(Reply::Array(None));
    }
    let count = usize::try_from(count).map_err(|_| Error::Protocol {
        message: format!("invalid array count {count}"),
    })?;

    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        match read_reply(source) {
            Ok(item) => items.push(item),
            Err(Error::Server { source }) => items.push(Reply::Error(source)),
            Err(e) => return Err(e),
        }
    }
    Ok(Reply::Array(Some(items)))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::proto::error::ServerError;

    fn encoded(cmd: &Cmd) -> Vec<u8> {
        let mut sink = WriteBuf::new(Vec::new(), 8192);
        encode_command(&mut sink, cmd).unwrap();
        sink.flush().unwrap();
        sink.get_ref().clone()
    }

    fn decoded(wire: &[u8]) -> Result<Reply> {
        let mut source = ReadBuf::new(Cursor::new(wire.to_vec()), 8192);
        read_reply(&mut source)
    }

    #[test]
    fn test_encode_ping() {
        let cmd = Cmd::new("PING");
        assert_eq!(encoded(&cmd), b"*1\r\n$4\r\nPING\r\n");
    }

    #[test]
    fn test_encode_preserves_argument_order_and_bytes() {
        let cmd = Cmd::new("SET").arg("key").arg(Bytes::from_static(b"\x00\xffbin"));
        assert_eq!(
            encoded(&cmd),
            b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\n\x00\xffbin\r\n"
        );
    }

    #[test]
    fn test_round_trip_through_array_grammar() {
        // A reflected command decodes back to the original argument bytes.
        let args: &[&[u8]] = &[b"MSET", b"a", b"\x01\x02\x03", b"", b"last"];
        let mut cmd = Cmd::new(Bytes::copy_from_slice(args[0]));
        for arg in &args[1..] {
            cmd = cmd.arg(Bytes::copy_from_slice(arg));
        }

        let reply = decoded(&encoded(&cmd)).unwrap();
        let items = reply.as_array().unwrap();
        assert_eq!(items.len(), args.len());
        for (item, expected) in items.iter().zip(args) {
            assert_eq!(item.as_bulk().unwrap().as_ref(), *expected);
        }
    }

    #[test]
    fn test_decode_simple_string() {
        assert_eq!(
            decoded(b"+PONG\r\n").unwrap(),
            Reply::SimpleString(b"PONG".to_vec())
        );
    }

    #[test]
    fn test_decode_integer() {
        assert_eq!(decoded(b":1000\r\n").unwrap(), Reply::Integer(1000));
        assert_eq!(decoded(b":-1\r\n").unwrap(), Reply::Integer(-1));
    }

    #[test]
    fn test_decode_bulk_string() {
        assert_eq!(
            decoded(b"$6\r\nfoobar\r\n").unwrap(),
            Reply::BulkString(Some(Bytes::from_static(b"foobar")))
        );
    }

    #[test]
    fn test_decode_null_bulk_vs_empty_bulk() {
        assert_eq!(decoded(b"$-1\r\n").unwrap(), Reply::BulkString(None));
        assert_eq!(
            decoded(b"$0\r\n\r\n").unwrap(),
            Reply::BulkString(Some(Bytes::new()))
        );
    }

    #[test]
    fn test_decode_null_array_vs_empty_array() {
        assert_eq!(decoded(b"*-1\r\n").unwrap(), Reply::Array(None));
        assert_eq!(decoded(b"*0\r\n").unwrap(), Reply::Array(Some(Vec::new())));
    }

    #[test]
    fn test_decode_nested_array() {
        let reply = decoded(b"*2\r\n*1\r\n:1\r\n$2\r\nok\r\n").unwrap();
        assert_eq!(
            reply,
            Reply::Array(Some(vec![
                Reply::Array(Some(vec![Reply::Integer(1)])),
                Reply::BulkString(Some(Bytes::from_static(b"ok"))),
            ]))
        );
    }

    #[test]
    fn test_decode_top_level_error_raises() {
        let err = decoded(b"-ERR unknown command\r\n").unwrap_err();
        match err {
            Error::Server { source } => {
                assert_eq!(source.message(), "ERR unknown command");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_error_inside_array_captured_in_place() {
        let reply = decoded(b"*2\r\n-ERR bad element\r\n:7\r\n").unwrap();
        let items = reply.as_array().unwrap();
        assert_eq!(
            items[0],
            Reply::Error(ServerError::Data {
                message: "ERR bad element".to_string()
            })
        );
        assert_eq!(items[1], Reply::Integer(7));
    }

    #[test]
    fn test_decode_unknown_type_byte() {
        let err = decoded(b"!oops\r\n").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_bulk_truncated_payload() {
        // Declared length longer than the stream.
        let err = decoded(b"$10\r\nshort\r\n").unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[test]
    fn test_decode_bulk_missing_terminator() {
        let err = decoded(b"$3\r\nfooXY").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_bulk_payload_may_contain_crlf() {
        // Length-driven decode: the payload is never scanned.
        assert_eq!(
            decoded(b"$6\r\nab\r\ncd\r\n").unwrap(),
            Reply::BulkString(Some(Bytes::from_static(b"ab\r\ncd")))
        );
    }

    #[test]
    fn test_decode_bulk_with_tiny_buffer_loops_fills() {
        let mut source = ReadBuf::new(Cursor::new(b"$8\r\nabcdefgh\r\n".to_vec()), 4);
        let reply = read_reply(&mut source).unwrap();
        assert_eq!(reply, Reply::BulkString(Some(Bytes::from_static(b"abcdefgh"))));
    }

    #[test]
    fn test_read_error_line_if_possible() {
        let mut source = ReadBuf::new(
            Cursor::new(b"-ERR Protocol error: invalid multibulk length\r\n".to_vec()),
            8192,
        );
        assert_eq!(
            read_error_line_if_possible(&mut source).as_deref(),
            Some("ERR Protocol error: invalid multibulk length")
        );

        let mut source = ReadBuf::new(Cursor::new(b"+OK\r\n".to_vec()), 8192);
        assert_eq!(read_error_line_if_possible(&mut source), None);

        let mut source = ReadBuf::new(Cursor::new(Vec::new()), 8192);
        assert_eq!(read_error_line_if_possible(&mut source), None);
    }

    #[test]
    fn test_decode_redirect_error() {
        let err = decoded(b"-MOVED 3999 127.0.0.1:7001\r\n").unwrap_err();
        match err {
            Error::Server {
                source: ServerError::Moved { slot, target, .. },
            } => {
                assert_eq!(slot, 3999);
                assert_eq!(target.to_string(), "127.0.0.1:7001");
            }
            other => panic!("expected Moved, got {other:?}"),
        }
    }
}
