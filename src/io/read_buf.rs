use std::io::{self, Read};

use crate::proto::error::{Error, Result};

/// A fixed-capacity buffered reader for the inbound half of a connection.
///
/// Maintains a read cursor and a valid-data limit into an owned buffer and
/// refills from the underlying stream only when the cursor catches up to
/// the limit. A refill that returns no data is reported as an unexpected
/// end of stream rather than silently looping.
///
/// Line reads take a fast path when the whole `\r\n`-terminated line is
/// already inside the buffered window, falling back to incremental
/// accumulation when a refill boundary is crossed mid-line. Both paths
/// produce identical output.
#[derive(Debug)]
pub struct ReadBuf<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    limit: usize,
}

impl<R: Read> ReadBuf<R> {
    /// Creates a buffered reader with the given buffer capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(inner: R, capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be positive");
        Self {
            inner,
            buf: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            limit: 0,
        }
    }

    /// Reads a single byte, refilling if the buffer is exhausted.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure_fill()?;
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Reads a `\r\n`-terminated line and decodes it as UTF-8 (lossy).
    ///
    /// A zero-length line is reported as a connection error: the RESP
    /// grammar never produces an empty line at the points where textual
    /// lines are read, so one means the server closed mid-reply.
    pub fn read_line(&mut self) -> Result<String> {
        let line = self.read_line_bytes()?;
        if line.is_empty() {
            return Err(Error::Connection {
                message: "server closed the connection mid-reply".to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Reads a `\r\n`-terminated line, returning its content without the
    /// terminator.
    pub fn read_line_bytes(&mut self) -> Result<Vec<u8>> {
        // Typical case: the whole line sits inside the buffered window and
        // can be located and copied out in one pass. Crossing the window
        // edge falls back to byte-wise accumulation.
        self.ensure_fill()?;

        let mut pos = self.pos;
        loop {
            if pos == self.limit {
                return self.read_line_bytes_slowly();
            }
            if self.buf[pos] == b'\r' {
                pos += 1;
                if pos == self.limit {
                    return self.read_line_bytes_slowly();
                }
                if self.buf[pos] == b'\n' {
                    pos += 1;
                    break;
                }
                // The byte after a bare `\r` is data, never the start of a
                // new terminator.
                pos += 1;
            } else {
                pos += 1;
            }
        }

        let line = self.buf[self.pos..pos - 2].to_vec();
        self.pos = pos;
        Ok(line)
    }

    /// Parses a signed decimal integer terminated by `\r\n`.
    ///
    /// Any byte that is neither a digit nor part of the terminator is a
    /// protocol error, as is a value outside the `i64` range.
    pub fn read_i64_crlf(&mut self) -> Result<i64> {
        self.ensure_fill()?;

        let negative = self.buf[self.pos] == b'-';
        if negative {
            self.pos += 1;
        }

        let mut magnitude: u64 = 0;
        loop {
            self.ensure_fill()?;
            let b = self.buf[self.pos];
            self.pos += 1;

            if b == b'\r' {
                self.ensure_fill()?;
                let c = self.buf[self.pos];
                self.pos += 1;
                if c != b'\n' {
                    return Err(Error::Protocol {
                        message: "integer line not terminated by CRLF".to_string(),
                    });
                }
                break;
            }

            if !b.is_ascii_digit() {
                return Err(Error::Protocol {
                    message: format!("unexpected byte 0x{b:02x} in integer line"),
                });
            }
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(u64::from(b - b'0')))
                .ok_or_else(|| Error::Protocol {
                    message: "integer out of range".to_string(),
                })?;
        }

        if negative {
            if magnitude > i64::MAX as u64 + 1 {
                return Err(Error::Protocol {
                    message: "integer out of range".to_string(),
                });
            }
            Ok((magnitude as i64).wrapping_neg())
        } else {
            i64::try_from(magnitude).map_err(|_| Error::Protocol {
                message: "integer out of range".to_string(),
            })
        }
    }

    /// Copies currently buffered bytes into `dst` after at most one fill.
    ///
    /// Returns how many bytes were copied, which may be fewer than
    /// `dst.len()`. Callers needing an exact count must loop.
    pub fn read_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.ensure_fill()?;
        let n = (self.limit - self.pos).min(dst.len());
        dst[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn ensure_fill(&mut self) -> Result<()> {
        if self.pos >= self.limit {
            self.limit = loop {
                match self.inner.read(&mut self.buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(Error::Io { source: e }),
                }
            };
            self.pos = 0;
            if self.limit == 0 {
                return Err(Error::Connection {
                    message: "unexpected end of stream".to_string(),
                });
            }
        }
        Ok(())
    }

    fn read_line_bytes_slowly(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(16);
        loop {
            self.ensure_fill()?;
            let b = self.buf[self.pos];
            self.pos += 1;
            if b == b'\r' {
                // Must be one more byte.
                self.ensure_fill()?;
                let c = self.buf[self.pos];
                self.pos += 1;
                if c == b'\n' {
                    break;
                }
                out.push(b);
                out.push(c);
            } else {
                out.push(b);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn reader(data: &[u8], capacity: usize) -> ReadBuf<Cursor<Vec<u8>>> {
        ReadBuf::new(Cursor::new(data.to_vec()), capacity)
    }

    #[test]
    fn test_read_u8_sequence() {
        let mut r = reader(b"abc", 2);
        assert_eq!(r.read_u8().unwrap(), b'a');
        assert_eq!(r.read_u8().unwrap(), b'b');
        assert_eq!(r.read_u8().unwrap(), b'c');
        assert!(matches!(r.read_u8(), Err(Error::Connection { .. })));
    }

    #[test]
    fn test_read_line_bytes_fast_path() {
        let mut r = reader(b"PONG\r\nrest", 4096);
        assert_eq!(r.read_line_bytes().unwrap(), b"PONG");
        assert_eq!(r.read_u8().unwrap(), b'r');
    }

    #[test]
    fn test_read_line_bytes_slow_path_matches_fast() {
        // A 20-byte line against an 8-byte buffer forces the slow path;
        // output must be identical to the single-window case.
        let line = b"abcdefghijklmnopqrst";
        let mut wire = line.to_vec();
        wire.extend_from_slice(b"\r\n");

        let mut slow = reader(&wire, 8);
        let mut fast = reader(&wire, 4096);
        assert_eq!(slow.read_line_bytes().unwrap(), line);
        assert_eq!(fast.read_line_bytes().unwrap(), line);
    }

    #[test]
    fn test_read_line_bytes_cr_split_across_fill() {
        // Terminator straddles the refill boundary.
        let mut r = reader(b"abcdefg\r\nx", 8);
        assert_eq!(r.read_line_bytes().unwrap(), b"abcdefg");
        assert_eq!(r.read_u8().unwrap(), b'x');
    }

    #[test]
    fn test_read_line_bytes_lone_cr_kept() {
        let mut r = reader(b"a\rb\r\n", 4096);
        assert_eq!(r.read_line_bytes().unwrap(), b"a\rb");
    }

    #[test]
    fn test_read_line_bytes_cr_run_before_terminator() {
        // A `\r` directly before the terminator is data. Both paths must
        // swallow the `\r\n` that follows it identically, or the second
        // line would start at different stream positions.
        let wire = b"a\r\r\nX\r\nnext\r\n";

        let mut fast = reader(wire, 4096);
        assert_eq!(fast.read_line_bytes().unwrap(), b"a\r\r\nX");
        assert_eq!(fast.read_line_bytes().unwrap(), b"next");

        let mut slow = reader(wire, 3);
        assert_eq!(slow.read_line_bytes().unwrap(), b"a\r\r\nX");
        assert_eq!(slow.read_line_bytes().unwrap(), b"next");
    }

    #[test]
    fn test_read_line_rejects_empty() {
        let mut r = reader(b"\r\n", 16);
        assert!(matches!(r.read_line(), Err(Error::Connection { .. })));
    }

    #[test]
    fn test_read_i64() {
        let mut r = reader(b"1000\r\n-42\r\n0\r\n", 4);
        assert_eq!(r.read_i64_crlf().unwrap(), 1000);
        assert_eq!(r.read_i64_crlf().unwrap(), -42);
        assert_eq!(r.read_i64_crlf().unwrap(), 0);
    }

    #[test]
    fn test_read_i64_extremes() {
        let mut r = reader(b"9223372036854775807\r\n-9223372036854775808\r\n", 16);
        assert_eq!(r.read_i64_crlf().unwrap(), i64::MAX);
        assert_eq!(r.read_i64_crlf().unwrap(), i64::MIN);
    }

    #[test]
    fn test_read_i64_rejects_non_digit() {
        let mut r = reader(b"12a4\r\n", 16);
        assert!(matches!(r.read_i64_crlf(), Err(Error::Protocol { .. })));
    }

    #[test]
    fn test_read_i64_rejects_overflow() {
        let mut r = reader(b"9223372036854775808\r\n", 32);
        assert!(matches!(r.read_i64_crlf(), Err(Error::Protocol { .. })));
    }

    #[test]
    fn test_read_into_single_fill() {
        let mut r = reader(b"0123456789", 4);
        let mut dst = [0u8; 10];
        // One fill buffers at most 4 bytes.
        assert_eq!(r.read_into(&mut dst).unwrap(), 4);
        assert_eq!(&dst[..4], b"0123");
        assert_eq!(r.read_into(&mut dst).unwrap(), 4);
        assert_eq!(r.read_into(&mut dst).unwrap(), 2);
    }

    #[test]
    fn test_read_into_bounded_by_dst() {
        let mut r = reader(b"abcdef", 4096);
        let mut dst = [0u8; 2];
        assert_eq!(r.read_into(&mut dst).unwrap(), 2);
        assert_eq!(&dst, b"ab");
    }

    #[test]
    fn test_eof_is_connection_error() {
        let mut r = reader(b"", 8);
        assert!(matches!(
            r.read_line_bytes(),
            Err(Error::Connection { .. })
        ));
    }
}
