use std::io::{self, Write};

/// Smallest power of ten with `index + 1` digits, minus one. Used to size
/// the decimal rendering of an integer before any digit is written.
const SIZE_TABLE: [u64; 19] = [
    9,
    99,
    999,
    9_999,
    99_999,
    999_999,
    9_999_999,
    99_999_999,
    999_999_999,
    9_999_999_999,
    99_999_999_999,
    999_999_999_999,
    9_999_999_999_999,
    99_999_999_999_999,
    999_999_999_999_999,
    9_999_999_999_999_999,
    99_999_999_999_999_999,
    999_999_999_999_999_999,
    9_999_999_999_999_999_999,
];

const DIGIT_TENS: [u8; 100] = [
    b'0', b'0', b'0', b'0', b'0', b'0', b'0', b'0', b'0', b'0', b'1', b'1', b'1', b'1', b'1', b'1',
    b'1', b'1', b'1', b'1', b'2', b'2', b'2', b'2', b'2', b'2', b'2', b'2', b'2', b'2', b'3', b'3',
    b'3', b'3', b'3', b'3', b'3', b'3', b'3', b'3', b'4', b'4', b'4', b'4', b'4', b'4', b'4', b'4',
    b'4', b'4', b'5', b'5', b'5', b'5', b'5', b'5', b'5', b'5', b'5', b'5', b'6', b'6', b'6', b'6',
    b'6', b'6', b'6', b'6', b'6', b'6', b'7', b'7', b'7', b'7', b'7', b'7', b'7', b'7', b'7', b'7',
    b'8', b'8', b'8', b'8', b'8', b'8', b'8', b'8', b'8', b'8', b'9', b'9', b'9', b'9', b'9', b'9',
    b'9', b'9', b'9', b'9',
];

const DIGIT_ONES: [u8; 100] = [
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'1', b'2', b'3', b'4', b'5',
    b'6', b'7', b'8', b'9', b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'1',
    b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7',
    b'8', b'9', b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'1', b'2', b'3',
    b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9',
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'1', b'2', b'3', b'4', b'5',
    b'6', b'7', b'8', b'9',
];

const DIGITS: [u8; 10] = [b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9'];

/// A fixed-capacity buffered writer for the outbound half of a connection.
///
/// Writes accumulate in the buffer; a write that would overflow it flushes
/// the buffered bytes first, and a write at least as large as the whole
/// buffer bypasses it entirely and goes straight to the underlying stream.
/// [`write_i64_crlf`](WriteBuf::write_i64_crlf) renders the decimal digits
/// of an integer in place without allocating, which matters because every
/// argument-count and argument-length prefix on the wire goes through it.
///
/// Nothing reaches the stream until the buffer fills or
/// [`flush`](WriteBuf::flush) is called.
#[derive(Debug)]
pub struct WriteBuf<W> {
    inner: W,
    buf: Box<[u8]>,
    pos: usize,
}

impl<W: Write> WriteBuf<W> {
    /// Creates a buffered writer with the given buffer capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(inner: W, capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be positive");
        Self {
            inner,
            buf: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
        }
    }

    /// Appends a single byte.
    pub fn write_u8(&mut self, b: u8) -> io::Result<()> {
        if self.pos == self.buf.len() {
            self.flush_buffer()?;
        }
        self.buf[self.pos] = b;
        self.pos += 1;
        Ok(())
    }

    /// Appends a byte slice.
    ///
    /// Slices at least as long as the buffer are written directly to the
    /// underlying stream after the current buffer contents, skipping the
    /// intermediate copy.
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if data.len() >= self.buf.len() {
            self.flush_buffer()?;
            self.inner.write_all(data)
        } else {
            if data.len() > self.buf.len() - self.pos {
                self.flush_buffer()?;
            }
            self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
            self.pos += data.len();
            Ok(())
        }
    }

    /// Appends the `\r\n` line terminator.
    pub fn write_crlf(&mut self) -> io::Result<()> {
        if self.buf.len() < 2 {
            // Buffer can never hold both bytes at once.
            self.write_u8(b'\r')?;
            return self.write_u8(b'\n');
        }
        if self.buf.len() - self.pos < 2 {
            self.flush_buffer()?;
        }
        self.buf[self.pos] = b'\r';
        self.buf[self.pos + 1] = b'\n';
        self.pos += 2;
        Ok(())
    }

    /// Appends the minimal decimal representation of `value` followed by
    /// `\r\n`, without heap allocation.
    ///
    /// The digit count is computed up front from magnitude thresholds and
    /// the digits are filled right to left, two at a time above 65536.
    pub fn write_i64_crlf(&mut self, value: i64) -> io::Result<()> {
        if value < 0 {
            self.write_u8(b'-')?;
        }
        let magnitude = value.unsigned_abs();

        let mut index = 0;
        while magnitude > SIZE_TABLE[index] {
            index += 1;
        }
        let size = index + 1;

        if size > self.buf.len() - self.pos {
            self.flush_buffer()?;
        }
        if size <= self.buf.len() {
            fill_digits(&mut self.buf, self.pos + size, magnitude);
            self.pos += size;
        } else {
            // Buffer smaller than the rendered integer: render on the
            // stack and take the ordinary slice path.
            let mut scratch = [0u8; 20];
            fill_digits(&mut scratch, size, magnitude);
            self.write_all(&scratch[..size])?;
        }

        self.write_crlf()
    }

    /// Pushes all buffered bytes to the underlying stream and flushes it.
    ///
    /// A no-op apart from the stream flush when the buffer is empty.
    pub fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()?;
        self.inner.flush()
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        if self.pos > 0 {
            self.inner.write_all(&self.buf[..self.pos])?;
            self.pos = 0;
        }
        Ok(())
    }
}

/// Fills `buf[..end]` right to left with the decimal digits of `value`.
fn fill_digits(buf: &mut [u8], end: usize, mut value: u64) {
    let mut pos = end;
    while value >= 65536 {
        let q = value / 100;
        let r = (value - q * 100) as usize;
        value = q;
        pos -= 1;
        buf[pos] = DIGIT_ONES[r];
        pos -= 1;
        buf[pos] = DIGIT_TENS[r];
    }
    loop {
        let q = value / 10;
        let r = (value - q * 10) as usize;
        pos -= 1;
        buf[pos] = DIGITS[r];
        value = q;
        if value == 0 {
            break;
        }
    }
}
