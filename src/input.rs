//! Forward-only byte sources consumed by the reader.

use std::io::{self, BufRead};

/// A forward-only source of bytes.
///
/// `None` marks the end of input. Once `None` has been returned the source
/// must keep returning `None`.
pub trait Input {
    /// Consume and return the next byte.
    fn next_byte(&mut self) -> Option<u8>;

    /// Return the next byte without consuming it.
    fn peek_byte(&mut self) -> Option<u8>;

    /// Take the error that ended the input early, if any.
    ///
    /// Sources that cannot fail keep the default.
    fn take_error(&mut self) -> Option<io::Error> {
        None
    }
}

impl<T: Input + ?Sized> Input for &mut T {
    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        (**self).next_byte()
    }

    #[inline]
    fn peek_byte(&mut self) -> Option<u8> {
        (**self).peek_byte()
    }

    fn take_error(&mut self) -> Option<io::Error> {
        (**self).take_error()
    }
}

/// Input over an in-memory byte slice.
#[derive(Debug, Clone)]
pub struct SliceInput<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceInput<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The bytes not consumed yet.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl Input for SliceInput<'_> {
    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    #[inline]
    fn peek_byte(&mut self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }
}

/// Input over a buffered stream.
///
/// An I/O error ends the input. The first error is kept until taken with
/// [`Input::take_error`]; a [`Reader`](crate::Reader) does so after every row
/// and turns it into `Err(CsvError::Io)`.
#[derive(Debug)]
pub struct StreamInput<R> {
    inner: R,
    error: Option<io::Error>,
    failed: bool,
}

impl<R: BufRead> StreamInput<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            error: None,
            failed: false,
        }
    }

    /// Returns the I/O error that ended the input, if any.
    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self) -> Option<u8> {
        if self.failed {
            return None;
        }
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "input stream failed, treating as end of input");
                    self.error = Some(e);
                    self.failed = true;
                    return None;
                }
            }
        }
    }
}

impl<R: BufRead> Input for StreamInput<R> {
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.fill()?;
        self.inner.consume(1);
        Some(byte)
    }

    fn peek_byte(&mut self) -> Option<u8> {
        self.fill()
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    #[test]
    fn test_slice_input() {
        let mut input = SliceInput::new(b"ab");
        assert_eq!(input.peek_byte(), Some(b'a'));
        assert_eq!(input.next_byte(), Some(b'a'));
        assert_eq!(input.position(), 1);
        assert_eq!(input.remaining(), b"b");
        assert_eq!(input.next_byte(), Some(b'b'));
        assert_eq!(input.next_byte(), None);
        assert_eq!(input.peek_byte(), None);
    }

    #[test]
    fn test_stream_input_small_buffer() {
        let reader = BufReader::with_capacity(2, Cursor::new(b"hello".to_vec()));
        let mut input = StreamInput::new(reader);
        let mut out = Vec::new();
        while let Some(b) = input.next_byte() {
            out.push(b);
        }
        assert_eq!(out, b"hello");
        assert!(input.error().is_none());
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("boom"))
        }
    }

    #[test]
    fn test_stream_input_error_ends_input() {
        let mut input = StreamInput::new(BufReader::new(Failing));
        assert_eq!(input.peek_byte(), None);
        assert_eq!(input.next_byte(), None);
        let err = input.take_error().unwrap();
        assert_eq!(err.to_string(), "boom");
        assert!(input.take_error().is_none());
        assert_eq!(input.next_byte(), None);
    }
}
