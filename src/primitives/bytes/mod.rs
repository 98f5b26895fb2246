#![forbid(unsafe_code)]
//! Fixed-width field access and bounds-checked slicing for page buffers.

pub mod le {
    //! Little-endian field helpers.
    //!
    //! These panic when the slice is too short: callers address fields whose
    //! position they have already established.

    use core::convert::TryInto;

    const U16_LEN: usize = core::mem::size_of::<u16>();
    const U64_LEN: usize = core::mem::size_of::<u64>();

    /// Reads a little-endian u16 at `pos`.
    pub fn get_u16(src: &[u8], pos: usize) -> u16 {
        let bytes: [u8; U16_LEN] = field(src, pos, U16_LEN).try_into().unwrap();
        u16::from_le_bytes(bytes)
    }

    /// Writes `v` as a little-endian u16 at `pos`.
    pub fn put_u16(dst: &mut [u8], pos: usize, v: u16) {
        field_mut(dst, pos, U16_LEN).copy_from_slice(&v.to_le_bytes());
    }

    /// Reads a little-endian u64 at `pos`.
    pub fn get_u64(src: &[u8], pos: usize) -> u64 {
        let bytes: [u8; U64_LEN] = field(src, pos, U64_LEN).try_into().unwrap();
        u64::from_le_bytes(bytes)
    }

    /// Writes `v` as a little-endian u64 at `pos`.
    pub fn put_u64(dst: &mut [u8], pos: usize, v: u64) {
        field_mut(dst, pos, U64_LEN).copy_from_slice(&v.to_le_bytes());
    }

    fn field(src: &[u8], pos: usize, len: usize) -> &[u8] {
        src.get(pos..pos + len).unwrap_or_else(|| {
            panic!(
                "field {}..{} beyond buffer of {} bytes",
                pos,
                pos + len,
                src.len()
            )
        })
    }

    fn field_mut(dst: &mut [u8], pos: usize, len: usize) -> &mut [u8] {
        let have = dst.len();
        dst.get_mut(pos..pos + len).unwrap_or_else(|| {
            panic!(
                "field {}..{} beyond buffer of {} bytes",
                pos,
                pos + len,
                have
            )
        })
    }
}

pub mod buf {
    //! Explicit (offset, length) spans and a fallible read cursor.

    use core::fmt;

    use crate::types::{PageError, Result};

    /// A byte range inside some buffer, checked against it on every use.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Span {
        /// First byte of the range.
        pub start: usize,
        /// Number of bytes in the range.
        pub len: usize,
    }

    impl Span {
        /// Creates a span of `len` bytes starting at `start`.
        pub const fn new(start: usize, len: usize) -> Self {
            Self { start, len }
        }

        /// One past the last byte, or `None` on overflow.
        pub fn end(&self) -> Option<usize> {
            self.start.checked_add(self.len)
        }

        /// Returns the bytes covered by the span, if `buf` is long enough.
        pub fn get<'a>(&self, buf: &'a [u8]) -> Option<&'a [u8]> {
            buf.get(self.start..self.end()?)
        }

        /// Mutable variant of [`Span::get`].
        pub fn get_mut<'a>(&self, buf: &'a mut [u8]) -> Option<&'a mut [u8]> {
            let end = self.end()?;
            buf.get_mut(self.start..end)
        }
    }

    /// Cursor over untrusted bytes; running off the end is an error, not a panic.
    pub struct Cursor<'a> {
        buf: &'a [u8],
        off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a cursor positioned at `off`.
        pub fn at(buf: &'a [u8], off: usize) -> Self {
            Self { buf, off }
        }

        /// Current read offset.
        pub fn position(&self) -> usize {
            self.off
        }

        /// Takes the next `n` bytes, advancing the offset.
        pub fn take(&mut self, n: usize, truncated_msg: &'static str) -> Result<&'a [u8]> {
            let slice = Span::new(self.off, n)
                .get(self.buf)
                .ok_or(PageError::Malformed(truncated_msg))?;
            self.off += n;
            Ok(slice)
        }

        /// Reads a little-endian u16.
        pub fn read_u16(&mut self, truncated_msg: &'static str) -> Result<u16> {
            let bytes = self.take(2, truncated_msg)?;
            Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }
    }

    impl<'a> fmt::Debug for Cursor<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}
