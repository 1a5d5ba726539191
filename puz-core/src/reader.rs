//! Forward-only cursor over an immutable byte buffer.

use crate::error::{PuzError, Result};

/// A bounds-checked reader over a puzzle file.
///
/// Every read either returns a slice borrowed from the underlying buffer
/// and advances the cursor, or fails with [`PuzError::OutOfBoundsRead`]
/// and leaves the cursor where it was.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Number of bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn can_read(&self, n: usize) -> bool {
        n <= self.remaining()
    }

    fn out_of_bounds(&self, wanted: usize) -> PuzError {
        PuzError::OutOfBoundsRead {
            offset: self.pos,
            wanted,
            len: self.data.len(),
        }
    }

    /// Returns the next `n` bytes without advancing.
    pub fn peek(&self, n: usize) -> Result<&'a [u8]> {
        if !self.can_read(n) {
            return Err(self.out_of_bounds(n));
        }
        Ok(&self.data[self.pos..self.pos + n])
    }

    /// Returns the next `n` bytes and advances past them.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8]> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(N)?);
        Ok(out)
    }

    #[inline]
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read(1)?[0])
    }

    #[inline]
    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Reads up to the next NUL byte, consumes the NUL, and returns the
    /// bytes before it.
    pub fn read_nul_terminated(&mut self) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let Some(len) = rest.iter().position(|&b| b == 0) else {
            return Err(self.out_of_bounds(rest.len() + 1));
        };
        let bytes = &rest[..len];
        self.pos += len + 1;
        Ok(bytes)
    }

    /// Reads a NUL-terminated string, decoding it from the single-byte
    /// wire encoding.
    pub fn read_string(&mut self) -> Result<String> {
        self.read_nul_terminated().map(crate::text::decode_text)
    }

    /// Consumes and returns everything after the cursor.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    /// Position of the first occurrence of `needle` in the whole buffer,
    /// independent of the cursor.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        self.data
            .windows(needle.len())
            .position(|window| window == needle)
    }
}
