//! Append-only byte writer with backpatching.

use crate::error::{PuzError, Result};

#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn write_u16_le(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes `bytes` followed by a NUL terminator.
    pub fn write_nul_terminated(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.buf.push(0);
    }

    /// Encodes `text` to the wire encoding and writes it NUL-terminated.
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        let bytes = crate::text::encode_text(text)?;
        self.write_nul_terminated(&bytes);
        Ok(())
    }

    /// Writes `n` zero bytes and returns the offset they start at, for a
    /// later [`Writer::overwrite_at`].
    pub fn write_placeholder(&mut self, n: usize) -> usize {
        let offset = self.buf.len();
        self.buf.resize(offset + n, 0);
        offset
    }

    /// Replaces already-written bytes starting at `offset`. The whole
    /// region must already exist.
    pub fn overwrite_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= self.buf.len())
            .ok_or(PuzError::OutOfBoundsWrite {
                offset,
                wanted: bytes.len(),
                len: self.buf.len(),
            })?;
        self.buf[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn overwrite_u16_le(&mut self, offset: usize, value: u16) -> Result<()> {
        self.overwrite_at(offset, &value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_backpatch() {
        let mut writer = Writer::new();
        writer.write_byte(0xFF);
        let at = writer.write_placeholder(2);
        writer.write_string("ok").unwrap();

        assert_eq!(at, 1);
        assert_eq!(writer.as_bytes(), &[0xFF, 0, 0, b'o', b'k', 0]);

        writer.overwrite_u16_le(at, 0xBEEF).unwrap();
        assert_eq!(writer.into_bytes(), vec![0xFF, 0xEF, 0xBE, b'o', b'k', 0]);
    }

    #[test]
    fn test_overwrite_must_fit() {
        let mut writer = Writer::new();
        writer.write_u16_le(7);

        assert!(writer.overwrite_at(1, &[1]).is_ok());
        assert_eq!(
            writer.overwrite_at(1, &[1, 2]),
            Err(PuzError::OutOfBoundsWrite {
                offset: 1,
                wanted: 2,
                len: 2
            })
        );
        assert!(writer.overwrite_u16_le(usize::MAX, 0).is_err());
    }
}
