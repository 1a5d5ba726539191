//! The fixed 52-byte header
//!
//! Layout (offsets from the global checksum, after any preamble):
//! `checksum(2) | "ACROSS&DOWN\0"(12) | cib(2) | masked low(4) | masked high(4)
//!  | version(4) | reserved(2) | scramble checksum(2) | reserved(12)
//!  | width(1) | height(1) | clues(2) | bitmask(2) | scramble tag(2)`

use std::fmt;
use std::ops::Range;

use crate::checksum::Checksums;
use crate::error::{PuzError, Result};
use crate::reader::Reader;
use crate::writer::Writer;

pub const FILE_MAGIC: &[u8; 12] = b"ACROSS&DOWN\0";
pub const HEADER_LEN: usize = 52;

pub(crate) const GLOBAL_CHECKSUM_OFFSET: usize = 0;
pub(crate) const CIB_CHECKSUM_OFFSET: usize = 14;
pub(crate) const MASKED_LOW_OFFSET: usize = 16;
pub(crate) const MASKED_HIGH_OFFSET: usize = 20;
/// Width, height, clue count, bitmask and scramble tag.
pub(crate) const CIB_RANGE: Range<usize> = 44..52;

/// Format version, kept as its four raw bytes. Some publishers do not
/// NUL-terminate it, so the last byte is preserved as found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version([u8; 4]);

impl Version {
    pub const DEFAULT: Version = Version(*b"1.4\0");

    /// Accepts `"X.X"` with ASCII digits.
    pub fn parse(text: &str) -> Result<Self> {
        match text.as_bytes() {
            &[major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
                Ok(Version([major, b'.', minor, 0]))
            }
            _ => Err(PuzError::InvalidVersionFormat(text.to_string())),
        }
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Version(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0
    }

    /// The `"X.X"` part; empty if a file stored something unreadable.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0[..3]).unwrap_or("")
    }

    /// Notes only count towards the global checksum from version 1.3 on.
    /// Compared as bytes, the same way Across Lite does.
    pub fn includes_notes_in_checksum(&self) -> bool {
        &self.0[..3] >= b"1.3".as_slice()
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PuzzleType {
    #[default]
    Normal,
    Diagramless,
    /// Any other bitmask, kept so it round-trips.
    Other(u16),
}

impl PuzzleType {
    pub const fn from_bits(bits: u16) -> Self {
        match bits {
            0x0001 => PuzzleType::Normal,
            0x0401 => PuzzleType::Diagramless,
            other => PuzzleType::Other(other),
        }
    }

    pub const fn bits(self) -> u16 {
        match self {
            PuzzleType::Normal => 0x0001,
            PuzzleType::Diagramless => 0x0401,
            PuzzleType::Other(bits) => bits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    /// The checksums stored in the file, not recomputed.
    pub checksums: Checksums,
    pub version: Version,
    pub reserved1: [u8; 2],
    pub scramble_checksum: u16,
    pub reserved2: [u8; 12],
    pub width: u8,
    pub height: u8,
    pub clue_count: u16,
    pub puzzle_type: PuzzleType,
    pub scramble_tag: u16,
}

impl Header {
    pub fn read(reader: &mut Reader) -> Result<Self> {
        if !reader.can_read(HEADER_LEN) {
            return Err(PuzError::UnreadableData);
        }

        let global = reader.read_u16_le()?;
        if reader.read(FILE_MAGIC.len())? != FILE_MAGIC {
            return Err(PuzError::MissingFileMagic);
        }
        let cib = reader.read_u16_le()?;
        let masked_low = reader.read_array()?;
        let masked_high = reader.read_array()?;

        Ok(Self {
            checksums: Checksums {
                global,
                cib,
                masked_low,
                masked_high,
            },
            version: Version::from_bytes(reader.read_array()?),
            reserved1: reader.read_array()?,
            scramble_checksum: reader.read_u16_le()?,
            reserved2: reader.read_array()?,
            width: reader.read_byte()?,
            height: reader.read_byte()?,
            clue_count: reader.read_u16_le()?,
            puzzle_type: PuzzleType::from_bits(reader.read_u16_le()?),
            scramble_tag: reader.read_u16_le()?,
        })
    }

    /// Writes the header with zeroed checksum fields, to be backpatched
    /// once the body is known. Returns the header's start offset.
    pub fn write(&self, writer: &mut Writer) -> usize {
        let start = writer.write_placeholder(2);
        writer.write_bytes(FILE_MAGIC);
        writer.write_placeholder(10);
        writer.write_bytes(&self.version.to_bytes());
        writer.write_bytes(&self.reserved1);
        writer.write_u16_le(self.scramble_checksum);
        writer.write_bytes(&self.reserved2);
        writer.write_bytes(&self.cib_bytes());
        start
    }

    /// The CIB region exactly as it sits at offsets 44..52.
    pub fn cib_bytes(&self) -> [u8; 8] {
        let [clues_lo, clues_hi] = self.clue_count.to_le_bytes();
        let [type_lo, type_hi] = self.puzzle_type.bits().to_le_bytes();
        let [tag_lo, tag_hi] = self.scramble_tag.to_le_bytes();
        [
            self.width,
            self.height,
            clues_lo,
            clues_hi,
            type_lo,
            type_hi,
            tag_lo,
            tag_hi,
        ]
    }

    /// Fills in the computed checksums at the offsets `write` left zeroed.
    pub fn backpatch(writer: &mut Writer, start: usize, sums: &Checksums) -> Result<()> {
        writer.overwrite_u16_le(start + GLOBAL_CHECKSUM_OFFSET, sums.global)?;
        writer.overwrite_u16_le(start + CIB_CHECKSUM_OFFSET, sums.cib)?;
        writer.overwrite_at(start + MASKED_LOW_OFFSET, &sums.masked_low)?;
        writer.overwrite_at(start + MASKED_HIGH_OFFSET, &sums.masked_high)
    }
}
