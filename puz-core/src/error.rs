//! Error type shared by every stage of the codec

use thiserror::Error;

use crate::sections::ExtraSection;

pub type Result<T, E = PuzError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzError {
    #[error("out of bounds read: {wanted} bytes at offset {offset}, buffer holds {len}")]
    OutOfBoundsRead {
        offset: usize,
        wanted: usize,
        len: usize,
    },
    #[error("out of bounds write: {wanted} bytes at offset {offset}, buffer holds {len}")]
    OutOfBoundsWrite {
        offset: usize,
        wanted: usize,
        len: usize,
    },
    #[error("data does not appear to represent a puzzle")]
    UnreadableData,
    #[error("failed to find ACROSS&DOWN in bytes")]
    MissingFileMagic,

    #[error("global checksum mismatch: stored=0x{found:04x} calc=0x{expected:04x}")]
    GlobalChecksumMismatch { expected: u16, found: u16 },
    #[error("CIB checksum mismatch: stored=0x{found:04x} calc=0x{expected:04x}")]
    CibChecksumMismatch { expected: u16, found: u16 },
    #[error("masked low checksum mismatch: stored={found:02x?} calc={expected:02x?}")]
    MaskedLowChecksumMismatch { expected: [u8; 4], found: [u8; 4] },
    #[error("masked high checksum mismatch: stored={found:02x?} calc={expected:02x?}")]
    MaskedHighChecksumMismatch { expected: [u8; 4], found: [u8; 4] },
    #[error("{section} section checksum mismatch: stored=0x{found:04x} calc=0x{expected:04x}")]
    ExtraSectionChecksumMismatch {
        section: ExtraSection,
        expected: u16,
        found: u16,
    },

    #[error("expected {expected} clues, found {found}")]
    ClueCountMismatch { expected: usize, found: usize },
    #[error("board width mismatch: expected {expected}, found {found}")]
    BoardWidthMismatch { expected: usize, found: usize },
    #[error("board height mismatch: expected {expected}, found {found}")]
    BoardHeightMismatch { expected: usize, found: usize },
    #[error("duplicate {0} section")]
    DuplicateExtraSection(ExtraSection),
    #[error("unknown extra section name {0:?}")]
    UnknownExtraSectionName(String),
    #[error("{0} section is listed but has no data")]
    MissingExtraSection(ExtraSection),
    #[error("malformed {section} section: {reason}")]
    MalformedExtraSection {
        section: ExtraSection,
        reason: String,
    },

    #[error("puzzle is already scrambled")]
    PuzzleAlreadyScrambled,
    #[error("puzzle is already unscrambled")]
    PuzzleAlreadyUnscrambled,
    #[error("too few letters to scramble: {0} (need at least 12)")]
    TooFewCharactersToScramble(usize),
    #[error("too few letters to unscramble: {0} (need at least 12)")]
    TooFewCharactersToUnscramble(usize),
    #[error("non-letter solution glyph 0x{glyph:02x} at ({x}, {y})")]
    NonLetterCharactersInGrid { x: usize, y: usize, glyph: u8 },
    #[error("scramble key {0} is not a 4 digit number")]
    InvalidKeyLength(u16),
    #[error("scramble key {0} contains a zero digit")]
    InvalidDigitInKey(u16),
    #[error("incorrect scramble key")]
    IncorrectKeyProvided,

    #[error("invalid version {0:?}, expected the form X.X")]
    InvalidVersionFormat(String),
    #[error("text cannot be stored in a puzzle file: {0:?}")]
    UnencodableText(String),
}
