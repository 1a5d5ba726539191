//! core functionality for reading and writing
//! Across Lite `.puz` crossword files
//!
//! # Modules
//!
//! - `codec`: whole-file `decode` / `encode`
//! - `checksum`: the rolling checksum and the four file checksums
//! - `header`: the fixed 52-byte header
//! - `board`: grid, word detection and numbering
//! - `sections`: optional GRBS/RTBL/LTIM/GEXT/RUSR sections
//! - `scramble`: the keyed solution cipher
//! - `puzzle`: the puzzle model, clues and builder
//! - `reader` / `writer`: bounds-checked byte cursors
//! - `text`: Windows-1252 string conversion

pub mod board;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod header;
pub mod puzzle;
pub mod reader;
pub mod scramble;
pub mod sections;
pub mod text;
pub mod writer;

// Re-export commonly used items
pub use board::{Board, Cell, Direction, Markup, Word};
pub use codec::{decode, encode};
pub use error::{PuzError, Result};
pub use header::{PuzzleType, Version};
pub use puzzle::{Clue, Puzzle, PuzzleBuilder};
pub use scramble::ScrambleKey;
pub use sections::{ExtraSection, RebusEntry, Timer};
