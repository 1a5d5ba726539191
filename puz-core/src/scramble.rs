/// Solution scrambling: the keyed letter cipher publishers apply to the answer grid
use crate::board::Board;
use crate::checksum::checksum_region;
use crate::error::{PuzError, Result};

pub const MIN_SCRAMBLE_LETTERS: usize = 12;

/// Tag value written when a puzzle is scrambled.
pub const SCRAMBLED_TAG: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrambleState {
    /// Zero means unscrambled
    pub tag: u16,
    /// Checksum of the plain letters, used to recognise the right key
    pub checksum: u16,
}

impl ScrambleState {
    pub fn is_scrambled(&self) -> bool {
        self.tag != 0
    }
}

/// A four digit key with no zero digits, e.g. 1234.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrambleKey([u8; 4]);

impl ScrambleKey {
    pub fn new(key: u16) -> Result<Self> {
        if !(1000..=9999).contains(&key) {
            return Err(PuzError::InvalidKeyLength(key));
        }

        let digits = [key / 1000, key / 100 % 10, key / 10 % 10, key % 10].map(|d| d as u8);
        if digits.contains(&0) {
            return Err(PuzError::InvalidDigitInKey(key));
        }

        Ok(Self(digits))
    }

    pub fn digits(&self) -> [u8; 4] {
        self.0
    }
}

impl TryFrom<u16> for ScrambleKey {
    type Error = PuzError;

    fn try_from(key: u16) -> Result<Self> {
        Self::new(key)
    }
}

/// Next slot in the interleave walk. Past the end, the position wraps by
/// `length + 1` for even lengths and by `length` for odd ones.
pub fn advance(position: usize, stride: usize, length: usize) -> usize {
    let modulus = if length % 2 == 0 { length + 1 } else { length };
    (position + stride) % modulus
}

/// Alternates second half and first half: `ABCDEF` becomes `DAEBFC`.
/// With an odd length the last letter stays last.
fn interleave(letters: Vec<u8>) -> Vec<u8> {
    let len = letters.len();
    let mut out = vec![0; len];
    let mut pos = 1 % len.max(1);
    for letter in letters {
        out[pos] = letter;
        pos = advance(pos, 2, len);
    }
    out
}

fn deinterleave(letters: Vec<u8>) -> Vec<u8> {
    let len = letters.len();
    let mut out = Vec::with_capacity(len);
    let mut pos = 1 % len.max(1);
    for _ in 0..len {
        out.push(letters[pos]);
        pos = advance(pos, 2, len);
    }
    out
}

fn shift(mut letters: Vec<u8>, key: &ScrambleKey) -> Vec<u8> {
    for (i, letter) in letters.iter_mut().enumerate() {
        *letter = (*letter + key.0[i % 4]) % 26;
    }
    letters
}

fn unshift(mut letters: Vec<u8>, key: &ScrambleKey) -> Vec<u8> {
    for (i, letter) in letters.iter_mut().enumerate() {
        *letter = (*letter + 26 - key.0[i % 4]) % 26;
    }
    letters
}

fn rotate_left(mut letters: Vec<u8>, n: u8) -> Vec<u8> {
    let len = letters.len();
    if len > 0 {
        letters.rotate_left(n as usize % len);
    }
    letters
}

fn rotate_right(mut letters: Vec<u8>, n: u8) -> Vec<u8> {
    let len = letters.len();
    if len > 0 {
        letters.rotate_right(n as usize % len);
    }
    letters
}

/// Scrambles letter values in `0..26`.
pub fn scramble_values(mut values: Vec<u8>, key: &ScrambleKey) -> Vec<u8> {
    for digit in key.0 {
        values = shift(values, key);
        values = rotate_left(values, digit);
        values = interleave(values);
    }
    values
}

/// Exact inverse of [`scramble_values`].
pub fn unscramble_values(mut values: Vec<u8>, key: &ScrambleKey) -> Vec<u8> {
    for digit in key.0.into_iter().rev() {
        values = deinterleave(values);
        values = rotate_right(values, digit);
        values = unshift(values, key);
    }
    values
}

/// Uppercase solution letters, column by column, black squares skipped.
pub fn extract_letters(board: &Board) -> Result<Vec<u8>> {
    let mut letters = Vec::with_capacity(board.size());
    for x in 0..board.width() {
        for y in 0..board.height() {
            let Some(cell) = board.cell(x, y) else {
                continue;
            };
            if cell.is_black() {
                continue;
            }
            if !cell.solution.is_ascii_alphabetic() {
                return Err(PuzError::NonLetterCharactersInGrid {
                    x,
                    y,
                    glyph: cell.solution,
                });
            }
            letters.push(cell.solution.to_ascii_uppercase());
        }
    }
    Ok(letters)
}

/// Writes letters back in the order [`extract_letters`] read them.
pub fn replace_letters(board: &mut Board, letters: &[u8]) {
    let mut letters = letters.iter();
    for x in 0..board.width() {
        for y in 0..board.height() {
            let Some(cell) = board.cell_mut(x, y) else {
                continue;
            };
            if !cell.solution.is_ascii_alphabetic() {
                continue;
            }
            if let Some(&letter) = letters.next() {
                cell.solution = letter;
            }
        }
    }
}

fn to_values(letters: &[u8]) -> Vec<u8> {
    letters.iter().map(|&l| l - b'A').collect()
}

fn to_letters(values: &[u8]) -> Vec<u8> {
    values.iter().map(|&v| v + b'A').collect()
}

/// Scrambles the board's letters in place and returns the new state.
pub fn scramble_board(board: &mut Board, key: &ScrambleKey) -> Result<ScrambleState> {
    let plain = extract_letters(board)?;
    if plain.len() < MIN_SCRAMBLE_LETTERS {
        return Err(PuzError::TooFewCharactersToScramble(plain.len()));
    }
    tracing::trace!(letters = plain.len(), "scrambling solution");

    let checksum = checksum_region(&plain, 0);
    let scrambled = to_letters(&scramble_values(to_values(&plain), key));
    replace_letters(board, &scrambled);

    Ok(ScrambleState {
        tag: SCRAMBLED_TAG,
        checksum,
    })
}

/// Unscrambles the board's letters without touching the board. Fails with
/// [`PuzError::IncorrectKeyProvided`] unless the result matches `checksum`.
pub fn unscrambled_letters(board: &Board, key: &ScrambleKey, checksum: u16) -> Result<Vec<u8>> {
    let scrambled = extract_letters(board)?;
    if scrambled.len() < MIN_SCRAMBLE_LETTERS {
        return Err(PuzError::TooFewCharactersToUnscramble(scrambled.len()));
    }

    let plain = to_letters(&unscramble_values(to_values(&scrambled), key));
    if checksum_region(&plain, 0) != checksum {
        return Err(PuzError::IncorrectKeyProvided);
    }
    Ok(plain)
}
