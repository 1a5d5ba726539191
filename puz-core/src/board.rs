//! Crossword grid, word detection and numbering

use std::fmt;

use crate::error::{PuzError, Result};

pub const BLACK_SQUARE: u8 = b'.';
pub const DIAGRAMLESS_BLACK_SQUARE: u8 = b':';
pub const EMPTY_SOLUTION_SQUARE: u8 = b' ';
pub const EMPTY_STATE_SQUARE: u8 = b'-';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    fn step(self) -> (usize, usize) {
        match self {
            Direction::Across => (1, 0),
            Direction::Down => (0, 1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => f.write_str("A"),
            Direction::Down => f.write_str("D"),
        }
    }
}

bitflags::bitflags! {
    /// Per-square style flags, stored in the GEXT section.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Markup: u8 {
        const PREVIOUSLY_INCORRECT = 0x10;
        const CURRENTLY_INCORRECT  = 0x20;
        const CONTENT_GIVEN        = 0x40;
        const CIRCLED              = 0x80;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Answer glyph: a letter, a black-square sentinel, or a space for
    /// an unset diagramless square.
    pub solution: u8,
    /// What the solver has entered so far.
    pub state: u8,
    /// Zero when the square has no rebus, otherwise the table key + 1.
    pub rebus_key: u8,
    pub markup: Markup,
}

impl Cell {
    pub fn is_black(&self) -> bool {
        self.solution == BLACK_SQUARE || self.solution == DIAGRAMLESS_BLACK_SQUARE
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            solution: EMPTY_SOLUTION_SQUARE,
            state: EMPTY_STATE_SQUARE,
            rebus_key: 0,
            markup: Markup::empty(),
        }
    }
}

/// A word read off the board. Always derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub num: usize,
    pub x: usize,
    pub y: usize,
    pub direction: Direction,
}

/// Row-major grid of cells. Every row is exactly `width` cells long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// A blank board. Zero dimensions are allowed here; the puzzle
    /// builder is what rejects them.
    pub fn new(width: u8, height: u8) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    /// Builds a board from solution rows. Black squares are mirrored
    /// into the state grid, every other square starts empty.
    pub fn from_solution_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        if width > u8::MAX as usize {
            return Err(PuzError::BoardWidthMismatch {
                expected: u8::MAX as usize,
                found: width,
            });
        }
        if height > u8::MAX as usize {
            return Err(PuzError::BoardHeightMismatch {
                expected: u8::MAX as usize,
                found: height,
            });
        }

        let mut cells = Vec::with_capacity(width * height);
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return Err(PuzError::BoardWidthMismatch {
                    expected: width,
                    found: row.len(),
                });
            }
            cells.extend(row.iter().map(|&solution| {
                let mut cell = Cell {
                    solution,
                    ..Cell::default()
                };
                if cell.is_black() {
                    cell.state = solution;
                }
                cell
            }));
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds a board from the two raw grids of a puzzle file.
    pub(crate) fn from_grids(width: usize, height: usize, solution: &[u8], state: &[u8]) -> Self {
        let cells = solution
            .iter()
            .zip(state)
            .map(|(&solution, &state)| Cell {
                solution,
                state,
                ..Cell::default()
            })
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells.get(y * self.width + x)
    }

    pub fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells.get_mut(y * self.width + x)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        // chunks panics on zero
        self.cells.chunks(self.width.max(1))
    }

    /// Out-of-bounds squares are not black.
    pub fn is_black_square(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_some_and(Cell::is_black)
    }

    fn is_open(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_some_and(|cell| !cell.is_black())
    }

    pub fn starts_across_word(&self, x: usize, y: usize) -> bool {
        self.starts_word(x, y, Direction::Across)
    }

    pub fn starts_down_word(&self, x: usize, y: usize) -> bool {
        self.starts_word(x, y, Direction::Down)
    }

    /// Open square, edge or black square before it, and at least one
    /// open square after it.
    fn starts_word(&self, x: usize, y: usize, direction: Direction) -> bool {
        if !self.is_open(x, y) {
            return false;
        }
        let (dx, dy) = direction.step();
        let at_edge = match direction {
            Direction::Across => x == 0,
            Direction::Down => y == 0,
        };
        (at_edge || self.is_black_square(x - dx, y - dy)) && self.is_open(x + dx, y + dy)
    }

    /// Solution glyphs from (x, y) up to the next black square or edge.
    /// `None` when the start is off the board or black.
    pub fn word(&self, x: usize, y: usize, direction: Direction) -> Option<String> {
        if !self.is_open(x, y) {
            return None;
        }
        let (dx, dy) = direction.step();
        let mut glyphs = Vec::new();
        let (mut cx, mut cy) = (x, y);
        while let Some(cell) = self.cell(cx, cy).filter(|cell| !cell.is_black()) {
            glyphs.push(cell.solution);
            cx += dx;
            cy += dy;
        }
        Some(crate::text::decode_text(&glyphs))
    }

    /// Every word on the board in clue order: squares are numbered in a
    /// row-major scan, one number per starting square shared by both
    /// directions, across before down.
    pub fn words(&self) -> Vec<Word> {
        let mut words = Vec::new();
        let mut next_num = 1;

        for y in 0..self.height {
            for x in 0..self.width {
                let mut numbered = false;
                for direction in [Direction::Across, Direction::Down] {
                    if !self.starts_word(x, y, direction) {
                        continue;
                    }
                    if let Some(text) = self.word(x, y, direction) {
                        words.push(Word {
                            text,
                            num: next_num,
                            x,
                            y,
                            direction,
                        });
                        numbered = true;
                    }
                }
                if numbered {
                    next_num += 1;
                }
            }
        }

        words
    }

    pub fn solution_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.solution).collect()
    }

    pub fn state_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.state).collect()
    }

    pub fn rebus_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.rebus_key).collect()
    }

    pub fn markup_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.markup.bits()).collect()
    }

    pub fn has_rebus(&self) -> bool {
        self.cells.iter().any(|cell| cell.rebus_key != 0)
    }

    pub fn has_markup(&self) -> bool {
        self.cells.iter().any(|cell| !cell.markup.is_empty())
    }

    /// Callers guarantee `keys.len() == self.size()`.
    pub(crate) fn set_rebus_keys(&mut self, keys: &[u8]) {
        for (cell, &key) in self.cells.iter_mut().zip(keys) {
            cell.rebus_key = key;
        }
    }

    /// Callers guarantee `flags.len() == self.size()`.
    pub(crate) fn set_markup(&mut self, flags: &[u8]) {
        for (cell, &bits) in self.cells.iter_mut().zip(flags) {
            cell.markup = Markup::from_bits_retain(bits);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mini() -> Board {
        Board::from_solution_rows(&["BASS.", "ACHED", "STONE", "HORSE", ".REED"]).unwrap()
    }

    #[test]
    fn test_black_square_detection() {
        let mut board = Board::new(5, 5);
        board.cell_mut(0, 0).unwrap().solution = BLACK_SQUARE;
        board.cell_mut(1, 0).unwrap().solution = DIAGRAMLESS_BLACK_SQUARE;

        assert!(board.is_black_square(0, 0));
        assert!(board.is_black_square(1, 0));
        assert!(!board.is_black_square(2, 0));
        assert!(!board.is_black_square(5, 0));
    }

    #[test]
    fn test_word_start_detection() {
        let mut board = Board::new(5, 5);
        board.cell_mut(0, 0).unwrap().solution = BLACK_SQUARE;

        // no word starts in a black square
        assert!(!board.starts_across_word(0, 0));
        assert!(!board.starts_down_word(0, 0));

        // no edge or black square before it
        assert!(!board.starts_across_word(2, 2));
        assert!(!board.starts_down_word(2, 2));

        // edges
        assert!(board.starts_across_word(0, 2));
        assert!(board.starts_down_word(2, 0));

        // after a black square
        assert!(board.starts_across_word(0, 1));
        assert!(board.starts_down_word(1, 0));
        assert!(board.starts_across_word(1, 0));

        // no room left on the board
        assert!(!board.starts_across_word(4, 0));
        assert!(!board.starts_down_word(0, 4));

        // two letters is enough
        board.cell_mut(2, 2).unwrap().solution = BLACK_SQUARE;
        assert!(board.starts_across_word(0, 2));
        assert!(board.starts_down_word(2, 3));

        // one letter is not
        board.cell_mut(1, 2).unwrap().solution = BLACK_SQUARE;
        board.cell_mut(2, 4).unwrap().solution = BLACK_SQUARE;
        assert!(!board.starts_across_word(0, 2));
        assert!(!board.starts_down_word(2, 3));
    }

    #[test]
    fn test_get_word() {
        let board = mini();
        assert_eq!(board.word(0, 0, Direction::Across).as_deref(), Some("BASS"));
        assert_eq!(board.word(0, 0, Direction::Down).as_deref(), Some("BASH"));
        assert_eq!(board.word(4, 1, Direction::Down).as_deref(), Some("DEED"));
        assert_eq!(board.word(2, 2, Direction::Across).as_deref(), Some("ONE"));
        assert_eq!(board.word(4, 0, Direction::Down), None);
        assert_eq!(board.word(9, 0, Direction::Across), None);
    }

    #[test]
    fn test_words_numbering() {
        let words = mini().words();
        let summary: Vec<(usize, Direction, &str)> = words
            .iter()
            .map(|w| (w.num, w.direction, w.text.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (1, Direction::Across, "BASS"),
                (1, Direction::Down, "BASH"),
                (2, Direction::Down, "ACTOR"),
                (3, Direction::Down, "SHORE"),
                (4, Direction::Down, "SENSE"),
                (5, Direction::Across, "ACHED"),
                (6, Direction::Down, "DEED"),
                (7, Direction::Across, "STONE"),
                (8, Direction::Across, "HORSE"),
                (9, Direction::Across, "REED"),
            ]
        );
        assert_eq!((words[9].x, words[9].y), (1, 4));
    }

    #[test]
    fn test_center_black_square_numbering() {
        let board =
            Board::from_solution_rows(&["ABCDE", "FGHIJ", "KL.MN", "OPQRS", "TUVWX"]).unwrap();
        let words = board.words();

        let starts: Vec<(usize, usize, usize, Direction)> = words
            .iter()
            .map(|w| (w.num, w.x, w.y, w.direction))
            .collect();
        assert_eq!(
            starts,
            vec![
                (1, 0, 0, Direction::Across),
                (1, 0, 0, Direction::Down),
                (2, 1, 0, Direction::Down),
                (3, 2, 0, Direction::Down),
                (4, 3, 0, Direction::Down),
                (5, 4, 0, Direction::Down),
                (6, 0, 1, Direction::Across),
                (7, 0, 2, Direction::Across),
                (8, 3, 2, Direction::Across),
                (9, 0, 3, Direction::Across),
                (10, 2, 3, Direction::Down),
                (11, 0, 4, Direction::Across),
            ]
        );
        // numbering never goes backwards in scan order
        assert!(words.windows(2).all(|pair| pair[0].num <= pair[1].num));
        assert_eq!(board.words(), words);
    }

    #[test]
    fn test_from_rows_marks_state() {
        let board = Board::from_solution_rows(&["AB", ":."]).unwrap();
        assert_eq!(board.state_bytes(), b"--:.");
        assert_eq!(board.solution_bytes(), b"AB:.");
        assert_eq!(board.rows().count(), 2);

        assert_eq!(
            Board::from_solution_rows(&["ABC", "AB"]),
            Err(PuzError::BoardWidthMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_markup_flags() {
        let mut markup = Markup::empty();
        markup.insert(Markup::CIRCLED);
        markup.insert(Markup::CONTENT_GIVEN);
        assert_eq!(markup.bits(), 0xC0);
        assert!(markup.contains(Markup::CIRCLED));

        markup.remove(Markup::CIRCLED);
        assert!(!markup.contains(Markup::CIRCLED));
        assert_eq!(Markup::from_bits(0x03), None);
    }

    #[test]
    fn test_markup_board() {
        let mut board = mini();
        assert!(!board.has_markup());
        assert_eq!(board.markup_bytes(), vec![0; 25]);

        // unknown low bits survive alongside known flags
        let mut flags = vec![0u8; 25];
        flags[12] = 0x80;
        flags[3] = 0x03;
        board.set_markup(&flags);
        assert!(board.has_markup());
        assert!(board.cell(2, 2).unwrap().markup.contains(Markup::CIRCLED));
        assert_eq!(board.cell(3, 0).unwrap().markup.bits(), 0x03);
        assert_eq!(board.markup_bytes(), flags);

        board.set_markup(&[0; 25]);
        assert!(!board.has_markup());
    }
}
