//! The puzzle aggregate: everything a `.puz` file holds.

use crate::board::{Board, Direction, Word};
use crate::error::{PuzError, Result};
use crate::header::{PuzzleType, Version};
use crate::scramble::{self, ScrambleKey, ScrambleState};
use crate::sections::{ExtraSection, RebusEntry, SectionOrder, Timer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clue {
    pub text: String,
    pub num: usize,
    pub x: usize,
    pub y: usize,
    pub direction: Direction,
}

impl Clue {
    pub fn new(text: impl Into<String>, num: usize, x: usize, y: usize, direction: Direction) -> Self {
        Self {
            text: text.into(),
            num,
            x,
            y,
            direction,
        }
    }

    /// File order: by number, across before down.
    fn order_key(&self) -> (usize, Direction) {
        (self.num, self.direction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub title: String,
    pub author: String,
    pub copyright: String,
    pub notes: String,
    pub(crate) version: Version,
    pub(crate) puzzle_type: PuzzleType,
    pub(crate) board: Board,
    pub(crate) clues: Vec<Clue>,
    pub(crate) sections: SectionOrder,
    pub rebus_table: Vec<RebusEntry>,
    pub user_rebus_table: Vec<RebusEntry>,
    pub timer: Option<Timer>,
    pub(crate) scramble: ScrambleState,
    pub(crate) reserved1: [u8; 2],
    pub(crate) reserved2: [u8; 12],
    pub(crate) preamble: Vec<u8>,
    pub(crate) postscript: Vec<u8>,
}

impl Puzzle {
    /// A blank puzzle; see [`PuzzleBuilder`] for the other fields.
    pub fn new(width: u8, height: u8) -> Result<Self> {
        PuzzleBuilder::new(width, height).build()
    }

    /// Starts a builder for a blank puzzle of this size
    pub fn builder(width: u8, height: u8) -> PuzzleBuilder {
        PuzzleBuilder::new(width, height)
    }

    /// Board width in squares
    pub fn width(&self) -> usize {
        self.board.width()
    }

    /// Board height in squares
    pub fn height(&self) -> usize {
        self.board.height()
    }

    /// Number of squares, `width * height`
    pub fn size(&self) -> usize {
        self.board.size()
    }

    /// Format version stored in the header
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the version from `"X.X"`; the old one is kept on error
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        self.version = Version::parse(version)?;
        Ok(())
    }

    /// Normal, diagramless or an unknown bitmask
    pub fn puzzle_type(&self) -> PuzzleType {
        self.puzzle_type
    }

    /// Sets the header bitmask
    pub fn set_puzzle_type(&mut self, puzzle_type: PuzzleType) {
        self.puzzle_type = puzzle_type;
    }

    /// The grid
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable grid, for editing squares in place
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Replaces the board; its dimensions must match the puzzle's.
    pub fn set_board(&mut self, board: Board) -> Result<()> {
        if board.width() != self.width() {
            return Err(PuzError::BoardWidthMismatch {
                expected: self.width(),
                found: board.width(),
            });
        }
        if board.height() != self.height() {
            return Err(PuzError::BoardHeightMismatch {
                expected: self.height(),
                found: board.height(),
            });
        }
        self.board = board;
        Ok(())
    }

    /// Words read off the board, in clue order
    pub fn words(&self) -> Vec<Word> {
        self.board.words()
    }

    /// Bytes found before the header, written back unchanged
    pub fn preamble(&self) -> &[u8] {
        &self.preamble
    }

    /// Bytes found after the last section, written back unchanged
    pub fn postscript(&self) -> &[u8] {
        &self.postscript
    }

    /// Header bytes 28..30, never interpreted
    pub fn reserved1(&self) -> [u8; 2] {
        self.reserved1
    }

    /// Header bytes 32..44, never interpreted
    pub fn reserved2(&self) -> [u8; 12] {
        self.reserved2
    }

    // Clues

    /// Clues in file order
    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }

    /// The clue count written to the header.
    pub fn expected_clues(&self) -> usize {
        self.clues.len()
    }

    /// Looks a clue up by its number, e.g. 17 Across
    pub fn clue_by_num(&self, num: usize, direction: Direction) -> Option<&Clue> {
        self.clues
            .iter()
            .find(|clue| clue.num == num && clue.direction == direction)
    }

    /// Looks a clue up by the square its word starts on
    pub fn clue_by_pos(&self, x: usize, y: usize, direction: Direction) -> Option<&Clue> {
        self.clues
            .iter()
            .find(|clue| clue.x == x && clue.y == y && clue.direction == direction)
    }

    /// Mutable form of [`Puzzle::clue_by_pos`], for editing clue text
    pub fn clue_by_pos_mut(&mut self, x: usize, y: usize, direction: Direction) -> Option<&mut Clue> {
        self.clues
            .iter_mut()
            .find(|clue| clue.x == x && clue.y == y && clue.direction == direction)
    }

    /// Adds a clue in file order. Returns false, leaving the puzzle as it
    /// was, if the square is off the board or a clue already exists for
    /// that square or number in that direction.
    pub fn add_clue(&mut self, clue: Clue) -> bool {
        if !self.board.in_bounds(clue.x, clue.y)
            || self.clue_by_pos(clue.x, clue.y, clue.direction).is_some()
            || self.clue_by_num(clue.num, clue.direction).is_some()
        {
            return false;
        }
        let at = self
            .clues
            .partition_point(|existing| existing.order_key() <= clue.order_key());
        self.clues.insert(at, clue);
        true
    }

    /// Removes and returns the clue starting at (x, y)
    pub fn remove_clue(&mut self, x: usize, y: usize, direction: Direction) -> Option<Clue> {
        let at = self
            .clues
            .iter()
            .position(|clue| clue.x == x && clue.y == y && clue.direction == direction)?;
        Some(self.clues.remove(at))
    }

    /// Puts clues in file order: by number, across before down
    pub fn sort_clues(&mut self) {
        self.clues.sort_by_key(Clue::order_key);
    }

    // Extra sections

    /// Sections that will be written, in order.
    pub fn extra_sections(&self) -> &[ExtraSection] {
        self.sections.as_slice()
    }

    /// Whether `section` will be written
    pub fn has_extra_section(&self, section: ExtraSection) -> bool {
        self.sections.contains(section)
    }

    /// Appends `section` to the write list; false if already listed.
    pub fn add_extra_section(&mut self, section: ExtraSection) -> bool {
        self.sections.insert(section)
    }

    /// Drops `section` from the write list; its data stays in memory.
    pub fn remove_extra_section(&mut self, section: ExtraSection) -> bool {
        self.sections.remove(section)
    }

    /// Puts sections in GRBS, RTBL, LTIM, GEXT, RUSR order.
    pub fn sort_extra_sections(&mut self) {
        self.sections.sort();
    }

    // Scrambling

    /// Whether the solution is currently scrambled
    pub fn is_scrambled(&self) -> bool {
        self.scramble.is_scrambled()
    }

    /// Checksum of the plain letters; zero when unscrambled
    pub fn scramble_checksum(&self) -> u16 {
        self.scramble.checksum
    }

    /// Scrambles the solution letters with a four digit key. Letters are
    /// folded to uppercase first, so a lowercase solution comes back
    /// uppercase from [`Puzzle::unscramble`].
    pub fn scramble(&mut self, key: u16) -> Result<()> {
        if self.is_scrambled() {
            return Err(PuzError::PuzzleAlreadyScrambled);
        }
        let key = ScrambleKey::new(key)?;
        self.scramble = scramble::scramble_board(&mut self.board, &key)?;
        Ok(())
    }

    /// Checks `key` against the stored scramble checksum without
    /// changing anything.
    pub fn verify_key(&self, key: u16) -> Result<()> {
        self.unscrambled_letters(key).map(|_| ())
    }

    /// On any error the puzzle is left untouched.
    pub fn unscramble(&mut self, key: u16) -> Result<()> {
        let plain = self.unscrambled_letters(key)?;
        scramble::replace_letters(&mut self.board, &plain);
        self.scramble = ScrambleState::default();
        Ok(())
    }

    fn unscrambled_letters(&self, key: u16) -> Result<Vec<u8>> {
        if !self.is_scrambled() {
            return Err(PuzError::PuzzleAlreadyUnscrambled);
        }
        let key = ScrambleKey::new(key)?;
        scramble::unscrambled_letters(&self.board, &key, self.scramble.checksum)
    }
}

/// Builds a blank puzzle.
#[derive(Debug, Clone)]
pub struct PuzzleBuilder {
    width: u8,
    height: u8,
    title: String,
    author: String,
    copyright: String,
    notes: String,
    version: Version,
    puzzle_type: PuzzleType,
}

impl PuzzleBuilder {
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            title: String::new(),
            author: String::new(),
            copyright: String::new(),
            notes: String::new(),
            version: Version::DEFAULT,
            puzzle_type: PuzzleType::Normal,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = copyright.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn puzzle_type(mut self, puzzle_type: PuzzleType) -> Self {
        self.puzzle_type = puzzle_type;
        self
    }

    pub fn build(self) -> Result<Puzzle> {
        if self.width == 0 {
            return Err(PuzError::BoardWidthMismatch {
                expected: 1,
                found: 0,
            });
        }
        if self.height == 0 {
            return Err(PuzError::BoardHeightMismatch {
                expected: 1,
                found: 0,
            });
        }

        Ok(Puzzle {
            title: self.title,
            author: self.author,
            copyright: self.copyright,
            notes: self.notes,
            version: self.version,
            puzzle_type: self.puzzle_type,
            board: Board::new(self.width, self.height),
            clues: Vec::new(),
            sections: SectionOrder::new(),
            rebus_table: Vec::new(),
            user_rebus_table: Vec::new(),
            timer: None,
            scramble: ScrambleState::default(),
            reserved1: [0; 2],
            reserved2: [0; 12],
            preamble: Vec::new(),
            postscript: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mini() -> Puzzle {
        let mut puzzle = Puzzle::new(5, 5).unwrap();
        let board =
            Board::from_solution_rows(&["BASS.", "ACHED", "STONE", "HORSE", ".REED"]).unwrap();
        puzzle.set_board(board).unwrap();
        puzzle
    }

    #[test]
    fn test_blank_puzzle() {
        let puzzle = Puzzle::builder(5, 5).title("Blank").build().unwrap();
        assert_eq!(puzzle.title, "Blank");
        assert_eq!(puzzle.version().as_str(), "1.4");
        assert_eq!(puzzle.puzzle_type(), PuzzleType::Normal);
        assert_eq!(puzzle.expected_clues(), 0);
        assert!(puzzle.clues().is_empty());
        assert!(puzzle.extra_sections().is_empty());
        assert!(!puzzle.is_scrambled());
        assert_eq!(puzzle.size(), 25);

        assert!(matches!(
            Puzzle::new(0, 5),
            Err(PuzError::BoardWidthMismatch { .. })
        ));
        assert!(matches!(
            Puzzle::new(5, 0),
            Err(PuzError::BoardHeightMismatch { .. })
        ));
    }

    #[test]
    fn test_clue_count_tracks_edits() {
        let mut puzzle = Puzzle::new(5, 5).unwrap();

        assert!(puzzle.add_clue(Clue::new("Down one", 1, 0, 0, Direction::Down)));
        assert!(puzzle.add_clue(Clue::new("Across five", 5, 0, 1, Direction::Across)));
        assert!(puzzle.add_clue(Clue::new("Across one", 1, 0, 0, Direction::Across)));
        assert_eq!(puzzle.expected_clues(), 3);
        assert_eq!(puzzle.clues().len(), 3);

        let order: Vec<&str> = puzzle.clues().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(order, ["Across one", "Down one", "Across five"]);

        // same square and direction, or same number and direction
        assert!(!puzzle.add_clue(Clue::new("again", 9, 0, 0, Direction::Across)));
        assert!(!puzzle.add_clue(Clue::new("again", 5, 3, 3, Direction::Across)));
        assert!(!puzzle.add_clue(Clue::new("off board", 7, 5, 0, Direction::Down)));
        assert_eq!(puzzle.expected_clues(), 3);

        let removed = puzzle.remove_clue(0, 0, Direction::Down).unwrap();
        assert_eq!(removed.text, "Down one");
        assert_eq!(puzzle.expected_clues(), 2);
        assert_eq!(puzzle.clues().len(), 2);
        assert!(puzzle.remove_clue(0, 0, Direction::Down).is_none());
    }

    #[test]
    fn test_clue_lookup() {
        let mut puzzle = mini();
        for word in puzzle.words() {
            let text = format!("{} {}", word.direction, word.text);
            assert!(puzzle.add_clue(Clue::new(text, word.num, word.x, word.y, word.direction)));
        }

        assert_eq!(
            puzzle.clue_by_num(1, Direction::Down).map(|c| c.text.as_str()),
            Some("D BASH")
        );
        assert_eq!(
            puzzle.clue_by_pos(1, 4, Direction::Across).map(|c| c.num),
            Some(9)
        );
        assert!(puzzle.clue_by_num(111, Direction::Across).is_none());
        assert!(puzzle.clue_by_pos(1, 4, Direction::Down).is_none());

        puzzle
            .clue_by_pos_mut(3, 0, Direction::Down)
            .unwrap()
            .text = "Smell, touch, e.g.".into();
        assert_eq!(
            puzzle.clue_by_num(4, Direction::Down).unwrap().text,
            "Smell, touch, e.g."
        );
    }

    #[test]
    fn test_sort_clues() {
        let mut puzzle = Puzzle::new(5, 5).unwrap();
        puzzle.clues = vec![
            Clue::new("b", 2, 1, 0, Direction::Down),
            Clue::new("a", 1, 0, 0, Direction::Down),
            Clue::new("c", 1, 0, 0, Direction::Across),
        ];
        puzzle.sort_clues();
        let order: Vec<&str> = puzzle.clues().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn test_set_board_dimensions() {
        let mut puzzle = Puzzle::new(3, 2).unwrap();
        assert_eq!(
            puzzle.set_board(Board::new(4, 2)),
            Err(PuzError::BoardWidthMismatch {
                expected: 3,
                found: 4
            })
        );
        assert_eq!(
            puzzle.set_board(Board::new(3, 3)),
            Err(PuzError::BoardHeightMismatch {
                expected: 2,
                found: 3
            })
        );
        assert!(puzzle.set_board(Board::new(3, 2)).is_ok());
    }

    #[test]
    fn test_extra_section_list() {
        let mut puzzle = Puzzle::new(5, 5).unwrap();
        assert!(puzzle.add_extra_section(ExtraSection::Timer));
        assert!(puzzle.add_extra_section(ExtraSection::RebusBoard));
        assert!(!puzzle.add_extra_section(ExtraSection::Timer));
        assert!(puzzle.has_extra_section(ExtraSection::RebusBoard));

        puzzle.sort_extra_sections();
        assert_eq!(
            puzzle.extra_sections(),
            &[ExtraSection::RebusBoard, ExtraSection::Timer]
        );

        assert!(puzzle.remove_extra_section(ExtraSection::RebusBoard));
        assert!(!puzzle.has_extra_section(ExtraSection::RebusBoard));
        assert!(!puzzle.remove_extra_section(ExtraSection::RebusBoard));
    }

    #[test]
    fn test_version() {
        let mut puzzle = Puzzle::new(1, 1).unwrap();
        puzzle.set_version("1.2").unwrap();
        assert_eq!(puzzle.version().to_string(), "1.2");
        assert_eq!(
            puzzle.set_version("v1"),
            Err(PuzError::InvalidVersionFormat("v1".into()))
        );
        assert_eq!(puzzle.version().as_str(), "1.2");
    }

    #[test]
    fn test_scramble_state_machine() {
        let mut puzzle = mini();
        let original = puzzle.board().clone();

        assert_eq!(puzzle.unscramble(1234), Err(PuzError::PuzzleAlreadyUnscrambled));
        assert_eq!(puzzle.scramble(1034), Err(PuzError::InvalidDigitInKey(1034)));
        assert!(!puzzle.is_scrambled());

        puzzle.scramble(1234).unwrap();
        assert!(puzzle.is_scrambled());
        assert_ne!(puzzle.scramble_checksum(), 0);
        assert_eq!(puzzle.scramble(1234), Err(PuzError::PuzzleAlreadyScrambled));

        let scrambled = puzzle.board().clone();
        assert_eq!(puzzle.unscramble(4321), Err(PuzError::IncorrectKeyProvided));
        assert_eq!(puzzle.board(), &scrambled);
        assert!(puzzle.is_scrambled());

        assert!(puzzle.verify_key(1234).is_ok());
        assert_eq!(puzzle.board(), &scrambled);

        puzzle.unscramble(1234).unwrap();
        assert_eq!(puzzle.board(), &original);
        assert!(!puzzle.is_scrambled());
        assert_eq!(puzzle.scramble_checksum(), 0);
    }

    #[test]
    fn test_scramble_rejects_non_letters() {
        let mut puzzle = Puzzle::new(4, 4).unwrap();
        let err = puzzle.scramble(1234).unwrap_err();
        assert_eq!(
            err,
            PuzError::NonLetterCharactersInGrid {
                x: 0,
                y: 0,
                glyph: b' '
            }
        );
        assert!(!puzzle.is_scrambled());
    }

    #[test]
    fn test_scramble_folds_case() {
        let mut puzzle = Puzzle::new(5, 5).unwrap();
        let board =
            Board::from_solution_rows(&["bass.", "AcHeD", "stone", "HORSE", ".reed"]).unwrap();
        puzzle.set_board(board).unwrap();

        puzzle.scramble(1234).unwrap();
        puzzle.unscramble(1234).unwrap();
        assert_eq!(puzzle.board(), mini().board());
    }
}
