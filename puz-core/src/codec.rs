/// Decodes `.puz` bytes into a [`Puzzle`] and encodes them back, byte for byte
use std::borrow::Cow;

use crate::board::Board;
use crate::checksum::{Checksums, StringsRegion, checksum_region};
use crate::error::{PuzError, Result};
use crate::header::Header;
use crate::puzzle::{Clue, Puzzle};
use crate::reader::Reader;
use crate::scramble::ScrambleState;
use crate::sections::{self, ExtraSection, RebusEntry, SectionOrder, SectionProbe, Timer};
use crate::text::{decode_text, encode_text};
use crate::writer::Writer;

/// Magic without its NUL; the header reader checks the full literal.
const MAGIC_PREFIX: &[u8] = b"ACROSS&DOWN";

/// The global checksum sits in the two bytes before the magic.
const CHECKSUM_BEFORE_MAGIC: usize = 2;

/// Section payloads collected while reading, applied once the board exists.
#[derive(Default)]
struct DecodedSections<'a> {
    order: SectionOrder,
    rebus_board: Option<&'a [u8]>,
    markup_board: Option<&'a [u8]>,
    rebus_table: Vec<RebusEntry>,
    user_rebus_table: Vec<RebusEntry>,
    timer: Option<Timer>,
}

/// Decode a complete puzzle file.
///
/// Every stored checksum is verified; nothing is returned unless the
/// whole file checks out.
pub fn decode(bytes: &[u8]) -> Result<Puzzle> {
    let mut reader = Reader::new(bytes);

    let magic_at = reader.find(MAGIC_PREFIX).ok_or(PuzError::MissingFileMagic)?;
    let preamble_len = magic_at
        .checked_sub(CHECKSUM_BEFORE_MAGIC)
        .ok_or(PuzError::UnreadableData)?;
    let preamble = reader.read(preamble_len)?;
    if !preamble.is_empty() {
        tracing::debug!(len = preamble.len(), "preamble before file magic");
    }

    let header = Header::read(&mut reader)?;
    let (width, height) = (header.width as usize, header.height as usize);
    if width == 0 || height == 0 {
        return Err(PuzError::UnreadableData);
    }
    let size = width * height;
    if !reader.can_read(size * 2) {
        return Err(PuzError::UnreadableData);
    }
    let solution = reader.read(size)?;
    let state = reader.read(size)?;

    let title = reader.read_nul_terminated()?;
    let author = reader.read_nul_terminated()?;
    let copyright = reader.read_nul_terminated()?;
    let expected = header.clue_count as usize;
    let mut clue_texts = Vec::with_capacity(expected);
    for found in 0..expected {
        let clue = reader
            .read_nul_terminated()
            .map_err(|_| PuzError::ClueCountMismatch { expected, found })?;
        clue_texts.push(clue);
    }
    let notes = reader.read_nul_terminated()?;

    let decoded = read_sections(&mut reader, size)?;
    let postscript = reader.read_remaining();
    if !postscript.is_empty() {
        tracing::debug!(len = postscript.len(), "keeping postscript");
    }

    let strings = StringsRegion {
        title,
        author,
        copyright,
        clues: &clue_texts,
        notes,
        notes_included: header.version.includes_notes_in_checksum(),
    };
    verify_checksums(
        &header.checksums,
        &Checksums::compute(&header.cib_bytes(), solution, state, &strings),
    )?;

    let mut board = Board::from_grids(width, height, solution, state);
    if let Some(keys) = decoded.rebus_board {
        board.set_rebus_keys(keys);
    }
    if let Some(flags) = decoded.markup_board {
        board.set_markup(flags);
    }

    let words = board.words();
    if words.len() != expected {
        return Err(PuzError::ClueCountMismatch {
            expected,
            found: words.len(),
        });
    }
    let clues = words
        .into_iter()
        .zip(&clue_texts)
        .map(|(word, text)| Clue::new(decode_text(text), word.num, word.x, word.y, word.direction))
        .collect();

    Ok(Puzzle {
        title: decode_text(title),
        author: decode_text(author),
        copyright: decode_text(copyright),
        notes: decode_text(notes),
        version: header.version,
        puzzle_type: header.puzzle_type,
        board,
        clues,
        sections: decoded.order,
        rebus_table: decoded.rebus_table,
        user_rebus_table: decoded.user_rebus_table,
        timer: decoded.timer,
        scramble: ScrambleState {
            tag: header.scramble_tag,
            checksum: header.scramble_checksum,
        },
        reserved1: header.reserved1,
        reserved2: header.reserved2,
        preamble: preamble.to_vec(),
        postscript: postscript.to_vec(),
    })
}

/// Reads sections until a boundary that is not a known tag. Whatever is
/// left after that belongs to the postscript.
fn read_sections<'a>(reader: &mut Reader<'a>, size: usize) -> Result<DecodedSections<'a>> {
    let mut decoded = DecodedSections::default();

    for _ in 0..ExtraSection::ALL.len() {
        let rest = reader.peek(reader.remaining())?;
        let section = match SectionProbe::at(rest) {
            SectionProbe::Section(section) => section,
            SectionProbe::End => break,
            SectionProbe::Unrecognized(tag) => {
                tracing::trace!(tag = %String::from_utf8_lossy(&tag), "no more sections");
                break;
            }
        };

        let data = read_section(reader, section)?;
        if !decoded.order.insert(section) {
            return Err(PuzError::DuplicateExtraSection(section));
        }
        tracing::debug!(%section, len = data.len(), "decoded extra section");

        match section {
            ExtraSection::RebusBoard => {
                sections::check_board_payload(section, data, size)?;
                decoded.rebus_board = Some(data);
            }
            ExtraSection::MarkupBoard => {
                sections::check_board_payload(section, data, size)?;
                decoded.markup_board = Some(data);
            }
            ExtraSection::RebusTable => {
                decoded.rebus_table = sections::parse_rebus_table(section, data)?;
            }
            ExtraSection::UserRebusTable => {
                decoded.user_rebus_table = sections::parse_rebus_table(section, data)?;
            }
            ExtraSection::Timer => decoded.timer = Some(sections::parse_timer(data)?),
        }
    }

    Ok(decoded)
}

/// `tag[4] | len u16 | checksum u16 | data[len] | NUL`, returning the data.
fn read_section<'a>(reader: &mut Reader<'a>, section: ExtraSection) -> Result<&'a [u8]> {
    reader.read(4)?;
    let len = reader.read_u16_le()? as usize;
    let stored = reader.read_u16_le()?;
    let data = reader.read(len)?;
    if reader.read_byte()? != 0 {
        return Err(section.malformed("missing trailing NUL"));
    }

    let calc = checksum_region(data, 0);
    if calc != stored {
        return Err(PuzError::ExtraSectionChecksumMismatch {
            section,
            expected: calc,
            found: stored,
        });
    }
    Ok(data)
}

fn verify_checksums(stored: &Checksums, calc: &Checksums) -> Result<()> {
    if stored.cib != calc.cib {
        return Err(PuzError::CibChecksumMismatch {
            expected: calc.cib,
            found: stored.cib,
        });
    }
    if stored.global != calc.global {
        return Err(PuzError::GlobalChecksumMismatch {
            expected: calc.global,
            found: stored.global,
        });
    }
    if stored.masked_low != calc.masked_low {
        return Err(PuzError::MaskedLowChecksumMismatch {
            expected: calc.masked_low,
            found: stored.masked_low,
        });
    }
    if stored.masked_high != calc.masked_high {
        return Err(PuzError::MaskedHighChecksumMismatch {
            expected: calc.masked_high,
            found: stored.masked_high,
        });
    }
    Ok(())
}

/// Encode a puzzle, writing its extra sections in the order it lists them.
pub fn encode(puzzle: &Puzzle) -> Result<Vec<u8>> {
    let clue_count =
        u16::try_from(puzzle.clues.len()).map_err(|_| PuzError::ClueCountMismatch {
            expected: u16::MAX as usize,
            found: puzzle.clues.len(),
        })?;
    let width = u8::try_from(puzzle.width()).map_err(|_| PuzError::BoardWidthMismatch {
        expected: u8::MAX as usize,
        found: puzzle.width(),
    })?;
    let height = u8::try_from(puzzle.height()).map_err(|_| PuzError::BoardHeightMismatch {
        expected: u8::MAX as usize,
        found: puzzle.height(),
    })?;

    let header = Header {
        checksums: Checksums::default(),
        version: puzzle.version,
        reserved1: puzzle.reserved1,
        scramble_checksum: puzzle.scramble.checksum,
        reserved2: puzzle.reserved2,
        width,
        height,
        clue_count,
        puzzle_type: puzzle.puzzle_type,
        scramble_tag: puzzle.scramble.tag,
    };

    let title = encode_text(&puzzle.title)?;
    let author = encode_text(&puzzle.author)?;
    let copyright = encode_text(&puzzle.copyright)?;
    let notes = encode_text(&puzzle.notes)?;
    let clue_texts = puzzle
        .clues
        .iter()
        .map(|clue| encode_text(&clue.text))
        .collect::<Result<Vec<Cow<'_, [u8]>>>>()?;
    let clue_refs: Vec<&[u8]> = clue_texts.iter().map(|clue| clue.as_ref()).collect();

    let solution = puzzle.board.solution_bytes();
    let state = puzzle.board.state_bytes();

    let mut writer = Writer::new();
    writer.write_bytes(&puzzle.preamble);
    let start = header.write(&mut writer);
    writer.write_bytes(&solution);
    writer.write_bytes(&state);
    writer.write_nul_terminated(&title);
    writer.write_nul_terminated(&author);
    writer.write_nul_terminated(&copyright);
    for clue in &clue_refs {
        writer.write_nul_terminated(clue);
    }
    writer.write_nul_terminated(&notes);

    for section in puzzle.sections.iter() {
        write_section(&mut writer, section, &section_payload(puzzle, section)?)?;
    }
    writer.write_bytes(&puzzle.postscript);

    let strings = StringsRegion {
        title: &title,
        author: &author,
        copyright: &copyright,
        clues: &clue_refs,
        notes: &notes,
        notes_included: puzzle.version.includes_notes_in_checksum(),
    };
    let sums = Checksums::compute(&header.cib_bytes(), &solution, &state, &strings);
    Header::backpatch(&mut writer, start, &sums)?;

    Ok(writer.into_bytes())
}

fn section_payload(puzzle: &Puzzle, section: ExtraSection) -> Result<Vec<u8>> {
    match section {
        ExtraSection::RebusBoard => Ok(puzzle.board.rebus_bytes()),
        ExtraSection::MarkupBoard => Ok(puzzle.board.markup_bytes()),
        ExtraSection::RebusTable => sections::encode_rebus_table(section, &puzzle.rebus_table),
        ExtraSection::UserRebusTable => {
            sections::encode_rebus_table(section, &puzzle.user_rebus_table)
        }
        ExtraSection::Timer => puzzle
            .timer
            .as_ref()
            .map(sections::encode_timer)
            .ok_or(PuzError::MissingExtraSection(section)),
    }
}

fn write_section(writer: &mut Writer, section: ExtraSection, data: &[u8]) -> Result<()> {
    let len = u16::try_from(data.len())
        .map_err(|_| section.malformed(format!("{} bytes do not fit a section", data.len())))?;
    writer.write_bytes(section.tag());
    writer.write_u16_le(len);
    writer.write_u16_le(checksum_region(data, 0));
    writer.write_nul_terminated(data);
    Ok(())
}
