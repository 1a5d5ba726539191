//! Optional tagged sections that follow the strings block
//!
//! Each section on the wire is `tag[4] | len u16 | checksum u16 | data[len] | NUL`.
//! The board-shaped payloads (GRBS, GEXT) live in the board's cells; the
//! table and timer payloads are parsed here.

use std::fmt;
use std::str::FromStr;

use crate::error::{PuzError, Result};
use crate::text::{decode_text, encode_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtraSection {
    /// GRBS: per-square rebus keys
    RebusBoard,
    /// RTBL: rebus key to answer text
    RebusTable,
    /// LTIM: elapsed solving time
    Timer,
    /// GEXT: per-square markup flags
    MarkupBoard,
    /// RUSR: rebus entries typed by the solver
    UserRebusTable,
}

impl ExtraSection {
    /// Canonical order, also the order `sort` produces.
    pub const ALL: [ExtraSection; 5] = [
        ExtraSection::RebusBoard,
        ExtraSection::RebusTable,
        ExtraSection::Timer,
        ExtraSection::MarkupBoard,
        ExtraSection::UserRebusTable,
    ];

    pub const fn tag(self) -> &'static [u8; 4] {
        match self {
            ExtraSection::RebusBoard => b"GRBS",
            ExtraSection::RebusTable => b"RTBL",
            ExtraSection::Timer => b"LTIM",
            ExtraSection::MarkupBoard => b"GEXT",
            ExtraSection::UserRebusTable => b"RUSR",
        }
    }

    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"GRBS" => Some(ExtraSection::RebusBoard),
            b"RTBL" => Some(ExtraSection::RebusTable),
            b"LTIM" => Some(ExtraSection::Timer),
            b"GEXT" => Some(ExtraSection::MarkupBoard),
            b"RUSR" => Some(ExtraSection::UserRebusTable),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExtraSection::RebusBoard => "GRBS",
            ExtraSection::RebusTable => "RTBL",
            ExtraSection::Timer => "LTIM",
            ExtraSection::MarkupBoard => "GEXT",
            ExtraSection::UserRebusTable => "RUSR",
        }
    }

    pub(crate) fn malformed(self, reason: impl Into<String>) -> PuzError {
        PuzError::MalformedExtraSection {
            section: self,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ExtraSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExtraSection {
    type Err = PuzError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s.as_bytes()).ok_or_else(|| PuzError::UnknownExtraSectionName(s.to_string()))
    }
}

/// What sits at a section boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionProbe {
    Section(ExtraSection),
    /// Fewer than four bytes left.
    End,
    /// Four bytes that are not a known tag; everything from here on is
    /// postscript.
    Unrecognized([u8; 4]),
}

impl SectionProbe {
    pub(crate) fn at(rest: &[u8]) -> Self {
        let Some(tag) = rest.first_chunk::<4>() else {
            return SectionProbe::End;
        };
        match ExtraSection::from_tag(tag) {
            Some(section) => SectionProbe::Section(section),
            None => SectionProbe::Unrecognized(*tag),
        }
    }
}

/// Which sections a puzzle carries, in file order. No duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionOrder(Vec<ExtraSection>);

impl SectionOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, section: ExtraSection) -> bool {
        self.0.contains(&section)
    }

    /// Appends `section`; false if it is already present.
    pub fn insert(&mut self, section: ExtraSection) -> bool {
        if self.contains(section) {
            return false;
        }
        self.0.push(section);
        true
    }

    /// False if `section` was not present.
    pub fn remove(&mut self, section: ExtraSection) -> bool {
        let before = self.0.len();
        self.0.retain(|&s| s != section);
        self.0.len() != before
    }

    pub fn sort(&mut self) {
        self.0.sort();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ExtraSection] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = ExtraSection> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebusEntry {
    /// Matches the non-zero key bytes on the board, one more than the
    /// number written in the table.
    pub key: u8,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub seconds_passed: u32,
    pub running: bool,
}

pub(crate) fn check_board_payload(section: ExtraSection, data: &[u8], size: usize) -> Result<()> {
    if data.len() != size {
        return Err(section.malformed(format!(
            "expected {size} bytes for the board, found {}",
            data.len()
        )));
    }
    Ok(())
}

/// `" 0:HEART; 1:CLUB;"`: semicolon-terminated `key:value` pairs.
pub(crate) fn parse_rebus_table(section: ExtraSection, data: &[u8]) -> Result<Vec<RebusEntry>> {
    let text = decode_text(data);
    let body = text.strip_suffix(';').unwrap_or(&text);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    body.split(';')
        .map(|part| -> Result<RebusEntry> {
            let (raw_key, value) = part
                .split_once(':')
                .ok_or_else(|| section.malformed(format!("entry {part:?} has no ':'")))?;
            let key = raw_key
                .trim_matches(' ')
                .parse::<u8>()
                .ok()
                .and_then(|key| key.checked_add(1))
                .ok_or_else(|| section.malformed(format!("bad rebus key {raw_key:?}")))?;
            Ok(RebusEntry {
                key,
                value: value.to_string(),
            })
        })
        .collect()
}

pub(crate) fn encode_rebus_table(section: ExtraSection, entries: &[RebusEntry]) -> Result<Vec<u8>> {
    let mut text = String::new();
    for entry in entries {
        let key = entry
            .key
            .checked_sub(1)
            .ok_or_else(|| section.malformed("rebus key 0 is reserved for plain squares"))?;
        text.push_str(&format!("{key:>2}:{};", entry.value));
    }
    Ok(encode_text(&text)?.into_owned())
}

/// `"<seconds>,<flag>"` where flag `0` means running and `1` paused.
pub(crate) fn parse_timer(data: &[u8]) -> Result<Timer> {
    let section = ExtraSection::Timer;
    let text = decode_text(data);
    let (seconds, flag) = text
        .split_once(',')
        .ok_or_else(|| section.malformed(format!("{text:?} has no ','")))?;

    let running = match flag {
        "0" => true,
        "1" => false,
        other => return Err(section.malformed(format!("bad running flag {other:?}"))),
    };
    let seconds_passed = seconds
        .parse()
        .map_err(|_| section.malformed(format!("bad elapsed seconds {seconds:?}")))?;

    Ok(Timer {
        seconds_passed,
        running,
    })
}

pub(crate) fn encode_timer(timer: &Timer) -> Vec<u8> {
    let flag = if timer.running { 0 } else { 1 };
    format!("{},{flag}", timer.seconds_passed).into_bytes()
}
