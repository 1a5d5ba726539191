//! The rolling 16-bit checksum and the four file-level checksums built on it.

/// Masked checksums XOR each region's checksum with one byte of this.
/// Low bytes take "ICHE", high bytes take "ATED".
pub const MASK: &[u8; 8] = b"ICHEATED";

/// Rotate right by one bit, then add the byte. `seed` lets regions chain.
pub fn checksum_region(data: &[u8], seed: u16) -> u16 {
    data.iter()
        .fold(seed, |sum, &byte| sum.rotate_right(1).wrapping_add(byte as u16))
}

/// The string fields exactly as they appear on the wire, NULs excluded.
#[derive(Debug, Clone, Copy)]
pub struct StringsRegion<'a> {
    pub title: &'a [u8],
    pub author: &'a [u8],
    pub copyright: &'a [u8],
    pub clues: &'a [&'a [u8]],
    pub notes: &'a [u8],
    /// Whether notes take part at all. Only versions 1.3 and later
    /// include them.
    pub notes_included: bool,
}

impl StringsRegion<'_> {
    /// Title, author and copyright count with their NUL when non-empty.
    /// Clue text counts without its NUL.
    pub fn checksum(&self, seed: u16) -> u16 {
        let mut sum = seed;
        for field in [self.title, self.author, self.copyright] {
            sum = checksum_with_nul(field, sum);
        }
        for clue in self.clues {
            sum = checksum_region(clue, sum);
        }
        if self.notes_included {
            sum = checksum_with_nul(self.notes, sum);
        }
        sum
    }
}

fn checksum_with_nul(field: &[u8], seed: u16) -> u16 {
    if field.is_empty() {
        return seed;
    }
    checksum_region(&[0], checksum_region(field, seed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Checksums {
    pub global: u16,
    pub cib: u16,
    pub masked_low: [u8; 4],
    pub masked_high: [u8; 4],
}

impl Checksums {
    /// `cib` is the 8 header bytes from width through scramble tag.
    pub fn compute(cib: &[u8], solution: &[u8], state: &[u8], strings: &StringsRegion) -> Self {
        let cib_sum = checksum_region(cib, 0);

        let mut global = cib_sum;
        global = checksum_region(solution, global);
        global = checksum_region(state, global);
        global = strings.checksum(global);

        let parts = [
            cib_sum,
            checksum_region(solution, 0),
            checksum_region(state, 0),
            strings.checksum(0),
        ];

        let mut masked_low = [0u8; 4];
        let mut masked_high = [0u8; 4];
        for (i, part) in parts.iter().enumerate() {
            let [low, high] = part.to_le_bytes();
            masked_low[i] = MASK[i] ^ low;
            masked_high[i] = MASK[i + 4] ^ high;
        }

        Self {
            global,
            cib: cib_sum,
            masked_low,
            masked_high,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_region() {
        assert_eq!(checksum_region(&[], 0x1234), 0x1234);
        assert_eq!(checksum_region(&[0x01], 0), 0x0001);
        // 0x0001 rotates to 0x8000 before the add
        assert_eq!(checksum_region(&[0x01, 0x02], 0), 0x8002);
        assert_eq!(checksum_region(&[0xFF], 0xFFFF), 0x00FE);
    }

    #[test]
    fn test_chaining_equals_concatenation() {
        let a = b"ACROSS";
        let b = b"DOWN";
        let joined = b"ACROSSDOWN";
        assert_eq!(
            checksum_region(b, checksum_region(a, 0)),
            checksum_region(joined, 0)
        );
    }

    #[test]
    fn test_empty_strings_are_skipped() {
        let clues: [&[u8]; 1] = [b"clue"];
        let with_empty = StringsRegion {
            title: b"",
            author: b"",
            copyright: b"",
            clues: &clues,
            notes: b"",
            notes_included: true,
        };
        assert_eq!(with_empty.checksum(7), checksum_region(b"clue", 7));

        let with_title = StringsRegion {
            title: b"T",
            ..with_empty
        };
        assert_eq!(with_title.checksum(0), checksum_region(b"T\0clue", 0));
    }

    #[test]
    fn test_notes_gate() {
        let clues: [&[u8]; 0] = [];
        let mut strings = StringsRegion {
            title: b"",
            author: b"",
            copyright: b"",
            clues: &clues,
            notes: b"note",
            notes_included: false,
        };
        assert_eq!(strings.checksum(0), 0);

        strings.notes_included = true;
        assert_eq!(strings.checksum(0), checksum_region(b"note\0", 0));
    }

    #[test]
    fn test_masks_on_zero_regions() {
        let clues: [&[u8]; 0] = [];
        let strings = StringsRegion {
            title: b"",
            author: b"",
            copyright: b"",
            clues: &clues,
            notes: b"",
            notes_included: true,
        };
        let sums = Checksums::compute(&[0; 8], &[], &[], &strings);
        assert_eq!(sums.global, 0);
        assert_eq!(sums.cib, 0);
        assert_eq!(&sums.masked_low, b"ICHE");
        assert_eq!(&sums.masked_high, b"ATED");
    }
}
