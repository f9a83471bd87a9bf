//! Input abstraction. Matching is generic over the input representation:
//! one-byte strings match per byte, UTF-16 strings match per code unit with
//! optional surrogate-pair decoding for the unicode instructions.

/// A searchable input string. Positions are code-unit offsets.
pub trait InputIndexer: Copy {
    /// The name of the representation, for diagnostics.
    const NAME: &'static str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// \return the code unit at \p pos, which must be in bounds.
    fn unit(&self, pos: usize) -> u32;

    /// Decode the code point starting at \p pos, consuming a surrogate pair
    /// when one is present.
    /// \return the code point and its width in code units.
    fn codepoint_at(&self, pos: usize) -> (u32, usize);

    /// Decode the code point ending just before \p pos.
    /// \return the code point and its width in code units.
    fn codepoint_before(&self, pos: usize) -> (u32, usize);

    /// \return the offset of the first occurrence of \p unit at or after
    /// \p from, if any. Used to skip ahead to candidate match starts.
    fn find_unit(&self, from: usize, unit: u32) -> Option<usize>;
}

fn is_high_surrogate(u: u32) -> bool {
    (0xD800..0xDC00).contains(&u)
}

fn is_low_surrogate(u: u32) -> bool {
    (0xDC00..0xE000).contains(&u)
}

fn combine_surrogates(high: u32, low: u32) -> u32 {
    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
}

impl<'a> InputIndexer for &'a [u8] {
    const NAME: &'static str = "ascii";

    fn len(&self) -> usize {
        (**self).len()
    }

    fn unit(&self, pos: usize) -> u32 {
        self[pos] as u32
    }

    fn codepoint_at(&self, pos: usize) -> (u32, usize) {
        (self[pos] as u32, 1)
    }

    fn codepoint_before(&self, pos: usize) -> (u32, usize) {
        (self[pos - 1] as u32, 1)
    }

    fn find_unit(&self, from: usize, unit: u32) -> Option<usize> {
        if unit > 0xFF {
            return None;
        }
        memchr::memchr(unit as u8, &self[from..]).map(|idx| from + idx)
    }
}

impl<'a> InputIndexer for &'a [u16] {
    const NAME: &'static str = "utf16";

    fn len(&self) -> usize {
        (**self).len()
    }

    fn unit(&self, pos: usize) -> u32 {
        self[pos] as u32
    }

    fn codepoint_at(&self, pos: usize) -> (u32, usize) {
        let u = self[pos] as u32;
        if is_high_surrogate(u) && pos + 1 < self.len() {
            let next = self[pos + 1] as u32;
            if is_low_surrogate(next) {
                return (combine_surrogates(u, next), 2);
            }
        }
        (u, 1)
    }

    fn codepoint_before(&self, pos: usize) -> (u32, usize) {
        let u = self[pos - 1] as u32;
        if is_low_surrogate(u) && pos >= 2 {
            let prev = self[pos - 2] as u32;
            if is_high_surrogate(prev) {
                return (combine_surrogates(prev, u), 2);
            }
        }
        (u, 1)
    }

    fn find_unit(&self, from: usize, unit: u32) -> Option<usize> {
        if unit > 0xFFFF {
            return None;
        }
        self[from..]
            .iter()
            .position(|&u| u as u32 == unit)
            .map(|idx| from + idx)
    }
}
