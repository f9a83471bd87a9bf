use crate::codepointset::CodePointSet;
use std::fmt;

/// The ID of a capture group (marked subexpression). Group 0 is the first
/// explicit group in the pattern, not the whole-match pseudo-group.
pub type CaptureGroupID = u16;

/// The ID of a loop.
pub type LoopID = u16;

/// The maximum number of capture groups supported in a pattern.
pub const MAX_CAPTURE_GROUPS: u32 = 65535;

/// The maximum number of loops supported in a pattern.
pub const MAX_LOOPS: u32 = 65535;

/// The maximum nesting depth of groups and lookarounds in a pattern.
/// Parsing and lookaround execution recurse per nesting level, so the depth
/// must stay well inside the native stack.
pub const MAX_NESTING_DEPTH: u32 = 512;

/// Sentinel offset meaning a capture group did not match.
pub const NOT_MATCHED: u32 = u32::MAX;

/// A half-open range of input offsets captured by a group.
/// Both fields are `NOT_MATCHED` when the group never matched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CapturedRange {
    pub start: u32,
    pub end: u32,
}

impl CapturedRange {
    pub fn not_matched() -> CapturedRange {
        CapturedRange {
            start: NOT_MATCHED,
            end: NOT_MATCHED,
        }
    }

    pub fn matched(&self) -> bool {
        self.end != NOT_MATCHED
    }

    pub fn length(&self) -> u32 {
        debug_assert!(self.matched(), "Range was not matched");
        self.end - self.start
    }
}

/// Flags controlling pattern syntax and match semantics.
/// The byte encoding is persisted inside compiled bytecode and must not
/// change: icase bit 0, global bit 1, multiline bit 2, unicode bit 3,
/// dot_all bit 4, sticky bit 5.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SyntaxFlags {
    /// Case-insensitive matching (`i`).
    pub icase: bool,
    /// Global matching (`g`). Does not affect compilation; carried for the
    /// embedder.
    pub global: bool,
    /// `^`/`$` match at line boundaries (`m`).
    pub multiline: bool,
    /// Unicode mode (`u`): surrogate-pair decoding, case-fold
    /// canonicalization, strict escapes.
    pub unicode: bool,
    /// `.` also matches line terminators (`s`).
    pub dot_all: bool,
    /// Matching is only attempted at the start position (`y`).
    pub sticky: bool,
}

impl SyntaxFlags {
    const ICASE: u8 = 1 << 0;
    const GLOBAL: u8 = 1 << 1;
    const MULTILINE: u8 = 1 << 2;
    const UNICODE: u8 = 1 << 3;
    const DOT_ALL: u8 = 1 << 4;
    const STICKY: u8 = 1 << 5;

    /// Parse flags from a flag string like "imu".
    /// Unrecognized or repeated flags are an error.
    pub fn try_from_chars<I: Iterator<Item = char>>(chars: I) -> Result<SyntaxFlags, Error> {
        let mut flags = SyntaxFlags::default();
        for c in chars {
            let field = match c {
                'i' => &mut flags.icase,
                'g' => &mut flags.global,
                'm' => &mut flags.multiline,
                'u' => &mut flags.unicode,
                's' => &mut flags.dot_all,
                'y' => &mut flags.sticky,
                _ => return Err(Error::InvalidFlags),
            };
            if *field {
                return Err(Error::InvalidFlags);
            }
            *field = true;
        }
        Ok(flags)
    }

    /// Serialize to the stable single-byte encoding.
    pub fn to_byte(self) -> u8 {
        let mut bits = 0;
        if self.icase {
            bits |= Self::ICASE;
        }
        if self.global {
            bits |= Self::GLOBAL;
        }
        if self.multiline {
            bits |= Self::MULTILINE;
        }
        if self.unicode {
            bits |= Self::UNICODE;
        }
        if self.dot_all {
            bits |= Self::DOT_ALL;
        }
        if self.sticky {
            bits |= Self::STICKY;
        }
        bits
    }

    /// Deserialize from the stable single-byte encoding.
    pub fn from_byte(bits: u8) -> SyntaxFlags {
        SyntaxFlags {
            icase: bits & Self::ICASE != 0,
            global: bits & Self::GLOBAL != 0,
            multiline: bits & Self::MULTILINE != 0,
            unicode: bits & Self::UNICODE != 0,
            dot_all: bits & Self::DOT_ALL != 0,
            sticky: bits & Self::STICKY != 0,
        }
    }
}

impl fmt::Display for SyntaxFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.global {
            f.write_str("g")?;
        }
        if self.icase {
            f.write_str("i")?;
        }
        if self.multiline {
            f.write_str("m")?;
        }
        if self.dot_all {
            f.write_str("s")?;
        }
        if self.unicode {
            f.write_str("u")?;
        }
        if self.sticky {
            f.write_str("y")?;
        }
        Ok(())
    }
}

/// Flags passed to a search, as a bitmask.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MatchFlags(pub u8);

impl MatchFlags {
    pub const DEFAULT: MatchFlags = MatchFlags(0);
    /// The start position is not the beginning of a line.
    pub const NOT_BOL: MatchFlags = MatchFlags(1 << 0);
    /// The end position is not the end of a line.
    pub const NOT_EOL: MatchFlags = MatchFlags(1 << 1);
    /// Hint: the input contains only 7-bit ASCII.
    pub const INPUT_ALL_ASCII: MatchFlags = MatchFlags(1 << 2);
    /// Only attempt a match at the start position (sticky semantics).
    pub const ONLY_AT_START: MatchFlags = MatchFlags(1 << 3);
    /// The character before the start position is available for lookbehind
    /// and anchoring decisions.
    pub const PREV_CHAR_AVAILABLE: MatchFlags = MatchFlags(1 << 4);

    pub fn contains(self, rhs: MatchFlags) -> bool {
        self.0 & rhs.0 == rhs.0
    }
}

impl std::ops::BitOr for MatchFlags {
    type Output = MatchFlags;
    fn bitor(self, rhs: MatchFlags) -> MatchFlags {
        MatchFlags(self.0 | rhs.0)
    }
}

/// A set of statically derived match constraints, as a bitmask.
/// Used to prune alternation branches and reject impossible searches.
pub type MatchConstraintSet = u8;

/// The match requires at least one non-ASCII character.
pub const CONSTRAINT_NON_ASCII: MatchConstraintSet = 1 << 0;

/// The match can only succeed at the start of a line.
pub const CONSTRAINT_ANCHORED_AT_START: MatchConstraintSet = 1 << 1;

/// The match cannot be empty.
pub const CONSTRAINT_NON_EMPTY: MatchConstraintSet = 1 << 2;

/// The sort of character classes like \d or \W.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CharClassType {
    Digits,
    Spaces,
    Words,
}

/// A character class escape together with its polarity, e.g. \W is
/// `{Words, inverted: true}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CharacterClass {
    pub kind: CharClassType,
    pub inverted: bool,
}

/// The contents of a bracket expression `[...]`.
#[derive(Debug, Clone, Default)]
pub struct BracketContents {
    pub negate: bool,
    pub classes: Vec<CharacterClass>,
    pub cps: CodePointSet,
}

/// Errors produced when parsing a pattern. All are terminal: parsing aborts
/// and no bytecode is produced.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// An escape value is too large.
    EscapeOverflow,
    /// The input ended in the middle of an escape.
    EscapeIncomplete,
    /// The escape is not valid (unicode mode is strict about this).
    EscapeInvalid,
    /// A `[` was never closed.
    UnbalancedBracket,
    /// A `(` was never closed, or a stray `)` appeared.
    UnbalancedParenthesis,
    /// A `{m,n}` quantifier with m > n.
    BraceRange,
    /// A class range out of order, like `[b-a]`.
    CharacterRange,
    /// A malformed `{...}` quantifier in unicode mode.
    InvalidQuantifierBracket,
    /// A quantifier with nothing to quantify.
    InvalidRepeat,
    /// The pattern exceeds the capture-group or loop limits.
    PatternExceedsParseLimits,
    /// The flag string is invalid.
    InvalidFlags,
    /// Two capture groups share a name.
    DuplicateCaptureGroupName,
    /// A group name that does not lex as an identifier.
    InvalidCaptureGroupName,
    /// A `\k<name>` naming no group.
    NonexistentNamedCaptureReference,
}

impl Error {
    fn text(self) -> &'static str {
        match self {
            Error::EscapeOverflow => "Escape value too large",
            Error::EscapeIncomplete => "Incomplete escape",
            Error::EscapeInvalid => "Invalid escape",
            Error::UnbalancedBracket => "Unbalanced [",
            Error::UnbalancedParenthesis => "Unbalanced parenthesis",
            Error::BraceRange => "Invalid quantifier range",
            Error::CharacterRange => "Invalid character range",
            Error::InvalidQuantifierBracket => "Invalid quantifier bracket",
            Error::InvalidRepeat => "Nothing to repeat",
            Error::PatternExceedsParseLimits => "Pattern exceeds parse limits",
            Error::InvalidFlags => "Invalid flags",
            Error::DuplicateCaptureGroupName => "Duplicate capture group name",
            Error::InvalidCaptureGroupName => "Invalid capture group name",
            Error::NonexistentNamedCaptureReference => "Nonexistent named capture reference",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_flag_parsing() {
        let flags = SyntaxFlags::try_from_chars("imu".chars()).unwrap();
        assert!(flags.icase && flags.multiline && flags.unicode);
        assert!(!flags.global && !flags.dot_all && !flags.sticky);
        assert_eq!(SyntaxFlags::try_from_chars("x".chars()), Err(Error::InvalidFlags));
        assert_eq!(SyntaxFlags::try_from_chars("ii".chars()), Err(Error::InvalidFlags));
    }

    #[test]
    fn test_flag_byte_layout() {
        // The byte encoding is persisted in bytecode; pin it down.
        let mut flags = SyntaxFlags::default();
        flags.icase = true;
        assert_eq!(flags.to_byte(), 1);
        flags = SyntaxFlags::default();
        flags.multiline = true;
        assert_eq!(flags.to_byte(), 4);
        flags = SyntaxFlags::default();
        flags.unicode = true;
        assert_eq!(flags.to_byte(), 8);
    }

    proptest! {
        #[test]
        fn test_flag_byte_round_trip(bits in 0u8..64) {
            let flags = SyntaxFlags::from_byte(bits);
            prop_assert_eq!(flags.to_byte(), bits);
            prop_assert_eq!(SyntaxFlags::from_byte(flags.to_byte()), flags);
        }
    }
}
