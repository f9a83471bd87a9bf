use crate::executor::{self, SearchResult, StackOverflow};
use crate::node;
use crate::parse;
use crate::types::{Error, MatchFlags, SyntaxFlags};
use std::convert::{TryFrom, TryInto};
use std::str::FromStr;

/// Range is used to express the extent of a match, as indexes into the input
/// string.
pub type Range = std::ops::Range<usize>;

/// A Match represents a portion of a string which was found to match a Regex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The total range of the match. Note this may be empty, if the regex
    /// matched an empty string.
    pub range: Range,

    /// The list of captures. This has length equal to the number of capturing
    /// groups in the regex. For each capture, if the value is None, that group
    /// did not match (for example, it was in a not-taken branch of an
    /// alternation). If the value is Some, the group did match with the
    /// enclosed range.
    pub captures: Vec<Option<Range>>,

    // Capture group names, one entry per group; unnamed groups get an empty
    // string. Empty when the pattern has no named groups at all.
    pub(crate) group_names: Box<[Box<str>]>,
}

impl Match {
    /// Access a group by index, using the convention of Python's group()
    /// function. Index 0 is the total match, index 1 is the first capture
    /// group.
    #[inline]
    pub fn group(&self, idx: usize) -> Option<Range> {
        if idx == 0 {
            Some(self.range.clone())
        } else {
            self.captures[idx - 1].clone()
        }
    }

    /// Access a named group by name.
    #[inline]
    pub fn named_group(&self, name: &str) -> Option<Range> {
        if name.is_empty() {
            return None;
        }
        let pos = self.group_names.iter().position(|s| s.as_ref() == name)?;
        self.captures[pos].clone()
    }

    /// Returns the starting offset of the match in the input.
    #[inline]
    pub fn start(&self) -> usize {
        self.range.start
    }

    /// Returns the ending offset of the match in the input.
    #[inline]
    pub fn end(&self) -> usize {
        self.range.end
    }
}

/// A Regex is the compiled version of a pattern.
#[derive(Debug, Clone)]
pub struct Regex {
    bytecode: Vec<u8>,
    flags: SyntaxFlags,
    group_names: Box<[Box<str>]>,
}

impl Regex {
    /// Construct a regex by parsing `pattern` using the default flags.
    /// An Error may be returned if the syntax is invalid.
    /// Note that this is rather expensive; prefer to cache a Regex which is
    /// intended to be used more than once.
    #[inline]
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        Self::compile(pattern, SyntaxFlags::default())
    }

    /// Construct a regex by parsing `pattern` with a JavaScript flag string
    /// like "imu".
    pub fn with_flags(pattern: &str, flags: &str) -> Result<Regex, Error> {
        Self::compile(pattern, flags.parse()?)
    }

    /// Construct a regex by parsing `pattern` with already-parsed flags.
    pub fn compile(pattern: &str, flags: SyntaxFlags) -> Result<Regex, Error> {
        let mut parsed = parse::try_parse(pattern, flags)?;
        node::optimize_node_list(&mut parsed.arena, &mut parsed.root);
        let bytecode = node::compile(
            &parsed.arena,
            &parsed.root,
            parsed.flags,
            parsed.group_count,
            parsed.loop_count,
        );
        let group_names = if parsed.group_names.is_empty() {
            Box::default()
        } else {
            let mut names = vec![String::new(); parsed.group_count as usize];
            for (name, idx) in parsed.group_names {
                names[idx as usize] = name;
            }
            names.into_iter().map(String::into_boxed_str).collect()
        };
        Ok(Regex {
            bytecode,
            flags,
            group_names,
        })
    }

    /// \return the flags the regex was constructed with.
    #[inline]
    pub fn flags(&self) -> SyntaxFlags {
        self.flags
    }

    /// \return the compiled bytecode buffer. The buffer is self-contained
    /// and position-independent.
    #[inline]
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// \return a textual disassembly of the compiled bytecode.
    pub fn disassemble(&self) -> String {
        crate::bytecode::disassemble(&self.bytecode)
    }

    /// Searches `text` as one-byte characters to find the first match.
    #[inline]
    pub fn find(&self, text: &str) -> Option<Match> {
        self.find_from(text, 0)
    }

    /// Searches `text` for the first match at or after `start`. Note this may
    /// be different from passing a sliced `text` in the case of lookbehind
    /// assertions and anchors.
    #[inline]
    pub fn find_from(&self, text: &str, start: usize) -> Option<Match> {
        self.try_find_from(text, start).unwrap_or(None)
    }

    /// Searches `text`, returning an iterator over non-overlapping matches.
    #[inline]
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches {
            re: self,
            text,
            start: 0,
        }
    }

    /// Searches `text` for the first match at or after `start`, reporting
    /// backtracking space exhaustion instead of swallowing it.
    pub fn try_find_from(&self, text: &str, start: usize) -> Result<Option<Match>, StackOverflow> {
        let bytes = text.as_bytes();
        let mut flags = self.match_flags(start);
        if bytes.is_ascii() {
            flags = flags | MatchFlags::INPUT_ALL_ASCII;
        }
        let result = executor::search_with_bytecode(&self.bytecode, bytes, start, flags)?;
        Ok(result.map(|r| self.build_match(r)))
    }

    /// Searches UTF-16 `text` for the first match at or after `start`.
    /// Surrogate pairs are decoded as single code points when the regex has
    /// the unicode flag.
    pub fn find_utf16(&self, text: &[u16]) -> Option<Match> {
        self.try_find_utf16_from(text, 0).unwrap_or(None)
    }

    /// As [`Regex::try_find_from`], over UTF-16 input.
    pub fn try_find_utf16_from(
        &self,
        text: &[u16],
        start: usize,
    ) -> Result<Option<Match>, StackOverflow> {
        let mut flags = self.match_flags(start);
        if text.iter().all(|&u| u < 0x80) {
            flags = flags | MatchFlags::INPUT_ALL_ASCII;
        }
        let result = executor::search_with_bytecode(&self.bytecode, text, start, flags)?;
        Ok(result.map(|r| self.build_match(r)))
    }

    fn match_flags(&self, start: usize) -> MatchFlags {
        let mut flags = MatchFlags::DEFAULT;
        if self.flags.sticky {
            flags = flags | MatchFlags::ONLY_AT_START;
        }
        if start > 0 {
            flags = flags | MatchFlags::PREV_CHAR_AVAILABLE;
        }
        flags
    }

    fn build_match(&self, result: SearchResult) -> Match {
        let captures = result
            .captures
            .iter()
            .map(|r| {
                if r.matched() {
                    Some(r.start as usize..r.end as usize)
                } else {
                    None
                }
            })
            .collect();
        Match {
            range: result.start..result.end,
            captures,
            group_names: self.group_names.clone(),
        }
    }
}

impl FromStr for Regex {
    type Err = Error;

    /// Attempts to parse a string into a regular expression
    #[inline]
    fn from_str(s: &str) -> Result<Self, Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for SyntaxFlags {
    type Error = Error;

    fn try_from(s: &str) -> Result<SyntaxFlags, Error> {
        SyntaxFlags::try_from_chars(s.chars())
    }
}

impl FromStr for SyntaxFlags {
    type Err = Error;

    fn from_str(s: &str) -> Result<SyntaxFlags, Error> {
        s.try_into()
    }
}

/// An iterator type which yields `Match`es found in a string.
pub struct Matches<'r, 't> {
    re: &'r Regex,
    text: &'t str,
    start: usize,
}

impl<'r, 't> Iterator for Matches<'r, 't> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        if self.start > self.text.len() {
            return None;
        }
        let m = self.re.find_from(self.text, self.start)?;
        // An empty match must not repeat at the same position.
        self.start = if m.range.is_empty() {
            m.range.end + 1
        } else {
            m.range.end
        };
        Some(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_iter() {
        let re = Regex::new("a+").unwrap();
        let ranges: Vec<Range> = re.find_iter("aa b aaa a").map(|m| m.range).collect();
        assert_eq!(ranges, vec![0..2, 5..8, 9..10]);
    }

    #[test]
    fn test_named_groups() {
        let re = Regex::new("(?<year>\\d{4})-(?<month>\\d{2})").unwrap();
        let m = re.find("on 2024-06-01").unwrap();
        assert_eq!(m.named_group("year"), Some(3..7));
        assert_eq!(m.named_group("month"), Some(8..10));
        assert_eq!(m.named_group("day"), None);
        assert_eq!(m.group(1), Some(3..7));
    }

    #[test]
    fn test_sticky() {
        let re = Regex::with_flags("b", "y").unwrap();
        assert!(re.find("abc").is_none());
        assert!(re.find_from("abc", 1).is_some());
    }

    #[test]
    fn test_flags_parsing() {
        assert!(Regex::with_flags("a", "gimsuy").is_ok());
        assert_eq!(Regex::with_flags("a", "q").unwrap_err(), Error::InvalidFlags);
    }
}
