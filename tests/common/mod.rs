#![allow(clippy::uninlined_format_args)]
#![allow(dead_code)]

/// Test that \p pattern fails to parse with default flags.
pub fn test_parse_fails(pattern: &str) {
    let res = rebex::Regex::new(pattern);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);
}

/// Test that \p pattern fails to parse with flags.
pub fn test_parse_fails_flags(pattern: &str, flags: &str) {
    let res = rebex::Regex::with_flags(pattern, flags);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);
}

/// Test that \p pattern fails to parse with \p err, with default flags.
pub fn test_parse_error(pattern: &str, err: rebex::Error) {
    assert_eq!(rebex::Regex::new(pattern).err(), Some(err), "{}", pattern);
}

/// Format a Match by inserting commas between all capture groups.
fn format_match(r: &rebex::Match, input: &str) -> String {
    let mut result = input[r.range.clone()].to_string();
    for cg in r.captures.iter() {
        result.push(',');
        if let Some(cg) = cg {
            result.push_str(&input[cg.clone()])
        }
    }
    result
}

/// Encode a string as UTF16.
pub fn to_utf16(input: &str) -> Vec<u16> {
    input.encode_utf16().collect()
}

/// Given a range of a string encoded as UTF16, return the corresponding
/// range in the original string (UTF-8).
pub fn range_from_utf16(utf16: &[u16], r: rebex::Range) -> rebex::Range {
    use std::char::decode_utf16;
    let start_utf8: usize = decode_utf16(utf16[0..r.start].iter().copied())
        .map(|r| r.expect("Invalid UTF16").len_utf8())
        .sum();
    let len_utf8: usize = decode_utf16(utf16[r].iter().copied())
        .map(|r| r.expect("Invalid UTF16").len_utf8())
        .sum();
    start_utf8..(start_utf8 + len_utf8)
}

pub trait StringTestHelpers {
    /// "Fluent" style helper for testing that a String is equal to a str.
    fn test_eq(&self, s: &str);
}

impl StringTestHelpers for String {
    fn test_eq(&self, rhs: &str) {
        assert_eq!(self.as_str(), rhs)
    }
}

pub trait VecTestHelpers {
    /// "Fluent" style helper for testing that a Vec<&str> is equal to a
    /// Vec<&str>.
    fn test_eq(&self, rhs: Vec<&str>);
}

impl VecTestHelpers for Vec<&str> {
    fn test_eq(&self, rhs: Vec<&str>) {
        assert_eq!(*self, rhs)
    }
}

/// A compiled regex which remembers a TestConfig.
#[derive(Debug, Clone)]
pub struct TestCompiledRegex {
    re: rebex::Regex,
    tc: TestConfig,
}

impl TestCompiledRegex {
    /// Search for self in \p input from \p start, using the configured input
    /// representation.
    pub fn find_from(&self, input: &str, start: usize) -> Option<rebex::Match> {
        match self.tc.encoding {
            Encoding::Bytes => self.re.find_from(input, start),
            Encoding::Utf16 => {
                let units = to_utf16(input);
                // The caller's start is a byte offset into ASCII test input.
                let m = self.re.try_find_utf16_from(&units, start).unwrap()?;
                let mut m = m;
                m.range = range_from_utf16(&units, m.range);
                m.captures = m
                    .captures
                    .into_iter()
                    .map(|c| c.map(|r| range_from_utf16(&units, r)))
                    .collect();
                Some(m)
            }
        }
    }

    /// Search for self in \p input, returning the first Match.
    #[track_caller]
    pub fn match1(&self, input: &str) -> rebex::Match {
        match self.find_from(input, 0) {
            Some(m) => m,
            None => panic!("Failed to match {:?}", input),
        }
    }

    /// Search for self in \p input, returning the match and captures
    /// joined with commas.
    #[track_caller]
    pub fn match1f(&self, input: &str) -> String {
        format_match(&self.match1(input), input)
    }

    /// Search for self in \p input, returning the total match and capture
    /// groups as strs.
    #[track_caller]
    pub fn match1_vec<'a>(&self, input: &'a str) -> Vec<Option<&'a str>> {
        let m = self.match1(input);
        let mut result = vec![Some(&input[m.range.clone()])];
        result.extend(
            m.captures
                .iter()
                .map(|oc| oc.as_ref().map(|c| &input[c.clone()])),
        );
        result
    }

    /// Search for all non-overlapping matches of self in \p input.
    pub fn match_all<'a>(&self, input: &'a str) -> Vec<&'a str> {
        let mut result = Vec::new();
        let mut start = 0;
        while let Some(m) = self.find_from(input, start) {
            result.push(&input[m.range.clone()]);
            start = if m.range.is_empty() {
                m.range.end + 1
            } else {
                m.range.end
            };
            if start > input.len() {
                break;
            }
        }
        result
    }

    /// Test that this regex matches nowhere in \p input.
    #[track_caller]
    pub fn test_fails(&self, input: &str) {
        assert!(
            self.find_from(input, 0).is_none(),
            "Should not have matched: {:?}",
            input
        )
    }

    /// Test that this regex, searched at the start, either fails or succeeds
    /// as \p expected.
    #[track_caller]
    pub fn test_succeeds(&self, input: &str) {
        assert!(
            self.find_from(input, 0).is_some(),
            "Should have matched: {:?}",
            input
        )
    }
}

/// The input representation to run a test against.
#[derive(Debug, Copy, Clone)]
pub enum Encoding {
    Bytes,
    Utf16,
}

/// A TestConfig is a way of compiling and running a regex against one of the
/// supported input representations.
#[derive(Debug, Copy, Clone)]
pub struct TestConfig {
    encoding: Encoding,
}

impl TestConfig {
    /// Compile a pattern to a TestCompiledRegex, with default flags.
    #[track_caller]
    pub fn compile(&self, pattern: &str) -> TestCompiledRegex {
        self.compilef(pattern, "")
    }

    /// Compile a pattern to a TestCompiledRegex, with given flags.
    #[track_caller]
    pub fn compilef(&self, pattern: &str, flags: &str) -> TestCompiledRegex {
        match rebex::Regex::with_flags(pattern, flags) {
            Ok(re) => TestCompiledRegex { re, tc: *self },
            Err(err) => panic!("Failed to parse {:?}: {}", pattern, err),
        }
    }
}

/// Run a test against every input representation.
/// Tests exercising non-ASCII input should use UTF-16 entry points directly.
pub fn test_with_configs<F>(func: F)
where
    F: Fn(TestConfig),
{
    func(TestConfig {
        encoding: Encoding::Bytes,
    });
    func(TestConfig {
        encoding: Encoding::Utf16,
    });
}
