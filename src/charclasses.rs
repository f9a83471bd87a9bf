use crate::codepointset::CodePointRange;

// Character classes like \d or \S.

/// Construct a range from an inclusive span of chars.
const fn r(first: char, last: char) -> CodePointRange {
    CodePointRange {
        first: first as u32,
        length: last as u32 - first as u32 + 1,
    }
}

/// Construct a range from a single char.
const fn r1(c: char) -> CodePointRange {
    CodePointRange {
        first: c as u32,
        length: 1,
    }
}

// Note all of these are sorted.

/// ES9 21.2.2.6.1.
pub const WORD_CHARS: [CodePointRange; 4] = [r('0', '9'), r('A', 'Z'), r1('_'), r('a', 'z')];

/// ES9 21.2.2.12.
pub const DIGITS: [CodePointRange; 1] = [r('0', '9')];

/// ES9 11.2 WhiteSpace, merged with 11.3 LineTerminator per 21.2.2.12.
pub const WHITESPACE: [CodePointRange; 10] = [
    r('\u{0009}', '\u{000D}'),
    r1('\u{0020}'),
    r1('\u{00A0}'),
    r1('\u{1680}'),
    r('\u{2000}', '\u{200A}'),
    r('\u{2028}', '\u{2029}'),
    r1('\u{202F}'),
    r1('\u{205F}'),
    r1('\u{3000}'),
    r1('\u{FEFF}'),
];

/// ES9 11.3.
pub const LINE_TERMINATOR: [CodePointRange; 3] =
    [r1('\u{000A}'), r1('\u{000D}'), r('\u{2028}', '\u{2029}')];

/// \return whether a sorted table of ranges contains \p cp.
pub fn ranges_contain(ranges: &[CodePointRange], cp: u32) -> bool {
    // Tables are tiny; a linear scan beats a binary search here.
    ranges.iter().any(|range| range.contains(cp))
}

/// \return whether \p cp is a line terminator (ES9 11.3).
pub fn is_line_terminator(cp: u32) -> bool {
    ranges_contain(&LINE_TERMINATOR, cp)
}

/// \return whether \p cp is a word char (ES9 21.2.2.6.1), for \b and \w.
pub fn is_word_char(cp: u32) -> bool {
    ranges_contain(&WORD_CHARS, cp)
}
