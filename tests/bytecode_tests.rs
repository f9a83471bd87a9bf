// Tests for the compiled bytecode surface: the self-describing header and
// the match constraints the compiler derives from the pattern.

use rebex::Regex;

// Header layout: groups u16, loops u16, flags u8, constraints u8.
const HEADER_CONSTRAINTS: usize = 5;

const NON_ASCII: u8 = 1 << 0;
const ANCHORED_AT_START: u8 = 1 << 1;
const NON_EMPTY: u8 = 1 << 2;

fn constraints(pattern: &str, flags: &str) -> u8 {
    let re = Regex::with_flags(pattern, flags).unwrap();
    re.bytecode()[HEADER_CONSTRAINTS]
}

#[test]
fn test_anchored_constraint() {
    let anchored = |p| constraints(p, "") & ANCHORED_AT_START != 0;
    assert!(anchored("^abc"));
    assert!(anchored("abc^"));
    assert!(anchored("abc^|^def"));
    assert!(anchored("(^bar)"));
    assert!(anchored("(?=^bar)\\w+"));
    assert!(!anchored("abc"));
    assert!(!anchored("abc|^def"));
    assert!(!anchored("(?!^bar)\\w+"));
    assert!(!anchored("(?=^bar)|\\w+"));
    // Multiline ^ can match mid-string.
    assert!(constraints("^abc", "m") & ANCHORED_AT_START == 0);
}

#[test]
fn test_non_ascii_constraint() {
    let non_ascii = |p| constraints(p, "") & NON_ASCII != 0;
    assert!(non_ascii("ab\\xFF"));
    assert!(non_ascii("[\\xFE]"));
    assert!(non_ascii("ab(\\xFF|\\u1000)"));
    assert!(!non_ascii("abc"));
    assert!(!non_ascii("[0\\xFE]"));
    assert!(!non_ascii("[^\\xFE]"));
    assert!(!non_ascii("[\\w\\xFE]"));
    assert!(!non_ascii("[\\x7F\\xFE]"));
    assert!(!non_ascii("ab(\\xFF|c)"));
}

#[test]
fn test_non_empty_constraint() {
    assert!(constraints("a", "") & NON_EMPTY != 0);
    assert!(constraints("a+", "") & NON_EMPTY != 0);
    assert!(constraints("a*", "") & NON_EMPTY == 0);
    assert!(constraints("a|", "") & NON_EMPTY == 0);
    assert!(constraints("\\b", "") & NON_EMPTY == 0);
}

#[test]
fn test_constraints_reject_early() {
    // An all-ASCII haystack can never satisfy a NON_ASCII pattern, even one
    // which would otherwise backtrack catastrophically.
    let re = Regex::new("(((.*)*)*)*\\xFF").unwrap();
    assert_eq!(re.find("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"), None);

    // An anchored pattern searched from a later position cannot match.
    let re = Regex::new("^b").unwrap();
    assert_eq!(re.find_from("ab", 1), None);
}

#[test]
fn test_header_counts() {
    let re = Regex::new("(a)(b)(c)d+e*").unwrap();
    let bc = re.bytecode();
    let groups = u16::from_le_bytes([bc[0], bc[1]]);
    let loops = u16::from_le_bytes([bc[2], bc[3]]);
    assert_eq!(groups, 3);
    assert_eq!(loops, 2);
}

#[test]
fn test_flags_round_trip() {
    let re = Regex::with_flags("a", "imsuy").unwrap();
    let flags = re.flags();
    assert!(flags.icase && flags.multiline && flags.dot_all && flags.unicode && flags.sticky);
    assert!(!flags.global);
}

#[test]
fn test_deterministic_compilation() {
    let a = Regex::with_flags("(?<g>a|bb)+[^c-f]\\d*?$", "im").unwrap();
    let b = Regex::with_flags("(?<g>a|bb)+[^c-f]\\d*?$", "im").unwrap();
    assert_eq!(a.bytecode(), b.bytecode());
}

#[test]
fn test_disassembly() {
    let re = Regex::new("abc|d").unwrap();
    let text = re.disassemble();
    assert!(text.starts_with("header:"), "{}", text);
    assert!(text.contains("Alternation"), "{}", text);
    assert!(text.contains("Goal"), "{}", text);

    // A lookaround carries its body's constraints so the executor can skip
    // an unsatisfiable sub-match.
    let re = Regex::new("(?=x)y").unwrap();
    let text = re.disassemble();
    assert!(
        text.contains("Lookaround invert=0 forwards=1 constraints=0x04"),
        "{}",
        text
    );
}
