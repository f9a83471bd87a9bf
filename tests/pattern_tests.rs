// Work around dead code warnings: rust-lang issue #46379
pub mod common;

// Work around dead code warnings: rust-lang issue #46379
use common::*;

fn test_basic_matches_tc(tc: TestConfig) {
    tc.compile("a([0-9]+)b").match1f("!!a1234b!!").test_eq("a1234b,1234");
    assert_eq!(tc.compile("ab*c").match1("abbc").range, 0..4);
    let m = tc.compile("(ab)*c").match1("ababc");
    assert_eq!(m.range, 0..5);
    assert_eq!(m.group(1), Some(2..4));
    tc.compile("a.{3,5}c").match1f("xabbbbcx").test_eq("abbbbc");
    tc.compile("a.{3,5}c").test_fails("abbc");
    tc.compile("ab{3,5}c").match1f("xabbbbcx").test_eq("abbbbc");
    tc.compile("ab{3,5}c").test_fails("abbc");
    tc.compile("ab{3,5}c").test_fails("abbbbbbc");
    tc.compile("q[^u]").match1f("quiet Iraq visit").test_eq("q ");
    tc.compile("[ace1-9]+").match1f("x1a45cey").test_eq("1a45ce");
    tc.compile("cd((e)fg)hi").match1f("abcdefghij").test_eq("cdefghi,efg,e");
    tc.compile("(.*).*").match1f("abc").test_eq("abc,abc");
}

#[test]
fn test_basic_matches() {
    test_with_configs(test_basic_matches_tc)
}

fn test_alternation_order_tc(tc: TestConfig) {
    // Leftmost alternative wins even when a later one is longer.
    tc.compile("tour|to|tournament").match1f("tournament").test_eq("tour");
    tc.compile("(tour|to|t)+")
        .match1f("tourtotourtourist")
        .test_eq("tourtotourtour,tour");
    tc.compile("a|b|c").match_all("cab").test_eq(vec!["c", "a", "b"]);
}

#[test]
fn test_alternation_order() {
    test_with_configs(test_alternation_order_tc)
}

fn test_anchors_tc(tc: TestConfig) {
    tc.compile("^[-+]?[0-9]+[CF]$").match1f("-40C").test_eq("-40C");
    tc.compile("^[-+]?[0-9]+[CF]$").match1f("+30F").test_eq("+30F");
    tc.compile("^[-+]?[0-9]+[CF]$").test_fails("x20C");
    tc.compile("^[-+]?[0-9]+[CF]$").test_fails("-40");
    tc.compile("^$").match1f("").test_eq("");
    tc.compile("^$").test_fails("x");
}

#[test]
fn test_anchors() {
    test_with_configs(test_anchors_tc)
}

fn test_multiline_tc(tc: TestConfig) {
    tc.compilef("^abc", "").match1f("abc").test_eq("abc");
    tc.compile("^def").test_fails("abc\ndef");
    tc.compilef("^def", "m").match1f("abc\ndef").test_eq("def");
    tc.compilef("^def", "m").match1f("abc\n\rdef").test_eq("def");
    tc.compilef("[ab]$", "").match1f("a\rb").test_eq("b");
    tc.compilef("[ab]$", "m").match1f("a\rb").test_eq("a");
    tc.compilef("^\\d", "m")
        .match_all("aaa\n789\r\nccc\r\n345")
        .test_eq(vec!["7", "3"]);
    tc.compilef("\\d$", "m")
        .match_all("aaa789\n789\r\nccc10\r\n345")
        .test_eq(vec!["9", "9", "0", "5"]);
}

#[test]
fn test_multiline() {
    test_with_configs(test_multiline_tc)
}

fn test_classes_tc(tc: TestConfig) {
    tc.compile("\\d[\\W]k").match1f("ab4 km").test_eq("4 k");
    tc.compile("\\s\\S").match1f("a b").test_eq(" b");
    tc.compile("\\w+").match_all("it's a trap").test_eq(vec!["it", "s", "a", "trap"]);
    tc.compile("[\\d]+").match1f("a123b").test_eq("123");
    tc.compile("[^\\d]+").match1f("a123b").test_eq("a");
    // \b inside a class is backspace, not a word boundary.
    tc.compile("[\\b]").match1f("a\u{8}b").test_eq("\u{8}");
    // A trailing dash is a literal.
    tc.compile("[a-]+").match1f("xa-ay").test_eq("a-a");
    // A dash after a class escape is a literal.
    tc.compile("[\\d-x]").match1f("a-b").test_eq("-");
}

#[test]
fn test_classes() {
    test_with_configs(test_classes_tc)
}

fn test_word_boundary_tc(tc: TestConfig) {
    tc.compile("\\bis\\b").match1f("this is it").test_eq("is");
    tc.compile("\\Bis\\b").match1f("this is it").test_eq("is");
    assert_eq!(tc.compile("\\Bis\\b").match1("this is it").range, 2..4);
    tc.compile("\\bis\\B").test_fails("this is it");
}

#[test]
fn test_word_boundary() {
    test_with_configs(test_word_boundary_tc)
}

fn test_icase_tc(tc: TestConfig) {
    tc.compilef("BC", "i").match1f("abcd").test_eq("bc");
    tc.compilef("[a-z]+", "i").match1f("XYZ").test_eq("XYZ");
    tc.compilef("(hi)\\1", "i").match1f("xHIhIy").test_eq("HIhI,HI");
}

#[test]
fn test_icase() {
    test_with_configs(test_icase_tc)
}

fn test_loops_tc(tc: TestConfig) {
    // Lazy loops take as little as possible.
    tc.compile(".*?").match_all("a").test_eq(vec!["", ""]);
    tc.compile("a+?").match1f("aaa").test_eq("a");
    tc.compile("<(.+?)>").match1f("<a><b>").test_eq("<a>,a");
    tc.compile("<(.+)>").match1f("<a><b>").test_eq("<a><b>,a><b");
    // A loop whose body matched empty does not run again, and the discarded
    // empty expansion reverts its capture.
    assert_eq!(tc.compile("(a*)*").match1("b").range, 0..0);
    assert_eq!(tc.compile("(a*)*").match1_vec("b"), &[Some(""), None]);
    // The mandatory iteration of + keeps its empty capture.
    assert_eq!(tc.compile("(a*)+").match1_vec("b"), &[Some(""), Some("")]);
    tc.compile("(?:ab)+").match1f("xababy").test_eq("abab");
    tc.compile("a{2}").match1f("aaa").test_eq("aa");
    tc.compile("a{2,}").match1f("aaa").test_eq("aaa");
}

#[test]
fn test_loops() {
    test_with_configs(test_loops_tc)
}

fn test_non_matching_captures_tc(tc: TestConfig) {
    assert_eq!(
        tc.compile("aa(b)?aa").match1_vec("aaaa"),
        &[Some("aaaa"), None]
    );
    // A capture in a not-taken alternative is unset.
    assert_eq!(
        tc.compile("(a)|(b)").match1_vec("b"),
        &[Some("b"), None, Some("b")]
    );
}

#[test]
fn test_non_matching_captures() {
    test_with_configs(test_non_matching_captures_tc)
}

fn test_backreferences_tc(tc: TestConfig) {
    tc.compile("(\\w+) \\1").match1f("hey hey you").test_eq("hey hey,hey");
    tc.compile("(a|b)\\1").match_all("aabb ab").test_eq(vec!["aa", "bb"]);
    // A forward reference matches the empty string.
    tc.compile("\\1(a)").match1f("xay").test_eq("a,a");
    // A reference inside its own group matches the empty string.
    tc.compile("(\\1a)aa").match1f("aaa").test_eq("aaa,a");
}

#[test]
fn test_backreferences() {
    test_with_configs(test_backreferences_tc)
}

fn test_named_groups_tc(tc: TestConfig) {
    tc.compile("(?<word>\\w+) \\k<word>")
        .match1f("hey hey you")
        .test_eq("hey hey,hey");
    let m = tc.compile("(?<y>\\d{4})-(?<m>\\d{2})").match1("on 2024-06-01");
    assert_eq!(m.named_group("y"), Some(3..7));
    assert_eq!(m.named_group("m"), Some(8..10));
    assert_eq!(m.named_group("d"), None);
    // \k<name> may refer to a group defined later.
    tc.compile("\\k<x>(?<x>a)").match1f("za").test_eq("a,a");
}

#[test]
fn test_named_groups() {
    test_with_configs(test_named_groups_tc)
}

fn test_lookaround_tc(tc: TestConfig) {
    tc.compile("Jeff(?=s\\b)").match1f("Jeff Jeffs").test_eq("Jeff");
    assert_eq!(tc.compile("Jeff(?=s\\b)").match1("Jeff Jeffs").range, 5..9);
    tc.compile("Jeff(?!s\\b)").match1f("Jeff Jeffs").test_eq("Jeff");
    assert_eq!(tc.compile("Jeff(?!s\\b)").match1("Jeff Jeffs").range, 0..4);
    tc.compile("(?<=ab)c").match1f("abc").test_eq("c");
    assert_eq!(tc.compile("(?<!a)b").match1("ab cb").range, 4..5);
    // Captures made inside a lookaround persist.
    tc.compile("(?=(\\d+))\\w").match1f("4x").test_eq("4,4");
    tc.compile("(?<=(\\d))x").match1f("a5x").test_eq("x,5");
    // Backtracking past a satisfied lookahead reverts its captures.
    assert_eq!(
        tc.compile("(?=(a))b|a").match1_vec("a"),
        &[Some("a"), None]
    );
    // A satisfied negative lookaround leaves its groups unset.
    assert_eq!(
        tc.compile("a(?!(b))(.)").match1_vec("ac"),
        &[Some("ac"), None, Some("c")]
    );
    // Anchors inside a lookbehind refer to the true start of input.
    tc.compile("(?<=^abc)def").match1f("abcdef").test_eq("def");
    // Lookbehind bodies match right to left, so backrefs see later text.
    tc.compile("(?<=([ab]+)([bc]+))$").match1f("abc").test_eq(",a,bc");
}

#[test]
fn test_lookaround() {
    test_with_configs(test_lookaround_tc)
}

fn test_dotall_tc(tc: TestConfig) {
    tc.compile("a.b").test_fails("a\nb");
    tc.compilef("a.b", "s").match1f("a\nb").test_eq("a\nb");
    tc.compile("a.b").match1f("a\u{8}b").test_eq("a\u{8}b");
}

#[test]
fn test_dotall() {
    test_with_configs(test_dotall_tc)
}

fn test_escapes_tc(tc: TestConfig) {
    tc.compile("\\x41").match1f("zAz").test_eq("A");
    tc.compile("\\u0041").match1f("zAz").test_eq("A");
    tc.compile("\\cJ").match1f("a\nb").test_eq("\n");
    tc.compile("\\101").match1f("zAz").test_eq("A");
    tc.compile("\\0").match1f("a\0b").test_eq("\0");
    tc.compile("a\\/b").match1f("a/b").test_eq("a/b");
    // Annex B identity escapes outside unicode mode.
    tc.compile("\\q").match1f("qat").test_eq("q");
    tc.compile("a\\{b").match1f("a{b").test_eq("a{b");
}

#[test]
fn test_escapes() {
    test_with_configs(test_escapes_tc)
}

fn test_annex_b_literals_tc(tc: TestConfig) {
    // Unmatched braces and brackets are literals outside unicode mode.
    tc.compile("a{b").match1f("a{b").test_eq("a{b");
    tc.compile("a}b").match1f("a}b").test_eq("a}b");
    tc.compile("a]b").match1f("a]b").test_eq("a]b");
    tc.compile("abc{3").match1f("abc{3").test_eq("abc{3");
    tc.compile("{a").match1f("x{a").test_eq("{a");
    tc.compile("{3,,5}").match1f("{3,,5}").test_eq("{3,,5}");
    // An invalid brace quantifier is a literal too.
    tc.compile("a{3,e}").match1f("a{3,e}").test_eq("a{3,e}");
}

#[test]
fn test_annex_b_literals() {
    test_with_configs(test_annex_b_literals_tc)
}

fn test_quantified_lookahead_tc(tc: TestConfig) {
    // Annex B permits quantifying lookaheads outside unicode mode.
    tc.compile("(?=a)*a").match1f("a").test_eq("a");
    tc.compile("(?!b)*a").match1f("a").test_eq("a");
}

#[test]
fn test_quantified_lookahead() {
    test_with_configs(test_quantified_lookahead_tc)
}

fn test_find_from_tc(tc: TestConfig) {
    let re = tc.compile("a");
    assert_eq!(re.find_from("aba", 1).map(|m| m.range), Some(2..3));
    assert_eq!(re.find_from("aba", 3), None);
    // Lookbehind can see text before the start position.
    let lb = tc.compile("(?<=a)b");
    assert_eq!(lb.find_from("ab", 1).map(|m| m.range), Some(1..2));
}

#[test]
fn test_find_from() {
    test_with_configs(test_find_from_tc)
}

#[test]
fn test_utf16_surrogate_pairs() {
    // Without the u flag a surrogate pair is two separate units.
    let input = to_utf16("x\u{1F600}y");
    let re = rebex::Regex::new(".").unwrap();
    let m = re.find_utf16(&input).unwrap();
    assert_eq!(m.range, 0..1);
    let re = rebex::Regex::with_flags("x(.)", "").unwrap();
    let m = re.find_utf16(&input).unwrap();
    assert_eq!(m.range, 0..2);

    // With the u flag the pair decodes to one code point.
    let re = rebex::Regex::with_flags("x(.)y", "u").unwrap();
    let m = re.find_utf16(&input).unwrap();
    assert_eq!(m.range, 0..4);
    assert_eq!(m.group(1), Some(1..3));
    let re = rebex::Regex::with_flags("\u{1F600}", "u").unwrap();
    assert_eq!(re.find_utf16(&input).map(|m| m.range), Some(1..3));
}

#[test]
fn test_unicode_case_folding() {
    // U+00B5 MICRO SIGN and U+03BC GREEK SMALL LETTER MU canonicalize
    // together under both rule sets, via fold and via uppercase.
    let input = to_utf16("\u{03BC}");
    let re = rebex::Regex::with_flags("\u{00B5}", "iu").unwrap();
    assert!(re.find_utf16(&input).is_some());
    let re = rebex::Regex::with_flags("\u{00B5}", "i").unwrap();
    assert!(re.find_utf16(&input).is_some());

    // KELVIN SIGN folds to k only under the unicode rules; the legacy rules
    // never map a non-ASCII code point through case changes into ASCII.
    let kelvin = to_utf16("\u{212A}");
    let re = rebex::Regex::with_flags("k", "iu").unwrap();
    assert!(re.find_utf16(&kelvin).is_some());
    let re = rebex::Regex::with_flags("k", "i").unwrap();
    assert!(re.find_utf16(&kelvin).is_none());
}

#[test]
fn test_backtrack_limit() {
    // Catastrophic backtracking errors out rather than hanging.
    let re = rebex::Regex::new("(){999999999}").unwrap();
    assert!(re.try_find_from("a", 0).is_err());
}
