// Property tests: random patterns must never panic the parser, and the two
// input representations must agree on ASCII haystacks.

use proptest::prelude::*;

fn atom_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        "[a-c]{1,2}".prop_map(|s| s),
        Just(".".to_string()),
        Just("\\d".to_string()),
        Just("\\w".to_string()),
        Just("[ab]".to_string()),
        Just("[^b]".to_string()),
        Just("(a)".to_string()),
        Just("(?:ab)".to_string()),
        Just("a|b".to_string()),
        Just("\\b".to_string()),
    ]
    .boxed()
}

fn quantifier_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just("".to_string()),
        Just("*".to_string()),
        Just("+".to_string()),
        Just("?".to_string()),
        Just("*?".to_string()),
        Just("{1,3}".to_string()),
    ]
    .boxed()
}

fn pattern_strategy() -> BoxedStrategy<String> {
    proptest::collection::vec((atom_strategy(), quantifier_strategy()), 1..5)
        .prop_map(|pieces| {
            let mut pattern = String::new();
            for (atom, quant) in pieces {
                // Quantifying a bare alternation or assertion is a syntax
                // error; group it.
                if quant.is_empty() || !(atom.contains('|') || atom == "\\b") {
                    pattern.push_str(&atom);
                } else {
                    pattern.push_str(&format!("(?:{})", atom));
                }
                pattern.push_str(&quant);
            }
            pattern
        })
        .boxed()
}

proptest! {
    #[test]
    fn parse_arbitrary_text_no_panic(pattern in "\\PC{0,12}") {
        // Anything may be rejected, nothing may panic.
        let _ = rebex::Regex::new(&pattern);
        let _ = rebex::Regex::with_flags(&pattern, "u");
    }

    #[test]
    fn match_results_well_formed(
        pattern in pattern_strategy(),
        input in "[abc ]{0,16}",
    ) {
        let re = rebex::Regex::new(&pattern).unwrap();
        if let Some(m) = re.find(&input) {
            prop_assert!(m.range.start <= m.range.end);
            prop_assert!(m.range.end <= input.len());
            for capture in m.captures.iter().flatten() {
                prop_assert!(capture.start <= capture.end);
                prop_assert!(capture.end <= input.len());
            }
        }
    }

    #[test]
    fn encodings_agree_on_ascii(
        pattern in pattern_strategy(),
        input in "[abc ]{0,16}",
    ) {
        let re = rebex::Regex::new(&pattern).unwrap();
        let bytes_match = re.find(&input).map(|m| (m.range, m.captures));
        let units: Vec<u16> = input.encode_utf16().collect();
        let utf16_match = re.find_utf16(&units).map(|m| (m.range, m.captures));
        prop_assert_eq!(bytes_match, utf16_match);
    }
}
