//! Parser from pattern text to the syntax tree.
//!
//! The grammar follows ES9 21.2 with the Annex B extensions: legacy octal
//! escapes, identity escapes, and literal braces are accepted unless the
//! unicode flag demands strictness.

use crate::canonical::canonicalize;
use crate::node::{Node, NodeArena, NodeId, NodeList};
use crate::types::{
    BracketContents, CharClassType, CharacterClass, Error, SyntaxFlags, MAX_CAPTURE_GROUPS,
    MAX_LOOPS, MAX_NESTING_DEPTH,
};
use std::collections::HashMap;
use std::iter::Peekable;

/// The result of parsing a pattern.
pub struct ParsedRegex {
    pub arena: NodeArena,
    /// The top-level node list. Ends with Goal.
    pub root: NodeList,
    pub flags: SyntaxFlags,
    pub group_count: u16,
    pub loop_count: u16,
    /// Names of named capture groups, keyed to their 0-based group number.
    pub group_names: HashMap<String, u16>,
}

struct Quantifier {
    min: u32,
    max: u32,
    greedy: bool,
}

enum ClassAtom {
    CodePoint(u32),
    Class(CharacterClass),
}

struct LookaroundParams {
    invert: bool,
    backwards: bool,
}

fn class_from_char(c: char) -> CharacterClass {
    let kind = match c.to_ascii_lowercase() {
        'd' => CharClassType::Digits,
        's' => CharClassType::Spaces,
        'w' => CharClassType::Words,
        _ => panic!("Not a class escape"),
    };
    CharacterClass {
        kind,
        inverted: c.is_ascii_uppercase(),
    }
}

struct Parser<'a> {
    /// The remaining input.
    input: Peekable<std::str::Chars<'a>>,

    flags: SyntaxFlags,

    arena: NodeArena,

    loop_count: u32,

    group_count: u32,

    /// Largest decimal escape treated as a backreference so far.
    max_backref: u32,

    /// Decimal escapes above this are not backreferences; they fall back to
    /// legacy octal or identity escapes.
    backref_limit: u32,

    group_names: HashMap<String, u16>,

    /// Named backreferences encountered, resolved once all groups are known.
    named_backrefs: Vec<(String, NodeId)>,

    /// Current depth of disjunction recursion.
    nesting_depth: u32,
}

impl<'a> Parser<'a> {
    /// Consume a character which must be next.
    fn consume(&mut self, c: char) -> char {
        let nc = self.input.next();
        debug_assert!(nc == Some(c), "Char was not next");
        c
    }

    /// If the input begins with \p c, consume it and return true.
    fn try_consume(&mut self, c: char) -> bool {
        let mut cursor = self.input.clone();
        if cursor.next() == Some(c) {
            self.input = cursor;
            true
        } else {
            false
        }
    }

    /// If the input begins with the string \p s, consume it and return true.
    fn try_consume_str(&mut self, s: &str) -> bool {
        let mut cursor = self.input.clone();
        for c1 in s.chars() {
            if cursor.next() != Some(c1) {
                return false;
            }
        }
        self.input = cursor;
        true
    }

    fn peek(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn next(&mut self) -> Option<char> {
        self.input.next()
    }

    fn push_char(&mut self, list: &mut NodeList, cp: u32) {
        let cp = if self.flags.icase {
            canonicalize(cp, self.flags.unicode)
        } else {
            cp
        };
        let node = self.arena.alloc(Node::MatchChar {
            chars: vec![cp],
            icase: self.flags.icase,
            unicode: self.flags.unicode,
        });
        list.push(node);
    }

    /// \return the parsed tree and the largest backreference seen.
    fn try_parse(mut self) -> Result<(ParsedRegex, u32), Error> {
        let mut root = self.consume_disjunction()?;
        // Everything must have been consumed; a leftover char can only be an
        // unmatched closing paren.
        if self.peek().is_some() {
            return Err(Error::UnbalancedParenthesis);
        }
        self.resolve_named_backrefs()?;
        let goal = self.arena.alloc(Node::Goal);
        root.push(goal);
        let max_backref = self.max_backref;
        Ok((
            ParsedRegex {
                arena: self.arena,
                root,
                flags: self.flags,
                group_count: self.group_count as u16,
                loop_count: self.loop_count as u16,
                group_names: self.group_names,
            },
            max_backref,
        ))
    }

    fn resolve_named_backrefs(&mut self) -> Result<(), Error> {
        for (name, id) in std::mem::take(&mut self.named_backrefs) {
            let &group = self
                .group_names
                .get(&name)
                .ok_or(Error::NonexistentNamedCaptureReference)?;
            match self.arena.get_mut(id) {
                Node::BackRef { mexp } => *mexp = group + 1,
                _ => unreachable!("Named backref resolved to non-backref node"),
            }
        }
        Ok(())
    }

    /// ES9 21.2.2.3 Disjunction.
    fn consume_disjunction(&mut self) -> Result<NodeList, Error> {
        // Every group and lookaround recurses through here. The depth check
        // keeps a deeply nested pattern from exhausting the native stack.
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            return Err(Error::PatternExceedsParseLimits);
        }
        self.nesting_depth += 1;
        let result = self.consume_disjunction_contents();
        self.nesting_depth -= 1;
        result
    }

    fn consume_disjunction_contents(&mut self) -> Result<NodeList, Error> {
        let first = self.consume_term()?;
        if !self.try_consume('|') {
            return Ok(first);
        }
        let mut alternatives = vec![first];
        loop {
            alternatives.push(self.consume_term()?);
            if !self.try_consume('|') {
                break;
            }
        }
        let node = self.arena.alloc(Node::Alternation { alternatives });
        Ok(vec![node])
    }

    /// ES9 21.2.2.5 Term: a sequence of atoms with quantifiers.
    fn consume_term(&mut self) -> Result<NodeList, Error> {
        let mut result: NodeList = Vec::new();
        loop {
            let start_group = self.group_count;
            let start_offset = result.len();
            let mut quantifier_allowed = true;

            let c = match self.peek() {
                None => return Ok(result),
                Some(c) => c,
            };
            match c {
                // A term is terminated by a closing paren or an alternation.
                ')' | '|' => break,

                '^' => {
                    self.consume('^');
                    let node = self.arena.alloc(Node::LeftAnchor {
                        multiline: self.flags.multiline,
                    });
                    result.push(node);
                    quantifier_allowed = false;
                }

                '$' => {
                    self.consume('$');
                    let node = self.arena.alloc(Node::RightAnchor);
                    result.push(node);
                    quantifier_allowed = false;
                }

                '\\' => {
                    self.consume('\\');
                    quantifier_allowed = self.consume_atom_escape(&mut result)?;
                }

                '.' => {
                    self.consume('.');
                    let node = self.arena.alloc(Node::MatchAny {
                        dot_all: self.flags.dot_all,
                        unicode: self.flags.unicode,
                    });
                    result.push(node);
                }

                '(' => {
                    if self.try_consume_str("(?=") {
                        // Annex B allows quantified lookaheads outside unicode
                        // mode.
                        quantifier_allowed = !self.flags.unicode;
                        let node = self.consume_lookaround_assertion(LookaroundParams {
                            invert: false,
                            backwards: false,
                        })?;
                        result.push(node);
                    } else if self.try_consume_str("(?!") {
                        quantifier_allowed = !self.flags.unicode;
                        let node = self.consume_lookaround_assertion(LookaroundParams {
                            invert: true,
                            backwards: false,
                        })?;
                        result.push(node);
                    } else if self.try_consume_str("(?<=") {
                        quantifier_allowed = false;
                        let node = self.consume_lookaround_assertion(LookaroundParams {
                            invert: false,
                            backwards: true,
                        })?;
                        result.push(node);
                    } else if self.try_consume_str("(?<!") {
                        quantifier_allowed = false;
                        let node = self.consume_lookaround_assertion(LookaroundParams {
                            invert: true,
                            backwards: true,
                        })?;
                        result.push(node);
                    } else if self.try_consume_str("(?:") {
                        // Non-capturing group: splice the contents directly
                        // into this term.
                        let body = self.consume_disjunction()?;
                        result.extend(body);
                    } else {
                        self.consume('(');
                        result.push(self.consume_group()?);
                    }
                    if !self.try_consume(')') {
                        return Err(Error::UnbalancedParenthesis);
                    }
                }

                '[' => {
                    let node = self.consume_bracket()?;
                    result.push(node);
                }

                '*' | '+' | '?' => return Err(Error::InvalidRepeat),

                '{' => {
                    // A valid quantifier here has nothing to repeat. An
                    // invalid one is a literal brace, unless unicode mode
                    // forbids that.
                    let saved = self.input.clone();
                    if self.try_consume_quantifier()?.is_some() {
                        return Err(Error::InvalidRepeat);
                    }
                    self.input = saved;
                    if self.flags.unicode {
                        return Err(Error::InvalidQuantifierBracket);
                    }
                    self.consume('{');
                    self.push_char(&mut result, '{' as u32);
                }

                '}' => {
                    if self.flags.unicode {
                        return Err(Error::InvalidQuantifierBracket);
                    }
                    self.consume('}');
                    self.push_char(&mut result, '}' as u32);
                }

                ']' => {
                    if self.flags.unicode {
                        return Err(Error::UnbalancedBracket);
                    }
                    self.consume(']');
                    self.push_char(&mut result, ']' as u32);
                }

                c => {
                    self.consume(c);
                    self.push_char(&mut result, c as u32);
                }
            }

            // We just parsed an atom; apply a quantifier if one follows.
            if let Some(quant) = self.try_consume_quantifier()? {
                if !quantifier_allowed {
                    return Err(Error::InvalidRepeat);
                }
                // Range checks happen here, not during quantifier parsing:
                // an incomplete brace like `a{3` is a literal, but a complete
                // out-of-order one like `a{10,3}` is an error.
                if quant.min > quant.max {
                    return Err(Error::BraceRange);
                }
                if quant.min == 1 && quant.max == 1 {
                    continue;
                }
                if self.loop_count >= MAX_LOOPS {
                    return Err(Error::PatternExceedsParseLimits);
                }
                let loop_id = self.loop_count as u16;
                self.loop_count += 1;
                let body = result.split_off(start_offset);
                let node = self.arena.alloc(Node::Loop {
                    loop_id,
                    min: quant.min,
                    max: quant.max,
                    greedy: quant.greedy,
                    mexp_begin: start_group as u16,
                    mexp_end: self.group_count as u16,
                    body,
                });
                result.push(node);
            }
        }
        Ok(result)
    }

    /// Consume a capture group whose `(` has been consumed, named or plain.
    fn consume_group(&mut self) -> Result<NodeId, Error> {
        let name = if self.try_consume_str("?<") {
            Some(self.consume_group_name()?)
        } else if self.try_consume('?') {
            // (?...) with an unrecognized specifier.
            return Err(Error::InvalidRepeat);
        } else {
            None
        };
        if self.group_count >= MAX_CAPTURE_GROUPS {
            return Err(Error::PatternExceedsParseLimits);
        }
        let mexp = self.group_count as u16;
        self.group_count += 1;
        if let Some(name) = name {
            if self.group_names.insert(name, mexp).is_some() {
                return Err(Error::DuplicateCaptureGroupName);
            }
        }
        let body = self.consume_disjunction()?;
        Ok(self.arena.alloc(Node::MarkedSubexpression { mexp, body }))
    }

    /// Consume a group name up to and including the closing `>`.
    fn consume_group_name(&mut self) -> Result<String, Error> {
        let mut name = String::new();
        loop {
            match self.next() {
                None => return Err(Error::InvalidCaptureGroupName),
                Some('>') => break,
                Some(c) => name.push(c),
            }
        }
        let mut chars = name.chars();
        let valid_start = |c: char| c.is_alphabetic() || c == '_' || c == '$';
        let valid_rest = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
        match chars.next() {
            Some(c) if valid_start(c) && chars.all(valid_rest) => Ok(name),
            _ => Err(Error::InvalidCaptureGroupName),
        }
    }

    fn consume_lookaround_assertion(&mut self, params: LookaroundParams) -> Result<NodeId, Error> {
        let start_group = self.group_count as u16;
        let body = self.consume_disjunction()?;
        let end_group = self.group_count as u16;
        Ok(self.arena.alloc(Node::Lookaround {
            invert: params.invert,
            forwards: !params.backwards,
            mexp_begin: start_group,
            mexp_end: end_group,
            body,
        }))
    }

    /// ES9 21.2.2.13 CharacterClass.
    fn consume_bracket(&mut self) -> Result<NodeId, Error> {
        self.consume('[');
        let mut contents = BracketContents {
            negate: self.try_consume('^'),
            ..BracketContents::default()
        };
        loop {
            if self.peek().is_none() {
                return Err(Error::UnbalancedBracket);
            }
            if self.try_consume(']') {
                return Ok(self.arena.alloc(Node::Bracket {
                    contents,
                    icase: self.flags.icase,
                    unicode: self.flags.unicode,
                }));
            }

            let first = match self.try_consume_bracket_class_atom()? {
                None => continue,
                Some(atom) => atom,
            };

            // A dash after an atom may begin a range.
            if !self.try_consume('-') {
                self.add_class_atom(&mut contents, first);
                continue;
            }
            let second = match self.try_consume_bracket_class_atom()? {
                None => {
                    // Trailing dash, like [a-].
                    self.add_class_atom(&mut contents, first);
                    self.add_class_atom(&mut contents, ClassAtom::CodePoint('-' as u32));
                    continue;
                }
                Some(atom) => atom,
            };

            // Class escapes cannot be range endpoints. Annex B demotes the
            // dash to a literal; unicode mode rejects it.
            // ES9 21.2.2.15.1: out-of-order ranges are an error.
            match (first, second) {
                (ClassAtom::CodePoint(c1), ClassAtom::CodePoint(c2)) => {
                    if c1 > c2 {
                        return Err(Error::CharacterRange);
                    }
                    contents.cps.add(crate::codepointset::CodePointRange::inclusive(c1, c2));
                }
                (first, second) => {
                    if self.flags.unicode {
                        return Err(Error::CharacterRange);
                    }
                    self.add_class_atom(&mut contents, first);
                    self.add_class_atom(&mut contents, ClassAtom::CodePoint('-' as u32));
                    self.add_class_atom(&mut contents, second);
                }
            }
        }
    }

    fn add_class_atom(&mut self, contents: &mut BracketContents, atom: ClassAtom) {
        match atom {
            ClassAtom::CodePoint(cp) => contents.cps.add_one(cp),
            ClassAtom::Class(class) => contents.classes.push(class),
        }
    }

    fn try_consume_bracket_class_atom(&mut self) -> Result<Option<ClassAtom>, Error> {
        let c = match self.peek() {
            None => return Ok(None),
            Some(c) => c,
        };
        match c {
            ']' => Ok(None),

            '\\' => {
                self.consume('\\');
                let ec = match self.peek() {
                    None => return Err(Error::EscapeIncomplete),
                    Some(ec) => ec,
                };
                match ec {
                    // ES9 21.2.2.12 CharacterClassEscape.
                    'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                        self.consume(ec);
                        Ok(Some(ClassAtom::Class(class_from_char(ec))))
                    }
                    // In a class, \b is a backspace.
                    'b' => {
                        self.consume('b');
                        Ok(Some(ClassAtom::CodePoint(0x08)))
                    }
                    '-' => {
                        self.consume('-');
                        Ok(Some(ClassAtom::CodePoint('-' as u32)))
                    }
                    _ => {
                        let cp = self.consume_character_escape()?;
                        Ok(Some(ClassAtom::CodePoint(cp)))
                    }
                }
            }

            c => {
                self.consume(c);
                Ok(Some(ClassAtom::CodePoint(c as u32)))
            }
        }
    }

    fn try_consume_quantifier(&mut self) -> Result<Option<Quantifier>, Error> {
        if let Some(mut quant) = self.try_consume_quantifier_prefix()? {
            quant.greedy = !self.try_consume('?');
            Ok(Some(quant))
        } else {
            Ok(None)
        }
    }

    fn try_consume_quantifier_prefix(&mut self) -> Result<Option<Quantifier>, Error> {
        let c = match self.peek() {
            None => return Ok(None),
            Some(c) => c,
        };
        let quant = |min, max| {
            Ok(Some(Quantifier {
                min,
                max,
                greedy: true,
            }))
        };
        match c {
            '+' => {
                self.consume('+');
                quant(1, u32::MAX)
            }
            '*' => {
                self.consume('*');
                quant(0, u32::MAX)
            }
            '?' => {
                self.consume('?');
                quant(0, 1)
            }
            '{' => {
                // An incomplete brace is not a quantifier; roll back.
                let saved = self.input.clone();
                self.consume('{');
                let min = match self.try_consume_decimal_integer_literal() {
                    None => {
                        self.input = saved;
                        return Ok(None);
                    }
                    Some(min) => min,
                };
                let max = if self.try_consume(',') {
                    // {3,} or {3,4}
                    self.try_consume_decimal_integer_literal().unwrap_or(u32::MAX)
                } else {
                    // {3}
                    min
                };
                if !self.try_consume('}') {
                    self.input = saved;
                    return Ok(None);
                }
                quant(min, max)
            }
            _ => Ok(None),
        }
    }

    /// ES9 11.8.3 DecimalIntegerLiteral, saturating at u32::MAX.
    /// All decimal digits are consumed regardless.
    fn try_consume_decimal_integer_literal(&mut self) -> Option<u32> {
        let mut result: u32 = 0;
        let mut digit_count = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            self.next();
            digit_count += 1;
            result = result.saturating_mul(10).saturating_add(digit);
        }
        if digit_count > 0 {
            Some(result)
        } else {
            None
        }
    }

    /// Consume an atom escape after its backslash, pushing the parsed node.
    /// \return whether the atom may be quantified.
    fn consume_atom_escape(&mut self, result: &mut NodeList) -> Result<bool, Error> {
        let c = match self.peek() {
            None => return Err(Error::EscapeIncomplete),
            Some(c) => c,
        };
        match c {
            'b' | 'B' => {
                self.consume(c);
                let node = self.arena.alloc(Node::WordBoundary { invert: c == 'B' });
                result.push(node);
                Ok(false)
            }

            'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                self.consume(c);
                let contents = BracketContents {
                    negate: false,
                    classes: vec![class_from_char(c)],
                    cps: Default::default(),
                };
                let node = self.arena.alloc(Node::Bracket {
                    contents,
                    icase: self.flags.icase,
                    unicode: self.flags.unicode,
                });
                result.push(node);
                Ok(true)
            }

            '1'..='9' => {
                // A decimal escape is a backreference if it does not exceed
                // the backreference limit; otherwise Annex B reinterprets it
                // as a legacy octal or identity escape.
                let saved = self.input.clone();
                let val = self
                    .try_consume_decimal_integer_literal()
                    .unwrap_or_else(|| unreachable!("Digit was next"));
                if val <= self.backref_limit {
                    self.max_backref = self.max_backref.max(val);
                    let node = self.arena.alloc(Node::BackRef { mexp: val as u16 });
                    result.push(node);
                } else if self.flags.unicode {
                    return Err(Error::EscapeInvalid);
                } else {
                    self.input = saved;
                    if c < '8' {
                        let cp = self.consume_legacy_octal_escape();
                        self.push_char(result, cp);
                    } else {
                        self.consume(c);
                        self.push_char(result, c as u32);
                    }
                }
                Ok(true)
            }

            'k' => {
                self.consume('k');
                if self.try_consume('<') {
                    let mut name = String::new();
                    loop {
                        match self.next() {
                            None => return Err(Error::InvalidCaptureGroupName),
                            Some('>') => break,
                            Some(nc) => name.push(nc),
                        }
                    }
                    // Group number filled in once all groups are known, so
                    // forward references work.
                    let node = self.arena.alloc(Node::BackRef { mexp: 0 });
                    self.named_backrefs.push((name, node));
                    result.push(node);
                } else if self.flags.unicode {
                    return Err(Error::EscapeInvalid);
                } else {
                    self.push_char(result, 'k' as u32);
                }
                Ok(true)
            }

            _ => {
                let cp = self.consume_character_escape()?;
                self.push_char(result, cp);
                Ok(true)
            }
        }
    }

    /// ES9 21.2.2.10 CharacterEscape, with the Annex B extensions. The
    /// backslash has been consumed; on success the escape body has too.
    fn consume_character_escape(&mut self) -> Result<u32, Error> {
        let c = match self.peek() {
            None => return Err(Error::EscapeIncomplete),
            Some(c) => c,
        };
        match c {
            'f' => {
                self.consume('f');
                Ok(0xC)
            }
            'n' => {
                self.consume('n');
                Ok(0xA)
            }
            'r' => {
                self.consume('r');
                Ok(0xD)
            }
            't' => {
                self.consume('t');
                Ok(0x9)
            }
            'v' => {
                self.consume('v');
                Ok(0xB)
            }

            'c' => {
                // Control escape \cX. A dangling \c is an identity escape for
                // the backslash outside unicode mode.
                let saved = self.input.clone();
                self.consume('c');
                if let Some(nc) = self.next() {
                    if nc.is_ascii_alphabetic() {
                        return Ok((nc as u32) % 32);
                    }
                }
                if self.flags.unicode {
                    return Err(Error::EscapeInvalid);
                }
                self.input = saved;
                Ok('\\' as u32)
            }

            '0' => {
                self.consume('0');
                match self.peek() {
                    Some(nc) if nc.is_ascii_digit() => {
                        if self.flags.unicode {
                            return Err(Error::EscapeInvalid);
                        }
                        // Legacy octal continues from the 0.
                        let mut cp = 0;
                        for _ in 0..2 {
                            match self.peek().and_then(|d| d.to_digit(8)) {
                                Some(digit) => {
                                    self.next();
                                    cp = cp * 8 + digit;
                                }
                                None => break,
                            }
                        }
                        Ok(cp)
                    }
                    _ => Ok(0),
                }
            }

            '1'..='7' => {
                if self.flags.unicode {
                    return Err(Error::EscapeInvalid);
                }
                Ok(self.consume_legacy_octal_escape())
            }

            'x' => {
                self.consume('x');
                let saved = self.input.clone();
                let x1 = self.next().and_then(|h| h.to_digit(16));
                let x2 = self.next().and_then(|h| h.to_digit(16));
                match (x1, x2) {
                    (Some(x1), Some(x2)) => Ok(x1 * 16 + x2),
                    _ if self.flags.unicode => Err(Error::EscapeInvalid),
                    _ => {
                        // Identity escape for the x itself.
                        self.input = saved;
                        Ok('x' as u32)
                    }
                }
            }

            'u' => self.consume_unicode_escape(),

            _ => {
                // IdentityEscape. Unicode mode restricts it to syntax
                // characters and the slash.
                if self.flags.unicode && !"^$\\.*+?()[]{}|/".contains(c) {
                    return Err(Error::EscapeInvalid);
                }
                self.consume(c);
                Ok(c as u32)
            }
        }
    }

    /// Annex B LegacyOctalEscapeSequence: one to three octal digits, where a
    /// third digit is only taken if the first is at most 3.
    fn consume_legacy_octal_escape(&mut self) -> u32 {
        let first = match self.peek().and_then(|c| c.to_digit(8)) {
            Some(d) => d,
            None => unreachable!("Octal digit was next"),
        };
        self.next();
        let mut cp = first;
        let max_digits = if first <= 3 { 2 } else { 1 };
        for _ in 0..max_digits {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(digit) => {
                    self.next();
                    cp = cp * 8 + digit;
                }
                None => break,
            }
        }
        cp
    }

    /// \uHHHH, \u{H+} in unicode mode, and surrogate pair combining. The `u`
    /// has not been consumed.
    fn consume_unicode_escape(&mut self) -> Result<u32, Error> {
        self.consume('u');
        let saved = self.input.clone();
        if let Some(cp) = self.try_consume_hex4() {
            // A high surrogate may pair with an immediately following \uXXXX
            // low surrogate in unicode mode.
            if self.flags.unicode && (0xD800..0xDC00).contains(&cp) {
                let pair_saved = self.input.clone();
                if self.try_consume_str("\\u") {
                    if let Some(low) = self.try_consume_hex4() {
                        if (0xDC00..0xE000).contains(&low) {
                            return Ok(0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00));
                        }
                    }
                    self.input = pair_saved;
                }
            }
            return Ok(cp);
        }
        self.input = saved;
        if self.flags.unicode {
            // Code point escape \u{H+}.
            if self.try_consume('{') {
                let mut cp: u32 = 0;
                let mut digit_count = 0;
                while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
                    self.next();
                    digit_count += 1;
                    cp = cp.saturating_mul(16).saturating_add(digit);
                }
                if digit_count == 0 || !self.try_consume('}') {
                    return Err(Error::EscapeInvalid);
                }
                if cp > 0x10FFFF {
                    return Err(Error::EscapeOverflow);
                }
                return Ok(cp);
            }
            return Err(Error::EscapeInvalid);
        }
        // Identity escape for the u itself.
        Ok('u' as u32)
    }

    fn try_consume_hex4(&mut self) -> Option<u32> {
        let saved = self.input.clone();
        let mut cp: u32 = 0;
        for _ in 0..4 {
            match self.next().and_then(|c| c.to_digit(16)) {
                Some(digit) => cp = cp * 16 + digit,
                None => {
                    self.input = saved;
                    return None;
                }
            }
        }
        Some(cp)
    }
}

fn parse_with_backref_limit(
    pattern: &str,
    flags: SyntaxFlags,
    backref_limit: u32,
) -> Result<(ParsedRegex, u32), Error> {
    let parser = Parser {
        input: pattern.chars().peekable(),
        flags,
        arena: NodeArena::new(),
        loop_count: 0,
        group_count: 0,
        max_backref: 0,
        backref_limit,
        group_names: HashMap::new(),
        named_backrefs: Vec::new(),
        nesting_depth: 0,
    };
    parser.try_parse()
}

/// Parse \p pattern with \p flags into a syntax tree.
///
/// Decimal escapes are first treated as backreferences. If one exceeds the
/// actual number of groups, the pattern is reparsed with the limit lowered to
/// the group count, demoting overlarge escapes to octal or identity escapes
/// (unicode mode rejects them instead).
pub fn try_parse(pattern: &str, flags: SyntaxFlags) -> Result<ParsedRegex, Error> {
    let (parsed, max_backref) = parse_with_backref_limit(pattern, flags, MAX_CAPTURE_GROUPS)?;
    if max_backref > parsed.group_count as u32 {
        if flags.unicode {
            return Err(Error::EscapeInvalid);
        }
        let (reparsed, _) = parse_with_backref_limit(pattern, flags, parsed.group_count as u32)?;
        return Ok(reparsed);
    }
    Ok(parsed)
}
