//! The bytecode interpreter: a backtracking executor over a compiled
//! instruction stream.
//!
//! Backtracking is explicit. Instead of re-running the interpreter
//! recursively, choice points push records onto a backtrack stack; on failure
//! the stack is unwound until a record resumes execution somewhere else.
//! Lookarounds are the one exception: they run the interpreter recursively on
//! a copy of the state, with recursion depth bounded by pattern nesting.

use crate::bytecode::{
    BytecodeHeader, Opcode, StreamRead, ALTERNATION_WIDTH, BEGIN_LOOP_WIDTH,
    BEGIN_SIMPLE_LOOP_WIDTH, END_SIMPLE_LOOP_WIDTH, LOOKAROUND_WIDTH, WIDTH1_LOOP_WIDTH,
};
use crate::canonical::canonicalize;
use crate::charclasses;
use crate::indexing::InputIndexer;
use crate::node::{CLASS_DIGITS, CLASS_SPACES, CLASS_WORDS};
use crate::types::{
    CapturedRange, MatchConstraintSet, MatchFlags, SyntaxFlags, CONSTRAINT_ANCHORED_AT_START,
    CONSTRAINT_NON_ASCII,
};
use std::fmt;

/// Maximum number of pending backtrack records before a match attempt is
/// abandoned.
pub const MAX_BACKTRACK_DEPTH: usize = 1 << 24;

/// Maximum number of interpreter steps per match attempt.
const BACKTRACK_BUDGET: u64 = 1 << 30;

/// The search ran out of backtracking space or interpreter budget.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StackOverflow;

impl fmt::Display for StackOverflow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Maximum regex stack depth reached")
    }
}

impl std::error::Error for StackOverflow {}

/// A successful match: the overall range and the per-group captured ranges.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub start: usize,
    pub end: usize,
    pub captures: Vec<CapturedRange>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum MatchRuntimeResult {
    Matched,
    NoMatch,
    StackOverflow,
}

/// Per-loop interpreter bookkeeping.
#[derive(Debug, Copy, Clone, Default)]
struct LoopData {
    /// Completed iterations of the current activation.
    iterations: u32,
    /// Position at the most recent body entry, for empty-iteration cutoff.
    entry_position: u32,
}

/// A restorable point in the match.
#[derive(Debug, Clone)]
struct State {
    /// Position in the input, in code units.
    current: usize,
    /// Offset of the next instruction.
    ip: usize,
    captures: Vec<CapturedRange>,
    loops: Vec<LoopData>,
}

impl State {
    fn new(position: usize, ip: usize, marked_count: u16, loop_count: u16) -> State {
        State {
            current: position,
            ip,
            captures: vec![CapturedRange::not_matched(); marked_count as usize],
            loops: vec![LoopData::default(); loop_count as usize],
        }
    }
}

/// One entry of the backtrack stack. Restore-only records keep unwinding;
/// the others resume execution.
#[derive(Debug, Copy, Clone)]
enum BacktrackInsn {
    /// Restore a capture group and keep unwinding.
    SetCaptureGroup { mexp: u16, range: CapturedRange },
    /// Restore a loop's data and keep unwinding.
    SetLoopData { loop_id: u16, data: LoopData },
    /// Resume at \p ip with the given position.
    SetPosition { ip: u32, position: u32 },
    /// Resume by entering the body of a non-greedy loop whose exit was taken.
    EnterNonGreedyLoop {
        begin_ip: u32,
        position: u32,
        data: LoopData,
    },
    /// Resume after a width-1 loop at a different iteration count. `pos`
    /// walks one code unit per backtrack towards `boundary`.
    Width1Loop {
        ip: u32,
        pos: u32,
        boundary: u32,
        step: i32,
    },
}

struct Context<'a, I: InputIndexer> {
    /// The instruction stream, without the header.
    stream: &'a [u8],
    input: I,
    /// Flags of this match attempt, including position-derived bits.
    flags: MatchFlags,
    syntax: SyntaxFlags,
    /// Remaining interpreter steps.
    budget: u64,
}

/// \return whether \p flags leave \p constraints satisfiable.
fn flags_satisfy(flags: MatchFlags, constraints: MatchConstraintSet) -> bool {
    if constraints & CONSTRAINT_NON_ASCII != 0 && flags.contains(MatchFlags::INPUT_ALL_ASCII) {
        return false;
    }
    if constraints & CONSTRAINT_ANCHORED_AT_START != 0
        && flags.contains(MatchFlags::PREV_CHAR_AVAILABLE)
    {
        return false;
    }
    true
}

impl<'a, I: InputIndexer> Context<'a, I> {
    /// Consume one code unit in the given direction.
    fn consume_unit(&self, s: &mut State, forward: bool) -> Option<u32> {
        if forward {
            if s.current >= self.input.len() {
                return None;
            }
            let u = self.input.unit(s.current);
            s.current += 1;
            Some(u)
        } else {
            if s.current == 0 {
                return None;
            }
            let u = self.input.unit(s.current - 1);
            s.current -= 1;
            Some(u)
        }
    }

    /// Consume one code point in the given direction, decoding surrogate
    /// pairs.
    fn consume_codepoint(&self, s: &mut State, forward: bool) -> Option<u32> {
        if forward {
            if s.current >= self.input.len() {
                return None;
            }
            let (cp, width) = self.input.codepoint_at(s.current);
            s.current += width;
            Some(cp)
        } else {
            if s.current == 0 {
                return None;
            }
            let (cp, width) = self.input.codepoint_before(s.current);
            s.current -= width;
            Some(cp)
        }
    }

    fn canonicalize(&self, cp: u32) -> u32 {
        canonicalize(cp, self.syntax.unicode)
    }

    /// \return whether the bracket instruction at \p ip matches \p cp.
    fn bracket_matches(&self, ip: usize, cp: u32) -> bool {
        let stream = self.stream;
        let negate = stream.u8_at(ip + 1) != 0;
        let positive = stream.u8_at(ip + 2);
        let negative = stream.u8_at(ip + 3);
        let count = stream.u32_at(ip + 4) as usize;
        let mut matched = false;
        for (bit, ranges) in [
            (CLASS_DIGITS, &charclasses::DIGITS[..]),
            (CLASS_SPACES, &charclasses::WHITESPACE[..]),
            (CLASS_WORDS, &charclasses::WORD_CHARS[..]),
        ] {
            if positive & bit != 0 && charclasses::ranges_contain(ranges, cp) {
                matched = true;
            }
            if negative & bit != 0 && !charclasses::ranges_contain(ranges, cp) {
                matched = true;
            }
        }
        if !matched && count > 0 {
            let mut lo = 0usize;
            let mut hi = count;
            while lo < hi {
                let mid = (lo + hi) / 2;
                let first = stream.u32_at(ip + 8 + mid * 8);
                let last = stream.u32_at(ip + 12 + mid * 8);
                if cp < first {
                    hi = mid;
                } else if cp > last {
                    lo = mid + 1;
                } else {
                    matched = true;
                    break;
                }
            }
        }
        matched != negate
    }

    fn bracket_width(&self, ip: usize) -> usize {
        8 + self.stream.u32_at(ip + 4) as usize * 8
    }

    /// \return whether the single width-1 instruction at \p ip matches the
    /// code unit \p unit.
    fn width1_matches(&self, ip: usize, unit: u32) -> bool {
        let stream = self.stream;
        match stream.opcode_at(ip) {
            Opcode::MatchChar8 => unit == stream.u8_at(ip + 1) as u32,
            Opcode::MatchChar16 => unit == stream.u16_at(ip + 1) as u32,
            Opcode::MatchCharICase8 => self.canonicalize(unit) == stream.u8_at(ip + 1) as u32,
            Opcode::MatchCharICase16 => self.canonicalize(unit) == stream.u16_at(ip + 1) as u32,
            Opcode::MatchAny => true,
            Opcode::MatchAnyButNewline => !charclasses::is_line_terminator(unit),
            Opcode::Bracket => self.bracket_matches(ip, unit),
            other => unreachable!("Not a width-1 instruction: {:?}", other),
        }
    }

    fn is_bol(&self, position: usize) -> bool {
        if position == 0 {
            return !self.flags.contains(MatchFlags::NOT_BOL);
        }
        self.syntax.multiline && charclasses::is_line_terminator(self.input.unit(position - 1))
    }

    fn is_eol(&self, position: usize) -> bool {
        if position == self.input.len() {
            return !self.flags.contains(MatchFlags::NOT_EOL);
        }
        self.syntax.multiline && charclasses::is_line_terminator(self.input.unit(position))
    }

    fn is_word_boundary(&self, position: usize) -> bool {
        let before = position > 0 && {
            let (cp, _) = self.input.codepoint_before(position);
            charclasses::is_word_char(cp)
        };
        let after = position < self.input.len() && {
            let (cp, _) = self.input.codepoint_at(position);
            charclasses::is_word_char(cp)
        };
        before != after
    }

    /// Match a backreference to \p range at the current position, in the
    /// given direction.
    fn backref_matches(&self, s: &mut State, range: CapturedRange, forward: bool) -> bool {
        let icase = self.syntax.icase;
        if forward {
            let mut cap = range.start as usize;
            while cap < range.end as usize {
                let (ccp, width) = self.input.codepoint_at(cap);
                cap += width;
                let icp = match self.consume_codepoint(s, true) {
                    None => return false,
                    Some(icp) => icp,
                };
                let equal = if icase {
                    self.canonicalize(ccp) == self.canonicalize(icp)
                } else {
                    ccp == icp
                };
                if !equal {
                    return false;
                }
            }
        } else {
            let mut cap = range.end as usize;
            while cap > range.start as usize {
                let (ccp, width) = self.input.codepoint_before(cap);
                cap -= width;
                let icp = match self.consume_codepoint(s, false) {
                    None => return false,
                    Some(icp) => icp,
                };
                let equal = if icase {
                    self.canonicalize(ccp) == self.canonicalize(icp)
                } else {
                    ccp == icp
                };
                if !equal {
                    return false;
                }
            }
        }
        true
    }
}

/// Push capture-restore records for a loop body's groups, reset those groups,
/// and position the state at the body.
fn enter_loop_body(
    s: &mut State,
    stack: &mut Vec<BacktrackInsn>,
    begin_ip: usize,
    loop_id: u16,
    mexp_begin: u16,
    mexp_end: u16,
) {
    for mexp in mexp_begin..mexp_end {
        stack.push(BacktrackInsn::SetCaptureGroup {
            mexp,
            range: s.captures[mexp as usize],
        });
        s.captures[mexp as usize] = CapturedRange::not_matched();
    }
    stack.push(BacktrackInsn::SetLoopData {
        loop_id,
        data: s.loops[loop_id as usize],
    });
    s.loops[loop_id as usize].entry_position = s.current as u32;
    s.ip = begin_ip + BEGIN_LOOP_WIDTH;
}

/// Decide at a loop boundary whether to run the body, take the exit, or fail.
/// \return false to backtrack.
fn perform_loop<I: InputIndexer>(
    ctx: &Context<I>,
    s: &mut State,
    stack: &mut Vec<BacktrackInsn>,
    begin_ip: usize,
) -> bool {
    let stream = ctx.stream;
    let loop_id = stream.u16_at(begin_ip + 1);
    let min = stream.u32_at(begin_ip + 3);
    let max = stream.u32_at(begin_ip + 7);
    let mexp_begin = stream.u16_at(begin_ip + 11);
    let mexp_end = stream.u16_at(begin_ip + 13);
    let greedy = stream.u8_at(begin_ip + 15) != 0;
    let exit_ip = stream.u32_at(begin_ip + 17) as usize;

    let data = s.loops[loop_id as usize];
    let iteration = data.iterations;
    // ES6 21.2.2.5.1 Note 4: once the minimum is satisfied, an expansion
    // that matched the empty string is not kept. Backtracking reverts any
    // captures it set.
    if iteration > min && data.entry_position as usize == s.current {
        return false;
    }
    let can_enter = iteration < max;
    let can_exit = iteration >= min;
    match (can_enter, can_exit) {
        (true, true) if greedy => {
            stack.push(BacktrackInsn::SetPosition {
                ip: exit_ip as u32,
                position: s.current as u32,
            });
            enter_loop_body(s, stack, begin_ip, loop_id, mexp_begin, mexp_end);
            true
        }
        (true, true) => {
            stack.push(BacktrackInsn::EnterNonGreedyLoop {
                begin_ip: begin_ip as u32,
                position: s.current as u32,
                data,
            });
            s.ip = exit_ip;
            true
        }
        (true, false) => {
            enter_loop_body(s, stack, begin_ip, loop_id, mexp_begin, mexp_end);
            true
        }
        (false, true) => {
            s.ip = exit_ip;
            true
        }
        (false, false) => false,
    }
}

/// Run the interpreter from the state's ip until a Goal is reached or all
/// choice points are exhausted. \p forward gives the direction of travel.
fn run_match<I: InputIndexer>(
    ctx: &mut Context<I>,
    s: &mut State,
    forward: bool,
) -> MatchRuntimeResult {
    let mut stack: Vec<BacktrackInsn> = Vec::new();
    'backtrack: loop {
        'dispatch: loop {
            macro_rules! next_or_bt {
                ($v:expr) => {
                    match $v {
                        Some(v) => v,
                        None => break 'dispatch,
                    }
                };
            }
            if stack.len() > MAX_BACKTRACK_DEPTH {
                return MatchRuntimeResult::StackOverflow;
            }
            match ctx.budget.checked_sub(1) {
                Some(b) => ctx.budget = b,
                None => return MatchRuntimeResult::StackOverflow,
            }
            let stream = ctx.stream;
            let ip = s.ip;
            match stream.opcode_at(ip) {
                Opcode::Goal => return MatchRuntimeResult::Matched,

                Opcode::LeftAnchor => {
                    if !ctx.is_bol(s.current) {
                        break 'dispatch;
                    }
                    s.ip = ip + 1;
                }

                Opcode::RightAnchor => {
                    if !ctx.is_eol(s.current) {
                        break 'dispatch;
                    }
                    s.ip = ip + 1;
                }

                Opcode::MatchAny => {
                    next_or_bt!(ctx.consume_unit(s, forward));
                    s.ip = ip + 1;
                }

                Opcode::U16MatchAny => {
                    next_or_bt!(ctx.consume_codepoint(s, forward));
                    s.ip = ip + 1;
                }

                Opcode::MatchAnyButNewline => {
                    let u = next_or_bt!(ctx.consume_unit(s, forward));
                    if charclasses::is_line_terminator(u) {
                        break 'dispatch;
                    }
                    s.ip = ip + 1;
                }

                Opcode::U16MatchAnyButNewline => {
                    let cp = next_or_bt!(ctx.consume_codepoint(s, forward));
                    if charclasses::is_line_terminator(cp) {
                        break 'dispatch;
                    }
                    s.ip = ip + 1;
                }

                Opcode::MatchChar8 => {
                    let u = next_or_bt!(ctx.consume_unit(s, forward));
                    if u != stream.u8_at(ip + 1) as u32 {
                        break 'dispatch;
                    }
                    s.ip = ip + 2;
                }

                Opcode::MatchChar16 => {
                    let u = next_or_bt!(ctx.consume_unit(s, forward));
                    if u != stream.u16_at(ip + 1) as u32 {
                        break 'dispatch;
                    }
                    s.ip = ip + 3;
                }

                Opcode::U16MatchChar32 => {
                    let cp = next_or_bt!(ctx.consume_codepoint(s, forward));
                    if cp != stream.u32_at(ip + 1) {
                        break 'dispatch;
                    }
                    s.ip = ip + 5;
                }

                Opcode::MatchCharICase8 => {
                    let u = next_or_bt!(ctx.consume_unit(s, forward));
                    if ctx.canonicalize(u) != stream.u8_at(ip + 1) as u32 {
                        break 'dispatch;
                    }
                    s.ip = ip + 2;
                }

                Opcode::MatchCharICase16 => {
                    let u = next_or_bt!(ctx.consume_unit(s, forward));
                    if ctx.canonicalize(u) != stream.u16_at(ip + 1) as u32 {
                        break 'dispatch;
                    }
                    s.ip = ip + 3;
                }

                Opcode::U16MatchCharICase32 => {
                    let cp = next_or_bt!(ctx.consume_codepoint(s, forward));
                    if ctx.canonicalize(cp) != stream.u32_at(ip + 1) {
                        break 'dispatch;
                    }
                    s.ip = ip + 5;
                }

                Opcode::MatchNChar8 | Opcode::MatchNCharICase8 => {
                    let icase = stream.opcode_at(ip) == Opcode::MatchNCharICase8;
                    let count = stream.u8_at(ip + 1) as usize;
                    let mut ok = true;
                    for i in 0..count {
                        let expected = stream.u8_at(ip + 2 + i) as u32;
                        match ctx.consume_unit(s, forward) {
                            Some(u) if icase && ctx.canonicalize(u) == expected => {}
                            Some(u) if !icase && u == expected => {}
                            _ => {
                                ok = false;
                                break;
                            }
                        }
                    }
                    if !ok {
                        break 'dispatch;
                    }
                    s.ip = ip + 2 + count;
                }

                Opcode::Alternation => {
                    let primary = stream.u8_at(ip + 1);
                    let secondary = stream.u8_at(ip + 2);
                    let secondary_ip = stream.u32_at(ip + 3);
                    let primary_viable = flags_satisfy(ctx.flags, primary);
                    let secondary_viable = flags_satisfy(ctx.flags, secondary);
                    if primary_viable {
                        if secondary_viable {
                            stack.push(BacktrackInsn::SetPosition {
                                ip: secondary_ip,
                                position: s.current as u32,
                            });
                        }
                        s.ip = ip + ALTERNATION_WIDTH;
                    } else if secondary_viable {
                        s.ip = secondary_ip as usize;
                    } else {
                        break 'dispatch;
                    }
                }

                Opcode::Jump32 => s.ip = stream.u32_at(ip + 1) as usize,

                Opcode::Bracket => {
                    let u = next_or_bt!(ctx.consume_unit(s, forward));
                    if !ctx.bracket_matches(ip, u) {
                        break 'dispatch;
                    }
                    s.ip = ip + ctx.bracket_width(ip);
                }

                Opcode::U16Bracket => {
                    let cp = next_or_bt!(ctx.consume_codepoint(s, forward));
                    if !ctx.bracket_matches(ip, cp) {
                        break 'dispatch;
                    }
                    s.ip = ip + ctx.bracket_width(ip);
                }

                Opcode::WordBoundary => {
                    let invert = stream.u8_at(ip + 1) != 0;
                    if ctx.is_word_boundary(s.current) == invert {
                        break 'dispatch;
                    }
                    s.ip = ip + 2;
                }

                Opcode::BeginMarkedSubexpression => {
                    let mexp = stream.u16_at(ip + 1);
                    stack.push(BacktrackInsn::SetCaptureGroup {
                        mexp,
                        range: s.captures[mexp as usize],
                    });
                    // Travelling backwards, the begin instruction reaches the
                    // right edge of the group first.
                    if forward {
                        s.captures[mexp as usize].start = s.current as u32;
                    } else {
                        s.captures[mexp as usize].end = s.current as u32;
                    }
                    s.ip = ip + 3;
                }

                Opcode::EndMarkedSubexpression => {
                    let mexp = stream.u16_at(ip + 1);
                    if forward {
                        s.captures[mexp as usize].end = s.current as u32;
                    } else {
                        s.captures[mexp as usize].start = s.current as u32;
                    }
                    s.ip = ip + 3;
                }

                Opcode::BackRef => {
                    let mexp = stream.u16_at(ip + 1);
                    let range = s.captures[mexp as usize];
                    // A reference to an unmatched group trivially succeeds.
                    if range.matched() && !ctx.backref_matches(s, range, forward) {
                        break 'dispatch;
                    }
                    s.ip = ip + 3;
                }

                Opcode::Lookaround => {
                    let invert = stream.u8_at(ip + 1) != 0;
                    let assert_forward = stream.u8_at(ip + 2) != 0;
                    let constraints = stream.u8_at(ip + 3);
                    let mexp_begin = stream.u16_at(ip + 4);
                    let mexp_end = stream.u16_at(ip + 6);
                    let continuation = stream.u32_at(ip + 8) as usize;
                    let mut matched = false;
                    if flags_satisfy(ctx.flags, constraints) {
                        let mut sub = s.clone();
                        sub.ip = ip + LOOKAROUND_WIDTH;
                        matched = match run_match(ctx, &mut sub, assert_forward) {
                            MatchRuntimeResult::StackOverflow => {
                                return MatchRuntimeResult::StackOverflow
                            }
                            MatchRuntimeResult::Matched => true,
                            MatchRuntimeResult::NoMatch => false,
                        };
                        // Captures set inside a satisfied positive assertion
                        // survive, with restore records so later backtracking
                        // reverts them. We never backtrack INTO the assertion:
                        // once it matches, it forgets all other ways it could
                        // have matched (ES 5.1 15.10.2.8 Note 2). Otherwise
                        // the sub-state is discarded along with its captures.
                        if matched && !invert {
                            for mexp in mexp_begin..mexp_end {
                                let idx = mexp as usize;
                                stack.push(BacktrackInsn::SetCaptureGroup {
                                    mexp,
                                    range: s.captures[idx],
                                });
                                s.captures[idx] = sub.captures[idx];
                            }
                        }
                    }
                    if matched == invert {
                        break 'dispatch;
                    }
                    // The cursor never moves.
                    s.ip = continuation;
                }

                Opcode::BeginLoop => {
                    let loop_id = stream.u16_at(ip + 1);
                    let min = stream.u32_at(ip + 3);
                    let loopee = stream.u8_at(ip + 16);
                    if !flags_satisfy(ctx.flags, loopee) {
                        if min > 0 {
                            break 'dispatch;
                        }
                        s.ip = stream.u32_at(ip + 17) as usize;
                        continue 'dispatch;
                    }
                    s.loops[loop_id as usize].iterations = 0;
                    if !perform_loop(ctx, s, &mut stack, ip) {
                        break 'dispatch;
                    }
                }

                Opcode::EndLoop => {
                    let begin_ip = stream.u32_at(ip + 1) as usize;
                    let loop_id = stream.u16_at(begin_ip + 1);
                    s.loops[loop_id as usize].iterations += 1;
                    if !perform_loop(ctx, s, &mut stack, begin_ip) {
                        break 'dispatch;
                    }
                }

                Opcode::BeginSimpleLoop => {
                    let loopee = stream.u8_at(ip + 1);
                    let exit_ip = stream.u32_at(ip + 2);
                    if !flags_satisfy(ctx.flags, loopee) {
                        s.ip = exit_ip as usize;
                        continue 'dispatch;
                    }
                    stack.push(BacktrackInsn::SetPosition {
                        ip: exit_ip,
                        position: s.current as u32,
                    });
                    s.ip = ip + BEGIN_SIMPLE_LOOP_WIDTH;
                }

                Opcode::EndSimpleLoop => {
                    let body_ip = stream.u32_at(ip + 1) as usize;
                    stack.push(BacktrackInsn::SetPosition {
                        ip: (ip + END_SIMPLE_LOOP_WIDTH) as u32,
                        position: s.current as u32,
                    });
                    s.ip = body_ip;
                }

                Opcode::Width1Loop => {
                    let greedy = stream.u8_at(ip + 3) != 0;
                    let min = stream.u32_at(ip + 4) as u64;
                    let max = stream.u32_at(ip + 8) as u64;
                    let exit_ip = stream.u32_at(ip + 12);
                    let body_ip = ip + WIDTH1_LOOP_WIDTH;
                    let available = if forward {
                        ctx.input.len() - s.current
                    } else {
                        s.current
                    } as u64;
                    let limit = max.min(available);
                    let mut matched: u64 = 0;
                    while matched < limit {
                        let pos = if forward {
                            s.current + matched as usize
                        } else {
                            s.current - matched as usize - 1
                        };
                        if !ctx.width1_matches(body_ip, ctx.input.unit(pos)) {
                            break;
                        }
                        matched += 1;
                    }
                    ctx.budget = ctx.budget.saturating_sub(matched);
                    if matched < min {
                        break 'dispatch;
                    }
                    let base = s.current as u64;
                    let at = |count: u64| {
                        if forward {
                            base + count
                        } else {
                            base - count
                        }
                    };
                    let (taken, boundary, step) = if greedy {
                        (matched, min, if forward { -1 } else { 1 })
                    } else {
                        (min, matched, if forward { 1 } else { -1 })
                    };
                    if matched > min {
                        stack.push(BacktrackInsn::Width1Loop {
                            ip: exit_ip,
                            pos: at(taken) as u32,
                            boundary: at(boundary) as u32,
                            step,
                        });
                    }
                    s.current = at(taken) as usize;
                    s.ip = exit_ip as usize;
                }
            }
        }

        // Unwind the backtrack stack until a record resumes execution.
        loop {
            let top = match stack.last() {
                None => return MatchRuntimeResult::NoMatch,
                Some(top) => *top,
            };
            match top {
                BacktrackInsn::SetCaptureGroup { mexp, range } => {
                    s.captures[mexp as usize] = range;
                    stack.pop();
                }
                BacktrackInsn::SetLoopData { loop_id, data } => {
                    s.loops[loop_id as usize] = data;
                    stack.pop();
                }
                BacktrackInsn::SetPosition { ip, position } => {
                    s.ip = ip as usize;
                    s.current = position as usize;
                    stack.pop();
                    continue 'backtrack;
                }
                BacktrackInsn::EnterNonGreedyLoop {
                    begin_ip,
                    position,
                    data,
                } => {
                    stack.pop();
                    let begin_ip = begin_ip as usize;
                    let loop_id = ctx.stream.u16_at(begin_ip + 1);
                    let mexp_begin = ctx.stream.u16_at(begin_ip + 11);
                    let mexp_end = ctx.stream.u16_at(begin_ip + 13);
                    s.current = position as usize;
                    s.loops[loop_id as usize] = data;
                    enter_loop_body(s, &mut stack, begin_ip, loop_id, mexp_begin, mexp_end);
                    continue 'backtrack;
                }
                BacktrackInsn::Width1Loop {
                    ip,
                    pos,
                    boundary,
                    step,
                } => {
                    if pos == boundary {
                        stack.pop();
                        continue;
                    }
                    let moved = (pos as i64 + step as i64) as u32;
                    if let Some(BacktrackInsn::Width1Loop { pos, .. }) = stack.last_mut() {
                        *pos = moved;
                    }
                    s.current = moved as usize;
                    s.ip = ip as usize;
                    continue 'backtrack;
                }
            }
        }
    }
}

/// \return the code unit which any match must start with, if the stream
/// begins with a case-sensitive character match. Used to skip ahead.
fn acceleration_unit(stream: &[u8]) -> Option<u32> {
    match stream.opcode_at(0) {
        Opcode::MatchChar8 => Some(stream.u8_at(1) as u32),
        Opcode::MatchChar16 => Some(stream.u16_at(1) as u32),
        Opcode::MatchNChar8 => Some(stream.u8_at(2) as u32),
        _ => None,
    }
}

/// Search \p input for a match of \p bytecode at or after \p start.
///
/// Match attempts proceed left to right; the leftmost match wins. Patterns
/// whose constraints cannot be satisfied are rejected without running the
/// interpreter.
pub fn search_with_bytecode<I: InputIndexer>(
    bytecode: &[u8],
    input: I,
    start: usize,
    match_flags: MatchFlags,
) -> Result<Option<SearchResult>, StackOverflow> {
    search_with_budget(bytecode, input, start, match_flags, BACKTRACK_BUDGET)
}

fn search_with_budget<I: InputIndexer>(
    bytecode: &[u8],
    input: I,
    start: usize,
    match_flags: MatchFlags,
    mut budget: u64,
) -> Result<Option<SearchResult>, StackOverflow> {
    let (header, stream) = BytecodeHeader::deserialize(bytecode);
    let syntax = header.flags();
    let only_at_start = match_flags.contains(MatchFlags::ONLY_AT_START);
    let accel = if only_at_start {
        None
    } else {
        acceleration_unit(stream)
    };
    // The step budget bounds the whole search, not each attempt.
    let mut pos = start;
    loop {
        if pos > input.len() {
            return Ok(None);
        }
        let mut flags = match_flags;
        if pos > 0 {
            flags = flags | MatchFlags::PREV_CHAR_AVAILABLE;
        }
        // Constraint failures are permanent: later positions only add the
        // previous-char bit.
        if !flags_satisfy(flags, header.constraints) {
            return Ok(None);
        }
        if let Some(unit) = accel {
            pos = match input.find_unit(pos, unit) {
                None => return Ok(None),
                Some(found) => found,
            };
            if pos > 0 {
                flags = flags | MatchFlags::PREV_CHAR_AVAILABLE;
            }
        }
        let mut ctx = Context {
            stream,
            input,
            flags,
            syntax,
            budget,
        };
        let mut state = State::new(pos, 0, header.marked_count, header.loop_count);
        let result = run_match(&mut ctx, &mut state, true);
        budget = ctx.budget;
        match result {
            MatchRuntimeResult::Matched => {
                return Ok(Some(SearchResult {
                    start: pos,
                    end: state.current,
                    captures: state.captures,
                }));
            }
            MatchRuntimeResult::StackOverflow => return Err(StackOverflow),
            MatchRuntimeResult::NoMatch => {
                if only_at_start {
                    return Ok(None);
                }
                // Advance by a full code point in unicode mode so attempts
                // stay on code point boundaries.
                let width = if syntax.unicode && pos < input.len() {
                    input.codepoint_at(pos).1
                } else {
                    1
                };
                pos += width;
            }
        }
    }
}
