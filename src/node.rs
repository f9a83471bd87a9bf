//! The pattern syntax tree and its translation to bytecode.
//!
//! Nodes are owned by an arena (`NodeArena`); tree structure is expressed as
//! lists of arena ids (`NodeList`). Tree walks that follow user-controlled
//! nesting (optimization, reversal, emission) use explicit work stacks rather
//! than native recursion so that adversarial patterns cannot exhaust the call
//! stack.

use crate::bytecode::{BytecodeHeader, BytecodeStream, JumpHandle, Opcode};
use crate::canonical;
use crate::types::{
    BracketContents, CharClassType, LoopID, MatchConstraintSet, SyntaxFlags,
    CONSTRAINT_ANCHORED_AT_START, CONSTRAINT_NON_ASCII, CONSTRAINT_NON_EMPTY,
};

pub type NodeId = u32;
pub type NodeList = Vec<NodeId>;

/// Minimum run length for batched MatchNChar8 emission; shorter runs emit
/// scalar char instructions.
const MIN_CHAR_RUN: usize = 3;

/// Maximum chars per batched instruction (the count field is a u8).
const MAX_CHAR_RUN: usize = 255;

/// Class membership bits as encoded in bracket instructions.
pub const CLASS_DIGITS: u8 = 1 << 0;
pub const CLASS_SPACES: u8 = 1 << 1;
pub const CLASS_WORDS: u8 = 1 << 2;

pub fn class_bit(kind: CharClassType) -> u8 {
    match kind {
        CharClassType::Digits => CLASS_DIGITS,
        CharClassType::Spaces => CLASS_SPACES,
        CharClassType::Words => CLASS_WORDS,
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    /// Successful match endpoint. Appears exactly once, last in the
    /// top-level list.
    Goal,

    /// `^`. Anchors at start of input, or after a line terminator when
    /// multiline.
    LeftAnchor { multiline: bool },

    /// `$`.
    RightAnchor,

    /// `.` and its dotAll/unicode variants.
    MatchAny { dot_all: bool, unicode: bool },

    /// A run of code points matched in sequence. The parser pushes single
    /// code points; the optimizer coalesces adjacent runs. Chars are already
    /// canonicalized when `icase` is set.
    MatchChar {
        chars: Vec<u32>,
        icase: bool,
        unicode: bool,
    },

    /// A bracket expression.
    Bracket {
        contents: BracketContents,
        icase: bool,
        unicode: bool,
    },

    /// A quantified subexpression.
    Loop {
        loop_id: LoopID,
        min: u32,
        max: u32,
        greedy: bool,
        mexp_begin: u16,
        mexp_end: u16,
        body: NodeList,
    },

    /// An N-ary alternation. Alternative order is match priority.
    Alternation { alternatives: Vec<NodeList> },

    /// A capture group.
    MarkedSubexpression { mexp: u16, body: NodeList },

    /// A backreference to a capture group, 1-based.
    BackRef { mexp: u16 },

    /// `\b` or `\B`.
    WordBoundary { invert: bool },

    /// A lookaround assertion.
    Lookaround {
        invert: bool,
        forwards: bool,
        mexp_begin: u16,
        mexp_end: u16,
        body: NodeList,
    },
}

/// Arena owning all nodes of one pattern.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }
}

/// \return whether a bracket could match an ASCII character. Conservative in
/// the direction of claiming ASCII is possible.
fn bracket_can_match_ascii(contents: &BracketContents) -> bool {
    if contents.negate || !contents.classes.is_empty() {
        return true;
    }
    contents.cps.ranges().iter().any(|r| r.first < 128)
}

/// Compute the match constraints of a single node.
/// Constraint computation is recursive; depth is bounded by the parse-time
/// nesting limits.
fn constraints_of_node(arena: &NodeArena, id: NodeId) -> MatchConstraintSet {
    match arena.get(id) {
        Node::Goal | Node::RightAnchor | Node::WordBoundary { .. } | Node::BackRef { .. } => 0,
        Node::LeftAnchor { multiline } => {
            if *multiline {
                0
            } else {
                CONSTRAINT_ANCHORED_AT_START
            }
        }
        Node::MatchAny { .. } => CONSTRAINT_NON_EMPTY,
        Node::MatchChar { chars, .. } => {
            let mut result = CONSTRAINT_NON_EMPTY;
            if chars.iter().any(|&c| c >= 128) {
                result |= CONSTRAINT_NON_ASCII;
            }
            result
        }
        Node::Bracket { contents, .. } => {
            let mut result = CONSTRAINT_NON_EMPTY;
            if !bracket_can_match_ascii(contents) {
                result |= CONSTRAINT_NON_ASCII;
            }
            result
        }
        Node::Loop { min, body, .. } => {
            if *min > 0 {
                constraints_of_list(arena, body)
            } else {
                0
            }
        }
        Node::Alternation { alternatives } => {
            // A constraint holds for the alternation only if it holds for
            // every alternative.
            let mut result = !0;
            for alt in alternatives {
                result &= constraints_of_list(arena, alt);
            }
            result
        }
        Node::MarkedSubexpression { body, .. } => constraints_of_list(arena, body),
        Node::Lookaround {
            invert,
            forwards,
            body,
            ..
        } => {
            // A satisfied positive assertion propagates its requirements,
            // except it consumes nothing.
            if *invert {
                0
            } else {
                lookaround_body_constraints(arena, body, *forwards) & !CONSTRAINT_NON_EMPTY
            }
        }
    }
}

/// Compute the match constraints of a concatenated list.
pub fn constraints_of_list(arena: &NodeArena, list: &[NodeId]) -> MatchConstraintSet {
    list.iter()
        .fold(0, |acc, &id| acc | constraints_of_node(arena, id))
}

/// Constraints of a lookaround body, as carried by its instruction.
/// A lookbehind like `(?<=^abc)def` can reach the start of input from a later
/// position, so anchoring does not constrain backwards assertions.
fn lookaround_body_constraints(
    arena: &NodeArena,
    body: &[NodeId],
    forwards: bool,
) -> MatchConstraintSet {
    let mut result = constraints_of_list(arena, body);
    if !forwards {
        result &= !CONSTRAINT_ANCHORED_AT_START;
    }
    result
}

/// Reverse a subtree in place for backwards (lookbehind) execution. Does not
/// descend into nested lookaround bodies: each lookaround's direction is
/// absolute, so its body is reversed only by its own classification.
fn reverse_node_list(arena: &mut NodeArena, list: &mut NodeList) {
    let mut worklist: Vec<NodeList> = Vec::new();
    list.reverse();
    let mut pending: Vec<NodeId> = list.clone();
    while let Some(id) = pending.pop() {
        let mut taken: Vec<NodeList> = Vec::new();
        match arena.get_mut(id) {
            Node::MatchChar { chars, .. } => chars.reverse(),
            Node::Loop { body, .. } | Node::MarkedSubexpression { body, .. } => {
                taken.push(std::mem::take(body));
            }
            Node::Alternation { alternatives } => {
                for alt in alternatives.iter_mut() {
                    taken.push(std::mem::take(alt));
                }
            }
            _ => {}
        }
        for mut sublist in taken {
            sublist.reverse();
            pending.extend_from_slice(&sublist);
            worklist.push(sublist);
        }
        // Put the reversed sublists back where they came from.
        match arena.get_mut(id) {
            Node::Loop { body, .. } | Node::MarkedSubexpression { body, .. } => {
                *body = worklist.pop().unwrap_or_default();
            }
            Node::Alternation { alternatives } => {
                for alt in alternatives.iter_mut().rev() {
                    *alt = worklist.pop().unwrap_or_default();
                }
            }
            _ => {}
        }
    }
    debug_assert!(worklist.is_empty(), "Unrestored sublists");
}

/// Coalesce adjacent MatchChar nodes with matching case sensitivity into a
/// single run, rewriting \p list in place.
fn coalesce_chars(arena: &mut NodeArena, list: &mut NodeList) {
    let mut result: NodeList = Vec::with_capacity(list.len());
    for &id in list.iter() {
        let merged = (|| {
            let &last = result.last()?;
            // Both the previous and current node must be char runs with the
            // same case sensitivity.
            let (chars, icase) = match arena.get(id) {
                Node::MatchChar { chars, icase, .. } => (chars.clone(), *icase),
                _ => return None,
            };
            match arena.get_mut(last) {
                Node::MatchChar {
                    chars: prev_chars,
                    icase: prev_icase,
                    ..
                } if *prev_icase == icase => {
                    prev_chars.extend_from_slice(&chars);
                    Some(())
                }
                _ => None,
            }
        })();
        if merged.is_none() {
            result.push(id);
        }
    }
    *list = result;
}

/// Optimize the tree rooted at \p root: reverse lookbehind bodies and
/// coalesce character runs. Iterative via an explicit work stack.
pub fn optimize_node_list(arena: &mut NodeArena, root: &mut NodeList) {
    coalesce_chars(arena, root);
    let mut worklist: Vec<NodeId> = root.clone();
    while let Some(id) = worklist.pop() {
        // Take child lists out, process them, and put them back.
        let mut sublists: Vec<NodeList> = Vec::new();
        let mut reverse_first = false;
        match arena.get_mut(id) {
            Node::Loop { body, .. } | Node::MarkedSubexpression { body, .. } => {
                sublists.push(std::mem::take(body));
            }
            Node::Lookaround { body, forwards, .. } => {
                reverse_first = !*forwards;
                sublists.push(std::mem::take(body));
            }
            Node::Alternation { alternatives } => {
                for alt in alternatives.iter_mut() {
                    sublists.push(std::mem::take(alt));
                }
            }
            _ => {}
        }
        for sublist in sublists.iter_mut() {
            if reverse_first {
                reverse_node_list(arena, sublist);
            }
            coalesce_chars(arena, sublist);
            worklist.extend_from_slice(sublist);
        }
        match arena.get_mut(id) {
            Node::Loop { body, .. }
            | Node::MarkedSubexpression { body, .. }
            | Node::Lookaround { body, .. } => {
                *body = sublists.pop().unwrap_or_default();
            }
            Node::Alternation { alternatives } => {
                for (alt, sublist) in alternatives.iter_mut().zip(sublists) {
                    *alt = sublist;
                }
            }
            _ => {}
        }
    }
}

/// Classification of a loop for instruction selection.
enum LoopForm {
    /// Body always matches exactly one input unit and has no captures.
    Width1,
    /// Greedy, min 0, unbounded, capture-free, non-empty body.
    Simple,
    General,
}

/// \return whether a single node always consumes exactly one input unit on
/// success, so that its loop may use the width-1 scanning instruction.
fn node_is_width1(node: &Node) -> bool {
    match node {
        Node::MatchChar { chars, unicode, .. } => {
            chars.len() == 1 && (!unicode || chars[0] < 0x10000)
        }
        Node::MatchAny { unicode, .. } => !unicode,
        Node::Bracket { unicode, .. } => !unicode,
        _ => false,
    }
}

fn classify_loop(arena: &NodeArena, node: &Node) -> LoopForm {
    if let Node::Loop {
        min,
        max,
        greedy,
        mexp_begin,
        mexp_end,
        body,
        ..
    } = node
    {
        if mexp_begin == mexp_end {
            if body.len() == 1 && node_is_width1(arena.get(body[0])) {
                return LoopForm::Width1;
            }
            let loopee = constraints_of_list(arena, body);
            if *greedy && *min == 0 && *max == u32::MAX && loopee & CONSTRAINT_NON_EMPTY != 0 {
                return LoopForm::Simple;
            }
        }
    }
    LoopForm::General
}

/// Emit a char run as batched or scalar instructions, canonicalized variants
/// when case-insensitive.
fn emit_char_run(bs: &mut BytecodeStream, chars: &[u32], icase: bool) {
    let mut i = 0;
    while i < chars.len() {
        // Maximal run of chars that fit in a byte.
        let mut j = i;
        while j < chars.len() && chars[j] <= 0xFF {
            j += 1;
        }
        if j - i >= MIN_CHAR_RUN {
            for chunk in chars[i..j].chunks(MAX_CHAR_RUN) {
                bs.emit_opcode(if icase {
                    Opcode::MatchNCharICase8
                } else {
                    Opcode::MatchNChar8
                });
                bs.emit_u8(chunk.len() as u8);
                for &c in chunk {
                    bs.emit_u8(c as u8);
                }
            }
            i = j;
        } else {
            let c = chars[i];
            if c <= 0xFF {
                bs.emit_opcode(if icase {
                    Opcode::MatchCharICase8
                } else {
                    Opcode::MatchChar8
                });
                bs.emit_u8(c as u8);
            } else if c <= 0xFFFF {
                bs.emit_opcode(if icase {
                    Opcode::MatchCharICase16
                } else {
                    Opcode::MatchChar16
                });
                bs.emit_u16(c as u16);
            } else {
                bs.emit_opcode(if icase {
                    Opcode::U16MatchCharICase32
                } else {
                    Opcode::U16MatchChar32
                });
                bs.emit_u32(c);
            }
            i += 1;
        }
    }
}

fn emit_bracket(bs: &mut BytecodeStream, contents: &BracketContents, icase: bool, unicode: bool) {
    // Case-insensitive brackets expand to their full equivalence class here,
    // once, rather than canonicalizing each input char at match time.
    let cps = if icase {
        canonical::make_canonically_equivalent(&contents.cps, unicode)
    } else {
        contents.cps.clone()
    };
    let mut positive = 0u8;
    let mut negative = 0u8;
    for class in &contents.classes {
        if class.inverted {
            negative |= class_bit(class.kind);
        } else {
            positive |= class_bit(class.kind);
        }
    }
    bs.emit_opcode(if unicode {
        Opcode::U16Bracket
    } else {
        Opcode::Bracket
    });
    bs.emit_u8(contents.negate as u8);
    bs.emit_u8(positive);
    bs.emit_u8(negative);
    let ranges = cps.ranges();
    bs.emit_u32(ranges.len() as u32);
    for range in ranges {
        bs.emit_u32(range.first);
        bs.emit_u32(range.last());
    }
}

/// Pending work for the iterative emitter. List frames walk node lists;
/// Finish frames run once a node's children have been fully emitted.
enum Frame {
    List {
        list: NodeList,
        idx: usize,
    },
    FinishMarked {
        mexp: u16,
    },
    FinishLoop {
        begin_offset: u32,
        not_taken: JumpHandle,
    },
    FinishSimpleLoop {
        body_start: u32,
        not_taken: JumpHandle,
    },
    FinishWidth1 {
        not_taken: JumpHandle,
    },
    FinishLookaround {
        continuation: JumpHandle,
    },
    Alternation {
        alternatives: Vec<NodeList>,
        idx: usize,
        rest_constraints: Vec<MatchConstraintSet>,
        exit_jumps: Vec<JumpHandle>,
        pending_secondary: Option<JumpHandle>,
    },
}

/// Emit the instruction stream for the tree rooted at \p root.
fn emit_list(arena: &NodeArena, root: &[NodeId], bs: &mut BytecodeStream) {
    let mut stack: Vec<Frame> = vec![Frame::List {
        list: root.to_vec(),
        idx: 0,
    }];
    while let Some(top) = stack.last_mut() {
        match top {
            Frame::List { list, idx } => {
                if *idx >= list.len() {
                    stack.pop();
                    continue;
                }
                let id = list[*idx];
                *idx += 1;
                emit_node(arena, id, bs, &mut stack);
            }
            Frame::FinishMarked { mexp } => {
                let mexp = *mexp;
                stack.pop();
                bs.emit_opcode(Opcode::EndMarkedSubexpression);
                bs.emit_u16(mexp);
            }
            Frame::FinishLoop {
                begin_offset,
                not_taken,
            } => {
                let (begin_offset, not_taken) = (*begin_offset, *not_taken);
                stack.pop();
                bs.emit_opcode(Opcode::EndLoop);
                bs.emit_u32(begin_offset);
                bs.patch_to_here(not_taken);
            }
            Frame::FinishSimpleLoop {
                body_start,
                not_taken,
            } => {
                let (body_start, not_taken) = (*body_start, *not_taken);
                stack.pop();
                bs.emit_opcode(Opcode::EndSimpleLoop);
                bs.emit_u32(body_start);
                bs.patch_to_here(not_taken);
            }
            Frame::FinishWidth1 { not_taken } => {
                let not_taken = *not_taken;
                stack.pop();
                bs.patch_to_here(not_taken);
            }
            Frame::FinishLookaround { continuation } => {
                let continuation = *continuation;
                stack.pop();
                bs.emit_opcode(Opcode::Goal);
                bs.patch_to_here(continuation);
            }
            Frame::Alternation {
                alternatives,
                idx,
                rest_constraints,
                exit_jumps,
                pending_secondary,
            } => {
                let i = *idx;
                if i >= alternatives.len() {
                    let jumps = std::mem::take(exit_jumps);
                    stack.pop();
                    for jump in jumps {
                        bs.patch_to_here(jump);
                    }
                    continue;
                }
                *idx += 1;
                if i > 0 {
                    // The previous branch jumps over the rest of the chain,
                    // and the previous alternation lands here.
                    bs.emit_opcode(Opcode::Jump32);
                    exit_jumps.push(bs.emit_patchable_u32());
                    let secondary = pending_secondary
                        .take()
                        .unwrap_or_else(|| unreachable!("Missing secondary patch"));
                    bs.patch_to_here(secondary);
                }
                let body = alternatives[i].clone();
                if i + 1 < alternatives.len() {
                    bs.emit_opcode(Opcode::Alternation);
                    bs.emit_u8(constraints_of_list(arena, &body));
                    bs.emit_u8(rest_constraints[i + 1]);
                    *pending_secondary = Some(bs.emit_patchable_u32());
                }
                stack.push(Frame::List { list: body, idx: 0 });
            }
        }
    }
}

fn emit_node(arena: &NodeArena, id: NodeId, bs: &mut BytecodeStream, stack: &mut Vec<Frame>) {
    match arena.get(id) {
        Node::Goal => bs.emit_opcode(Opcode::Goal),
        Node::LeftAnchor { .. } => bs.emit_opcode(Opcode::LeftAnchor),
        Node::RightAnchor => bs.emit_opcode(Opcode::RightAnchor),
        Node::MatchAny { dot_all, unicode } => {
            let op = match (*dot_all, *unicode) {
                (true, true) => Opcode::U16MatchAny,
                (true, false) => Opcode::MatchAny,
                (false, true) => Opcode::U16MatchAnyButNewline,
                (false, false) => Opcode::MatchAnyButNewline,
            };
            bs.emit_opcode(op);
        }
        Node::MatchChar { chars, icase, .. } => emit_char_run(bs, chars, *icase),
        Node::Bracket {
            contents,
            icase,
            unicode,
        } => emit_bracket(bs, contents, *icase, *unicode),
        Node::WordBoundary { invert } => {
            bs.emit_opcode(Opcode::WordBoundary);
            bs.emit_u8(*invert as u8);
        }
        Node::BackRef { mexp } => {
            debug_assert!(*mexp >= 1, "Backreference must be 1-based");
            bs.emit_opcode(Opcode::BackRef);
            bs.emit_u16(*mexp - 1);
        }
        Node::MarkedSubexpression { mexp, body } => {
            bs.emit_opcode(Opcode::BeginMarkedSubexpression);
            bs.emit_u16(*mexp);
            stack.push(Frame::FinishMarked { mexp: *mexp });
            stack.push(Frame::List {
                list: body.clone(),
                idx: 0,
            });
        }
        node @ Node::Loop { .. } => {
            let (loop_id, min, max, greedy, mexp_begin, mexp_end, body) = match node {
                Node::Loop {
                    loop_id,
                    min,
                    max,
                    greedy,
                    mexp_begin,
                    mexp_end,
                    body,
                } => (*loop_id, *min, *max, *greedy, *mexp_begin, *mexp_end, body),
                _ => unreachable!(),
            };
            match classify_loop(arena, node) {
                LoopForm::Width1 => {
                    bs.emit_opcode(Opcode::Width1Loop);
                    bs.emit_u16(loop_id);
                    bs.emit_u8(greedy as u8);
                    bs.emit_u32(min);
                    bs.emit_u32(max);
                    let not_taken = bs.emit_patchable_u32();
                    stack.push(Frame::FinishWidth1 { not_taken });
                    stack.push(Frame::List {
                        list: body.clone(),
                        idx: 0,
                    });
                }
                LoopForm::Simple => {
                    bs.emit_opcode(Opcode::BeginSimpleLoop);
                    bs.emit_u8(constraints_of_list(arena, body));
                    let not_taken = bs.emit_patchable_u32();
                    let body_start = bs.current_offset();
                    stack.push(Frame::FinishSimpleLoop {
                        body_start,
                        not_taken,
                    });
                    stack.push(Frame::List {
                        list: body.clone(),
                        idx: 0,
                    });
                }
                LoopForm::General => {
                    let begin_offset = bs.current_offset();
                    bs.emit_opcode(Opcode::BeginLoop);
                    bs.emit_u16(loop_id);
                    bs.emit_u32(min);
                    bs.emit_u32(max);
                    bs.emit_u16(mexp_begin);
                    bs.emit_u16(mexp_end);
                    bs.emit_u8(greedy as u8);
                    bs.emit_u8(constraints_of_list(arena, body));
                    let not_taken = bs.emit_patchable_u32();
                    stack.push(Frame::FinishLoop {
                        begin_offset,
                        not_taken,
                    });
                    stack.push(Frame::List {
                        list: body.clone(),
                        idx: 0,
                    });
                }
            }
        }
        Node::Alternation { alternatives } => {
            // Precompute "constraints of everything from alternative i on",
            // right to left, so the executor can prune without re-deriving.
            let n = alternatives.len();
            let mut rest = vec![0 as MatchConstraintSet; n];
            let mut acc = !0 as MatchConstraintSet;
            for i in (0..n).rev() {
                acc &= constraints_of_list(arena, &alternatives[i]);
                rest[i] = acc;
            }
            stack.push(Frame::Alternation {
                alternatives: alternatives.clone(),
                idx: 0,
                rest_constraints: rest,
                exit_jumps: Vec::new(),
                pending_secondary: None,
            });
        }
        Node::Lookaround {
            invert,
            forwards,
            mexp_begin,
            mexp_end,
            body,
        } => {
            bs.emit_opcode(Opcode::Lookaround);
            bs.emit_u8(*invert as u8);
            bs.emit_u8(*forwards as u8);
            bs.emit_u8(lookaround_body_constraints(arena, body, *forwards));
            bs.emit_u16(*mexp_begin);
            bs.emit_u16(*mexp_end);
            let continuation = bs.emit_patchable_u32();
            stack.push(Frame::FinishLookaround { continuation });
            stack.push(Frame::List {
                list: body.clone(),
                idx: 0,
            });
        }
    }
}

/// Compile an optimized tree to a finished bytecode buffer.
pub fn compile(
    arena: &NodeArena,
    root: &[NodeId],
    flags: SyntaxFlags,
    marked_count: u16,
    loop_count: u16,
) -> Vec<u8> {
    let mut bs = BytecodeStream::new();
    emit_list(arena, root, &mut bs);
    bs.seal(BytecodeHeader {
        marked_count,
        loop_count,
        syntax_flags: flags.to_byte(),
        constraints: constraints_of_list(arena, root),
    })
}
