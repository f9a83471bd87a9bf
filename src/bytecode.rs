//! The compiled bytecode format: a fixed header followed by a packed,
//! byte-aligned stream of opcode-tagged instructions.
//!
//! Every multi-byte field is little-endian. Jump and offset fields are byte
//! offsets relative to the start of the instruction stream (immediately after
//! the header). The buffer contains no pointers and is stable across
//! processes, so it may be cached or serialized by the embedder.

use crate::types::{MatchConstraintSet, SyntaxFlags};

/// Size in bytes of the serialized header.
pub const HEADER_SIZE: usize = 6;

/// The header preceding the instruction stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BytecodeHeader {
    /// Number of capture groups.
    pub marked_count: u16,
    /// Number of loops.
    pub loop_count: u16,
    /// Serialized SyntaxFlags.
    pub syntax_flags: u8,
    /// Match constraints of the whole pattern.
    pub constraints: MatchConstraintSet,
}

impl BytecodeHeader {
    pub fn serialize(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.marked_count.to_le_bytes());
        out.extend_from_slice(&self.loop_count.to_le_bytes());
        out.push(self.syntax_flags);
        out.push(self.constraints);
    }

    /// Split a full bytecode buffer into its header and instruction stream.
    pub fn deserialize(bytecode: &[u8]) -> (BytecodeHeader, &[u8]) {
        debug_assert!(bytecode.len() >= HEADER_SIZE, "Bytecode too small");
        let header = BytecodeHeader {
            marked_count: u16::from_le_bytes([bytecode[0], bytecode[1]]),
            loop_count: u16::from_le_bytes([bytecode[2], bytecode[3]]),
            syntax_flags: bytecode[4],
            constraints: bytecode[5],
        };
        (header, &bytecode[HEADER_SIZE..])
    }

    pub fn flags(&self) -> SyntaxFlags {
        SyntaxFlags::from_byte(self.syntax_flags)
    }
}

/// The opcodes of the instruction set. The discriminant values are part of
/// the persisted format.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Successful match endpoint.
    Goal = 0,
    /// `^`.
    LeftAnchor = 1,
    /// `$`.
    RightAnchor = 2,
    /// `.` with dotAll, one code unit.
    MatchAny = 3,
    /// `.` with dotAll, decoding surrogate pairs.
    U16MatchAny = 4,
    /// `.`, one code unit.
    MatchAnyButNewline = 5,
    /// `.`, decoding surrogate pairs.
    U16MatchAnyButNewline = 6,
    /// Match one 8-bit char. Payload: u8.
    MatchChar8 = 7,
    /// Match one 16-bit char. Payload: u16.
    MatchChar16 = 8,
    /// Match one code point, decoding surrogate pairs. Payload: u32.
    U16MatchChar32 = 9,
    /// Case-insensitive variants of the above three.
    MatchCharICase8 = 10,
    MatchCharICase16 = 11,
    U16MatchCharICase32 = 12,
    /// Match a run of 8-bit chars. Payload: u8 count, then count bytes.
    MatchNChar8 = 13,
    /// Case-insensitive run. Payload: u8 count, then count canonicalized
    /// bytes.
    MatchNCharICase8 = 14,
    /// Try the primary branch, backtracking to the secondary.
    /// Payload: u8 primary constraints, u8 secondary constraints,
    /// u32 secondary branch target.
    Alternation = 15,
    /// Unconditional jump. Payload: u32 target.
    Jump32 = 16,
    /// Bracket expression, one code unit. Payload: u8 negate,
    /// u8 positive classes, u8 negative classes, u32 range count, then
    /// count * (u32 first, u32 last).
    Bracket = 17,
    /// Bracket expression, decoding surrogate pairs. Same payload.
    U16Bracket = 18,
    /// `\b` or `\B`. Payload: u8 invert.
    WordBoundary = 19,
    /// Begin capture group. Payload: u16 group.
    BeginMarkedSubexpression = 20,
    /// End capture group. Payload: u16 group.
    EndMarkedSubexpression = 21,
    /// Backreference. Payload: u16 group.
    BackRef = 22,
    /// Lookaround assertion. Payload: u8 invert, u8 forwards,
    /// u8 body constraints, u16 mexp begin, u16 mexp end, u32 continuation.
    Lookaround = 23,
    /// General loop entry. Payload: u16 loop id, u32 min, u32 max,
    /// u16 mexp begin, u16 mexp end, u8 greedy, u8 loopee constraints,
    /// u32 not-taken target.
    BeginLoop = 24,
    /// General loop latch. Payload: u32 target (the BeginLoop).
    EndLoop = 25,
    /// Greedy unbounded capture-free non-empty loop entry.
    /// Payload: u8 loopee constraints, u32 not-taken target.
    BeginSimpleLoop = 26,
    /// Simple loop latch. Payload: u32 target (the body start).
    EndSimpleLoop = 27,
    /// Loop whose body matches exactly one code unit; the single body
    /// instruction follows directly. Payload: u16 loop id, u8 greedy,
    /// u32 min, u32 max, u32 not-taken target.
    Width1Loop = 28,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Opcode {
        use Opcode::*;
        match value {
            0 => Goal,
            1 => LeftAnchor,
            2 => RightAnchor,
            3 => MatchAny,
            4 => U16MatchAny,
            5 => MatchAnyButNewline,
            6 => U16MatchAnyButNewline,
            7 => MatchChar8,
            8 => MatchChar16,
            9 => U16MatchChar32,
            10 => MatchCharICase8,
            11 => MatchCharICase16,
            12 => U16MatchCharICase32,
            13 => MatchNChar8,
            14 => MatchNCharICase8,
            15 => Alternation,
            16 => Jump32,
            17 => Bracket,
            18 => U16Bracket,
            19 => WordBoundary,
            20 => BeginMarkedSubexpression,
            21 => EndMarkedSubexpression,
            22 => BackRef,
            23 => Lookaround,
            24 => BeginLoop,
            25 => EndLoop,
            26 => BeginSimpleLoop,
            27 => EndSimpleLoop,
            28 => Width1Loop,
            _ => unreachable!("Corrupt bytecode: bad opcode"),
        }
    }
}

// Total encoded widths (opcode byte included) of the fixed-size instructions
// whose interiors the executor needs to address.
pub const ALTERNATION_WIDTH: usize = 7;
pub const LOOKAROUND_WIDTH: usize = 12;
pub const BEGIN_LOOP_WIDTH: usize = 21;
pub const END_LOOP_WIDTH: usize = 5;
pub const BEGIN_SIMPLE_LOOP_WIDTH: usize = 6;
pub const END_SIMPLE_LOOP_WIDTH: usize = 5;
pub const WIDTH1_LOOP_WIDTH: usize = 16;

/// Read helpers over an instruction stream.
pub trait StreamRead {
    fn u8_at(&self, off: usize) -> u8;
    fn u16_at(&self, off: usize) -> u16;
    fn u32_at(&self, off: usize) -> u32;
    fn opcode_at(&self, off: usize) -> Opcode;
}

impl StreamRead for [u8] {
    fn u8_at(&self, off: usize) -> u8 {
        self[off]
    }

    fn u16_at(&self, off: usize) -> u16 {
        u16::from_le_bytes([self[off], self[off + 1]])
    }

    fn u32_at(&self, off: usize) -> u32 {
        u32::from_le_bytes([self[off], self[off + 1], self[off + 2], self[off + 3]])
    }

    fn opcode_at(&self, off: usize) -> Opcode {
        Opcode::from_u8(self[off])
    }
}

/// A handle to a u32 field emitted with a placeholder, to be patched once its
/// target offset is known.
#[derive(Debug, Copy, Clone)]
pub struct JumpHandle(usize);

/// Single-pass instruction stream writer with forward-patchable jumps.
#[derive(Debug, Default)]
pub struct BytecodeStream {
    bytes: Vec<u8>,
}

impl BytecodeStream {
    pub fn new() -> BytecodeStream {
        BytecodeStream::default()
    }

    /// \return the offset at which the next byte will be emitted.
    pub fn current_offset(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn emit_opcode(&mut self, op: Opcode) {
        self.bytes.push(op as u8);
    }

    pub fn emit_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn emit_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a placeholder u32 to be patched later.
    pub fn emit_patchable_u32(&mut self) -> JumpHandle {
        let handle = JumpHandle(self.bytes.len());
        self.emit_u32(u32::MAX);
        handle
    }

    pub fn patch_u32(&mut self, handle: JumpHandle, value: u32) {
        self.bytes[handle.0..handle.0 + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Patch \p handle to the current offset.
    pub fn patch_to_here(&mut self, handle: JumpHandle) {
        let here = self.current_offset();
        self.patch_u32(handle, here);
    }

    /// Prepend the header and return the finished buffer.
    pub fn seal(self, header: BytecodeHeader) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.bytes.len());
        header.serialize(&mut out);
        out.extend_from_slice(&self.bytes);
        out
    }
}

/// \return a textual disassembly of a compiled buffer, for debugging and the
/// CLI tool.
pub fn disassemble(bytecode: &[u8]) -> String {
    use std::fmt::Write;
    let (header, body) = BytecodeHeader::deserialize(bytecode);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "header: groups={} loops={} flags={:#04x} constraints={:#04x}",
        header.marked_count, header.loop_count, header.syntax_flags, header.constraints
    );
    let mut ip = 0usize;
    while ip < body.len() {
        let op = body.opcode_at(ip);
        let _ = write!(out, "{:6}: {:?}", ip, op);
        ip += 1;
        match op {
            Opcode::Goal
            | Opcode::LeftAnchor
            | Opcode::RightAnchor
            | Opcode::MatchAny
            | Opcode::U16MatchAny
            | Opcode::MatchAnyButNewline
            | Opcode::U16MatchAnyButNewline => {}
            Opcode::MatchChar8 | Opcode::MatchCharICase8 => {
                let _ = write!(out, " {:?}", body.u8_at(ip) as char);
                ip += 1;
            }
            Opcode::MatchChar16 | Opcode::MatchCharICase16 => {
                let _ = write!(out, " {:#06x}", body.u16_at(ip));
                ip += 2;
            }
            Opcode::U16MatchChar32 | Opcode::U16MatchCharICase32 => {
                let _ = write!(out, " {:#x}", body.u32_at(ip));
                ip += 4;
            }
            Opcode::MatchNChar8 | Opcode::MatchNCharICase8 => {
                let count = body.u8_at(ip) as usize;
                let chars: String = body[ip + 1..ip + 1 + count]
                    .iter()
                    .map(|&b| b as char)
                    .collect();
                let _ = write!(out, " {:?}", chars);
                ip += 1 + count;
            }
            Opcode::Alternation => {
                let _ = write!(
                    out,
                    " prim={:#04x} sec={:#04x} secondary->{}",
                    body.u8_at(ip),
                    body.u8_at(ip + 1),
                    body.u32_at(ip + 2)
                );
                ip += ALTERNATION_WIDTH - 1;
            }
            Opcode::Jump32 => {
                let _ = write!(out, " ->{}", body.u32_at(ip));
                ip += 4;
            }
            Opcode::Bracket | Opcode::U16Bracket => {
                let negate = body.u8_at(ip);
                let count = body.u32_at(ip + 3) as usize;
                let _ = write!(out, " negate={} ranges={}", negate, count);
                ip += 7 + count * 8;
            }
            Opcode::WordBoundary => {
                let _ = write!(out, " invert={}", body.u8_at(ip));
                ip += 1;
            }
            Opcode::BeginMarkedSubexpression
            | Opcode::EndMarkedSubexpression
            | Opcode::BackRef => {
                let _ = write!(out, " group={}", body.u16_at(ip));
                ip += 2;
            }
            Opcode::Lookaround => {
                let _ = write!(
                    out,
                    " invert={} forwards={} constraints={:#04x} cont->{}",
                    body.u8_at(ip),
                    body.u8_at(ip + 1),
                    body.u8_at(ip + 2),
                    body.u32_at(ip + 7)
                );
                ip += LOOKAROUND_WIDTH - 1;
            }
            Opcode::BeginLoop => {
                let _ = write!(
                    out,
                    " id={} min={} max={} nottaken->{}",
                    body.u16_at(ip),
                    body.u32_at(ip + 2),
                    body.u32_at(ip + 6),
                    body.u32_at(ip + 16)
                );
                ip += BEGIN_LOOP_WIDTH - 1;
            }
            Opcode::EndLoop | Opcode::EndSimpleLoop => {
                let _ = write!(out, " ->{}", body.u32_at(ip));
                ip += 4;
            }
            Opcode::BeginSimpleLoop => {
                let _ = write!(out, " nottaken->{}", body.u32_at(ip + 1));
                ip += BEGIN_SIMPLE_LOOP_WIDTH - 1;
            }
            Opcode::Width1Loop => {
                let _ = write!(
                    out,
                    " id={} greedy={} min={} max={} nottaken->{}",
                    body.u16_at(ip),
                    body.u8_at(ip + 2),
                    body.u32_at(ip + 3),
                    body.u32_at(ip + 7),
                    body.u32_at(ip + 11)
                );
                ip += WIDTH1_LOOP_WIDTH - 1;
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let header = BytecodeHeader {
            marked_count: 3,
            loop_count: 259,
            syntax_flags: 0b101,
            constraints: 0b110,
        };
        let mut buf = Vec::new();
        header.serialize(&mut buf);
        buf.extend_from_slice(&[0, 1, 2]);
        let (read, body) = BytecodeHeader::deserialize(&buf);
        assert_eq!(read, header);
        assert_eq!(body, &[0, 1, 2]);
    }

    #[test]
    fn test_patching() {
        let mut bs = BytecodeStream::new();
        bs.emit_opcode(Opcode::Jump32);
        let target = bs.emit_patchable_u32();
        bs.emit_opcode(Opcode::Goal);
        bs.patch_to_here(target);
        bs.emit_opcode(Opcode::Goal);
        let buf = bs.seal(BytecodeHeader {
            marked_count: 0,
            loop_count: 0,
            syntax_flags: 0,
            constraints: 0,
        });
        let (_, body) = BytecodeHeader::deserialize(&buf);
        assert_eq!(body.opcode_at(0), Opcode::Jump32);
        assert_eq!(body.u32_at(1), 6);
        assert_eq!(body.opcode_at(6), Opcode::Goal);
    }

    #[test]
    fn test_widths() {
        // The interior-offset constants must match the emitted layouts.
        assert_eq!(ALTERNATION_WIDTH, 1 + 1 + 1 + 4);
        assert_eq!(LOOKAROUND_WIDTH, 1 + 1 + 1 + 1 + 2 + 2 + 4);
        assert_eq!(BEGIN_LOOP_WIDTH, 1 + 2 + 4 + 4 + 2 + 2 + 1 + 1 + 4);
        assert_eq!(WIDTH1_LOOP_WIDTH, 1 + 2 + 1 + 4 + 4 + 4);
    }
}
