//! Encoders for the few RV32I instructions injected into target memory.
//!
//! Register operands are raw GPR numbers (`x0`-`x31`); out-of-range bits are
//! masked off, as in the instruction format.

const OPCODE_JALR: u32 = 0b110_0111;

/// `ebreak`: raise a breakpoint exception, halting the hart under debug.
pub const EBREAK: u32 = 0x0010_0073;

/// Encode `jalr rd, imm(rs1)`. `imm` is truncated to 12 bits.
pub const fn jalr(rd: u8, rs1: u8, imm: i16) -> u32 {
    let imm = (imm as i32 as u32) & 0xfff;
    (imm << 20) | (((rs1 & 0x1f) as u32) << 15) | (((rd & 0x1f) as u32) << 7) | OPCODE_JALR
}

/// Encode `ebreak`.
pub const fn ebreak() -> u32 {
    EBREAK
}

/// Decode a `jalr` into `(rd, rs1, imm)`.
pub fn decode_jalr(insn: u32) -> Option<(u8, u8, i16)> {
    if insn & 0x7f != OPCODE_JALR || (insn >> 12) & 0b111 != 0 {
        return None;
    }
    let rd = ((insn >> 7) & 0x1f) as u8;
    let rs1 = ((insn >> 15) & 0x1f) as u8;
    // arithmetic shift sign-extends the 12-bit immediate
    let imm = ((insn as i32) >> 20) as i16;
    Some((rd, rs1, imm))
}

/// Returns true if `insn` is `ebreak`.
pub fn is_ebreak(insn: u32) -> bool {
    insn == EBREAK
}
