use crate::arch::riscv::opcodes;
use crate::arch::riscv::reg::id::{X_RA, X_T0};
use crate::arch::riscv::INSN_LEN;

/// The code injected into scratch memory to call a function on the target.
///
/// Execution starts at the first instruction, which jumps to the address held
/// in `t0`, linking `ra` to the `ebreak` that follows. When the callee returns
/// the hart traps on the `ebreak` and halts under debug, giving the host a
/// single resumable halt point.
pub const CODE: [u32; 2] = [opcodes::jalr(X_RA, X_T0, 0), opcodes::ebreak()];

/// Size of the trampoline in bytes.
pub const LEN: usize = CODE.len() * INSN_LEN as usize;

/// Offset of the halt point (the `ebreak`) from the start of the trampoline.
pub const EXIT_OFFSET: u32 = LEN as u32 - INSN_LEN;

/// The trampoline as little-endian machine code.
pub fn to_bytes() -> [u8; LEN] {
    let mut buf = [0; LEN];
    for (chunk, insn) in buf.chunks_exact_mut(INSN_LEN as usize).zip(CODE.iter()) {
        chunk.copy_from_slice(&insn.to_le_bytes());
    }
    buf
}
