//! Support for the [RISC-V](https://riscv.org/) architecture.
//!
//! *Note*: currently only supports the RV32I integer register file and the
//! instructions required by the call trampoline.

pub mod opcodes;
pub mod reg;

pub use reg::id::RiscvRegId;

/// Size of a single (non-compressed) RV32 instruction, in bytes.
pub const INSN_LEN: u32 = 4;

/// Argument registers of the integer calling convention, in order.
///
/// `a0` doubles as the return-value register.
pub const ARG_REGS: [RiscvRegId; 6] = [
    RiscvRegId::A0,
    RiscvRegId::A1,
    RiscvRegId::A2,
    RiscvRegId::A3,
    RiscvRegId::A4,
    RiscvRegId::A5,
];
