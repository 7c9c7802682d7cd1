//! Architecture knowledge needed to run code on the target: register
//! identifiers and the handful of instruction encodings used to build call
//! trampolines.
//!
//! Only 32-bit RISC-V is implemented, since every supported BL70x part uses an
//! RV32 core with its boot ROM following the standard integer calling
//! convention.

pub mod riscv;
