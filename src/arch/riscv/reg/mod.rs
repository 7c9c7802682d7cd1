//! Register definitions for RISC-V architectures.

/// `RegId` definitions for RISC-V architectures.
pub mod id;
