use core::fmt;

/// RISC-V Register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiscvRegId {
    /// General Purpose Register (x0-x31).
    Gpr(u8),
    /// Program Counter.
    Pc,
}

/// GPR number of `ra`.
pub const X_RA: u8 = 1;
/// GPR number of `t0`.
pub const X_T0: u8 = 5;
/// GPR number of `a0`.
pub const X_A0: u8 = 10;

const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "fp", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

impl RiscvRegId {
    /// Return address (`x1`).
    pub const RA: RiscvRegId = RiscvRegId::Gpr(X_RA);
    /// Temporary `t0` (`x5`), used to carry the callee address.
    pub const T0: RiscvRegId = RiscvRegId::Gpr(X_T0);
    /// Argument / return value register `a0` (`x10`).
    pub const A0: RiscvRegId = RiscvRegId::Gpr(X_A0);
    /// Argument register `a1` (`x11`).
    pub const A1: RiscvRegId = RiscvRegId::Gpr(11);
    /// Argument register `a2` (`x12`).
    pub const A2: RiscvRegId = RiscvRegId::Gpr(12);
    /// Argument register `a3` (`x13`).
    pub const A3: RiscvRegId = RiscvRegId::Gpr(13);
    /// Argument register `a4` (`x14`).
    pub const A4: RiscvRegId = RiscvRegId::Gpr(14);
    /// Argument register `a5` (`x15`).
    pub const A5: RiscvRegId = RiscvRegId::Gpr(15);

    /// Map a raw GDB register number to a `RegId`.
    pub fn from_raw_id(id: usize) -> Option<Self> {
        match id {
            0..=31 => Some(Self::Gpr(id as u8)),
            32 => Some(Self::Pc),
            _ => None,
        }
    }

    /// The raw GDB register number.
    pub fn raw_id(self) -> usize {
        match self {
            Self::Gpr(n) => n as usize,
            Self::Pc => 32,
        }
    }

    /// Logical (ABI) register name, as understood by debug adapters that
    /// address registers by name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Gpr(n) => ABI_NAMES.get(n as usize).copied().unwrap_or("?"),
            Self::Pc => "pc",
        }
    }
}

impl fmt::Display for RiscvRegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
