//! The [`Target`] trait: everything this crate needs from the debug link.
//!
//! `romflash` never talks to a JTAG/SWD adapter directly. Instead, users
//! implement [`Target`] on top of whatever debug transport they have at hand
//! (an OpenOCD TCL session, a probe-rs `Core`, a firmware-side JTAG master...)
//! and hand it to a [`Bank`](crate::Bank).
//!
//! The trait is intentionally small:
//!
//! - target state and identification
//! - raw memory access
//! - "run to halt", used to execute a short piece of code with a set of
//!   registers pre-loaded (and some read back afterwards)
//! - a scratch-memory ("working area") allocator
//!
//! If the underlying transport has no notion of a working area, implementers
//! can embed a [`ScratchPool`](crate::scratch::ScratchPool) that manages a
//! known-free window of target RAM.

use core::time::Duration;

use bitflags::bitflags;

use crate::arch::riscv::RiscvRegId;

#[cfg(test)]
pub(crate) mod sim;

/// Execution state of the target, as last observed by the debug link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// The debug link has not examined the target yet.
    Unexamined,
    /// The target CPU is running.
    Running,
    /// The target CPU is halted under debugger control.
    Halted,
}

/// Why [`Target::run_algorithm`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The CPU re-halted at `pc`.
    Halted {
        /// Program counter at the halt.
        pc: u32,
    },
    /// The CPU did not halt before the timeout expired. Implementations must
    /// halt the CPU again before returning this.
    Timeout,
}

bitflags! {
    /// Direction in which a register parameter is transferred.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Direction: u8 {
        /// Written to the target before resuming.
        const WRITE = 1 << 0;
        /// Read back from the target after the halt.
        const READ = 1 << 1;
    }
}

/// A single register binding used by [`Target::run_algorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegParam {
    /// Which register.
    pub reg: RiscvRegId,
    /// Transfer direction.
    pub direction: Direction,
    /// Value written before the run and/or read back after it.
    pub value: u32,
}

impl RegParam {
    /// A register written before the run, never read back.
    pub fn write(reg: RiscvRegId, value: u32) -> RegParam {
        RegParam {
            reg,
            direction: Direction::WRITE,
            value,
        }
    }

    /// A register written before the run and read back after it.
    pub fn write_read(reg: RiscvRegId, value: u32) -> RegParam {
        RegParam {
            reg,
            direction: Direction::WRITE | Direction::READ,
            value,
        }
    }
}

/// A debug-link connection to a single RISC-V hart.
pub trait Target {
    /// A transport-specific **fatal** error.
    type Error;

    /// Current execution state of the target.
    fn state(&mut self) -> TargetState;

    /// Debug identification code (JTAG IDCODE) of the target TAP.
    fn idcode(&mut self) -> u32;

    /// Read `data.len()` bytes starting at `addr`.
    fn read_addrs(&mut self, addr: u32, data: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` starting at `addr`.
    fn write_addrs(&mut self, addr: u32, data: &[u8]) -> Result<(), Self::Error>;

    /// Read a little-endian 32-bit word.
    fn read_u32(&mut self, addr: u32) -> Result<u32, Self::Error> {
        let mut buf = [0; 4];
        self.read_addrs(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Write a little-endian 32-bit word.
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<(), Self::Error> {
        self.write_addrs(addr, &val.to_le_bytes())
    }

    /// Execute code on the halted target.
    ///
    /// Implementations must:
    /// 1. write every param whose direction contains [`Direction::WRITE`]
    /// 2. resume execution at `entry`, with a resumable halt at `exit`
    /// 3. block until the CPU halts or `timeout` elapses (halting it again in
    ///    the latter case)
    /// 4. on a halt, update `value` of every param whose direction contains
    ///    [`Direction::READ`]
    ///
    /// The target must be left halted whenever this returns, regardless of
    /// outcome. Transport-level failures are reported as `Err`.
    fn run_algorithm(
        &mut self,
        params: &mut [RegParam],
        entry: u32,
        exit: u32,
        timeout: Duration,
    ) -> Result<StopReason, Self::Error>;

    /// Lease `size` bytes of scratch memory, returning its address, or `None`
    /// if no free block is large enough.
    fn alloc_working_area(&mut self, size: u32) -> Option<u32>;

    /// Release a lease previously returned by `alloc_working_area`.
    fn free_working_area(&mut self, addr: u32);

    /// Size of the largest block `alloc_working_area` can currently satisfy.
    fn working_area_avail(&self) -> u32;
}
