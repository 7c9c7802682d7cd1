//! Calling functions that live on the target.
//!
//! [`call_func`] executes an arbitrary function on the halted target using the
//! standard RISC-V calling convention: up to [`MAX_ARGS`] word-sized arguments
//! in `a0`-`a5`, and the return value in `a0`.
//!
//! A tiny [trampoline](trampoline::CODE) is written into a scratch-memory
//! lease. The target is resumed at the trampoline with the callee address in
//! `t0`; the trampoline jumps to the callee, which returns onto an `ebreak`
//! that halts the hart again.
//!
//! [`call_rom_func`] adds one level of indirection for boot-ROM routines,
//! whose entry points are published through a vector table.

use core::time::Duration;

use log::*;

use crate::arch::riscv::{RiscvRegId, ARG_REGS};
use crate::error::Error;
use crate::scratch::Scratch;
use crate::target::{RegParam, StopReason, Target};

/// The injected call trampoline.
pub mod trampoline;

/// Maximum number of arguments passed to a target function.
pub const MAX_ARGS: usize = ARG_REGS.len();

/// Call the function at `func` on the target with `args`, blocking until it
/// returns or `timeout` expires.
///
/// If `ret` is provided, it receives the function's return value (`a0`).
///
/// The target must be halted, and is left halted whatever the outcome.
pub fn call_func<T: Target>(
    target: &mut T,
    func: u32,
    args: &[u32],
    ret: Option<&mut u32>,
    timeout: Duration,
) -> Result<(), Error<T::Error>> {
    if args.len() > MAX_ARGS {
        error!(
            "cannot call {:#010x}: {} arguments given, at most {} supported",
            func,
            args.len(),
            MAX_ARGS
        );
        return Err(Error::TooManyArgs { count: args.len() });
    }

    let mut area = Scratch::upload(target, &trampoline::to_bytes())?;
    let entry = area.address();
    let exit = entry + trampoline::EXIT_OFFSET;

    let mut params = [RegParam::write(RiscvRegId::T0, 0); MAX_ARGS + 1];
    let mut n_params = 0;

    // a0 carries both the first argument and the return value
    if ret.is_some() || !args.is_empty() {
        let arg0 = args.first().copied().unwrap_or(0);
        params[n_params] = RegParam::write_read(RiscvRegId::A0, arg0);
        n_params += 1;
    }
    for (reg, arg) in ARG_REGS.iter().zip(args.iter()).skip(1) {
        params[n_params] = RegParam::write(*reg, *arg);
        n_params += 1;
    }
    params[n_params] = RegParam::write(RiscvRegId::T0, func);
    n_params += 1;

    let params = &mut params[..n_params];

    debug!(
        "calling {:#010x}({:#x?}) via trampoline @ {:#010x}",
        func, args, entry
    );

    let stop = area
        .run_algorithm(params, entry, exit, timeout)
        .map_err(|e| {
            error!("Failed to execute algorithm at {:#010x}", entry);
            Error::Target(e)
        })?;

    match stop {
        StopReason::Halted { pc } if pc == exit => {}
        StopReason::Halted { pc } => {
            error!(
                "call to {:#010x} halted at {:#010x}, expected {:#010x}",
                func, pc, exit
            );
            return Err(Error::UnexpectedHalt { func, pc });
        }
        StopReason::Timeout => {
            error!(
                "call to {:#010x} did not return within {:?}",
                func, timeout
            );
            return Err(Error::CallTimeout { func, timeout });
        }
    }

    if let Some(ret) = ret {
        *ret = params[0].value;
        trace!("{:#010x} returned {:#x}", func, *ret);
    }

    Ok(())
}

/// Call a boot-ROM routine whose entry point is stored in the vector-table
/// slot at `slot`.
pub fn call_rom_func<T: Target>(
    target: &mut T,
    slot: u32,
    args: &[u32],
    ret: Option<&mut u32>,
    timeout: Duration,
) -> Result<(), Error<T::Error>> {
    let func = target.read_u32(slot).map_err(|e| {
        error!("failed to read ROM vector @ {:#010x}", slot);
        Error::Target(e)
    })?;
    trace!("ROM vector {:#010x} -> {:#010x}", slot, func);

    call_func(target, func, args, ret, timeout)
}
