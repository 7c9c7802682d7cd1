//! The flash bank: probe, erase, program and read through the boot ROM.
//!
//! A [`Bank`] owns a [`Target`] and drives the SPI flash attached to it by
//! calling the target's boot-ROM flash routines. Discovery happens lazily, on
//! the first operation (or an explicit [`Bank::probe`]), and walks the
//! [`ProbeState`] machine:
//!
//! ```text
//! Unprobed -> PartIdentified -> HardwareInitialized -> DeviceIdentified -> Ready
//!     \______________\_________________\_____________________\______> Failed
//! ```
//!
//! Every operation re-uploads the [flash configuration blob](SflashCfg) into a
//! fresh scratch lease; nothing is assumed to survive on the target between
//! calls.

use core::fmt;
use core::time::Duration;

use log::*;

use crate::call::{call_func, call_rom_func};
use crate::error::Error;
use crate::parts::{FlashPinCfg, PartInfo, RomFn};
use crate::sflash::{FlashDevice, SflashCfg};
use crate::target::{Target, TargetState};

mod builder;
mod io;
mod probe;

pub use builder::{BankBuilder, BankBuilderError};

/// Default timeout for hardware init, GPIO init and JEDEC ID calls.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(3);
/// Default timeout for a single sector erase.
pub const DEFAULT_ERASE_TIMEOUT: Duration = Duration::from_secs(20);
/// Default timeout for programming or reading a single chunk.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(3);
/// Default timeout for a raw [`Bank::call`].
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write alignment, in bytes.
pub const DEFAULT_WRITE_ALIGNMENT: u32 = 8;

/// Discovery progress of a [`Bank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Nothing is known about the target yet.
    Unprobed,
    /// The target family was recognised from its debug ID.
    PartIdentified,
    /// The SPI flash pins and controller have been initialised.
    HardwareInitialized,
    /// The flash chip was recognised from its JEDEC ID.
    DeviceIdentified,
    /// Geometry is known and the configuration blob is patched.
    Ready,
    /// The last probe failed.
    Failed,
}

/// An erase sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    /// Offset from the start of flash, in bytes.
    pub offset: u32,
    /// Size in bytes.
    pub size: u32,
}

/// Per-call timeouts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timeouts {
    pub init: Duration,
    pub erase: Duration,
    pub io: Duration,
    pub call: Duration,
}

impl Default for Timeouts {
    fn default() -> Timeouts {
        Timeouts {
            init: DEFAULT_INIT_TIMEOUT,
            erase: DEFAULT_ERASE_TIMEOUT,
            io: DEFAULT_IO_TIMEOUT,
            call: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// SPI flash attached to a BL70x target, driven through its boot ROM.
pub struct Bank<T: Target> {
    target: T,
    cfg: SflashCfg,
    state: ProbeState,
    part: Option<&'static PartInfo>,
    device: Option<&'static FlashDevice>,
    timeouts: Timeouts,
    write_alignment: u32,
    pin_cfg: Option<FlashPinCfg>,
}

impl<T: Target> Bank<T> {
    /// Create a bank with default settings. No target interaction happens
    /// until the first operation.
    pub fn new(target: T) -> Bank<T> {
        Bank {
            target,
            cfg: SflashCfg::default(),
            state: ProbeState::Unprobed,
            part: None,
            device: None,
            timeouts: Timeouts::default(),
            write_alignment: DEFAULT_WRITE_ALIGNMENT,
            pin_cfg: None,
        }
    }

    /// Helper to construct and customize a [`Bank`].
    pub fn builder(target: T) -> BankBuilder<T> {
        BankBuilder::new(target)
    }

    /// Current discovery state.
    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Returns true once discovery has completed successfully.
    pub fn is_probed(&self) -> bool {
        self.state == ProbeState::Ready
    }

    /// The identified target family, if any.
    pub fn part(&self) -> Option<&'static PartInfo> {
        self.part
    }

    /// The identified flash chip, if probed.
    pub fn device(&self) -> Option<&'static FlashDevice> {
        self.device
    }

    /// Total flash size in bytes, or 0 if not probed.
    pub fn size(&self) -> u32 {
        self.device.map_or(0, |d| d.size_in_bytes)
    }

    /// Erase sectors, in ascending offset order. Empty if not probed.
    pub fn sectors(&self) -> impl Iterator<Item = Sector> {
        let (n, size) = self
            .device
            .map_or((0, 0), |d| (d.num_sectors(), d.sector_size));
        (0..n).map(move |i| Sector {
            offset: i * size,
            size,
        })
    }

    /// Required start and end alignment of writes, in bytes.
    pub fn write_alignment(&self) -> u32 {
        self.write_alignment
    }

    /// The configuration blob uploaded ahead of every ROM flash call.
    pub fn sflash_cfg(&self) -> &SflashCfg {
        &self.cfg
    }

    /// Borrow the underlying target.
    pub fn target(&mut self) -> &mut T {
        &mut self.target
    }

    /// Tear down the bank, returning the target.
    pub fn into_target(self) -> T {
        self.target
    }

    /// Call an arbitrary function on the target with up to six arguments,
    /// returning the value left in `a0`.
    pub fn call(&mut self, func: u32, args: &[u32]) -> Result<u32, Error<T::Error>> {
        self.ensure_halted()?;
        let mut ret = 0;
        call_func(
            &mut self.target,
            func,
            args,
            Some(&mut ret),
            self.timeouts.call,
        )?;
        info!("function at {:#010x} returned {:#x}", func, ret);
        Ok(ret)
    }

    fn ensure_halted(&mut self) -> Result<(), Error<T::Error>> {
        match self.target.state() {
            TargetState::Halted => Ok(()),
            TargetState::Running => {
                error!("Target not halted");
                Err(Error::TargetNotHalted)
            }
            TargetState::Unexamined => {
                error!("Target not examined yet");
                Err(Error::TargetNotExamined)
            }
        }
    }
}

/// Call a ROM routine and hand back whatever it left in `a0`.
fn rom_call<T: Target>(
    target: &mut T,
    part: &PartInfo,
    func: RomFn,
    args: &[u32],
    timeout: Duration,
) -> Result<u32, Error<T::Error>> {
    let mut ret = 0;
    call_rom_func(target, part.rom.slot(func), args, Some(&mut ret), timeout).map_err(|e| {
        error!("Failed to invoke ROM {} function", func);
        e
    })?;
    Ok(ret)
}

/// Call a ROM routine that reports a status code, failing on nonzero.
fn rom_call_checked<T: Target>(
    target: &mut T,
    part: &PartInfo,
    func: RomFn,
    args: &[u32],
    timeout: Duration,
) -> Result<(), Error<T::Error>> {
    match rom_call(target, part, func, args, timeout)? {
        0 => Ok(()),
        status => {
            error!("ROM {} function returned wrong value: {:02X}", func, status);
            Err(Error::RomFunction {
                slot: part.rom.slot(func),
                status,
            })
        }
    }
}

impl<T: Target> fmt::Display for Bank<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = self.part.map_or("bl70x", |p| p.name);
        match self.device {
            Some(dev) => write!(
                f,
                "{} flash: {} (ID {:#08x}), {} KiB in {} sectors of {} KiB, {} byte pages",
                part,
                dev.name,
                dev.device_id,
                dev.size_in_bytes / 1024,
                dev.num_sectors(),
                dev.sector_size / 1024,
                dev.page_size
            ),
            None => write!(f, "{} flash: not probed ({:?})", part, self.state),
        }
    }
}

impl<T: Target> fmt::Debug for Bank<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bank")
            .field("state", &self.state)
            .field("part", &self.part.map(|p| p.name))
            .field("device", &self.device.map(|d| d.name))
            .field("cfg", &self.cfg)
            .finish()
    }
}
