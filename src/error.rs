use core::fmt::{self, Debug, Display};
use core::time::Duration;

/// An error which may occur while driving target flash through the boot ROM.
///
/// `E` is the [`Target`](crate::target::Target)'s fatal transport error.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error<E> {
    /// Not enough scratch memory could be leased on the target.
    ResourceUnavailable {
        /// Bytes requested.
        requested: u32,
        /// Largest block available at the time of the request.
        available: u32,
    },
    /// The target must be halted for this operation.
    TargetNotHalted,
    /// The debug link has not examined the target yet.
    TargetNotExamined,
    /// A remote call was given more arguments than fit in registers.
    TooManyArgs {
        /// Number of arguments passed.
        count: usize,
    },
    /// The target did not return from a remote call before the timeout.
    CallTimeout {
        /// Address of the called function.
        func: u32,
        /// Timeout which expired.
        timeout: Duration,
    },
    /// The target halted somewhere other than the call trampoline.
    UnexpectedHalt {
        /// Address of the called function.
        func: u32,
        /// Program counter at the halt.
        pc: u32,
    },
    /// A ROM function returned a nonzero status code.
    RomFunction {
        /// Vector-table slot the ROM function was called through.
        slot: u32,
        /// Status it returned.
        status: u32,
    },
    /// The target's debug ID does not match any known part.
    UnknownPart {
        /// Debug ID reported by the target.
        idcode: u32,
    },
    /// The flash chip's JEDEC ID does not match any known device.
    UnknownFlash {
        /// JEDEC ID reported by the flash (low 24 bits).
        jedec_id: u32,
    },
    /// The requested offset lies beyond the end of flash.
    OffsetOutOfRange {
        /// Requested offset.
        offset: u32,
        /// Size of the flash device.
        size: u32,
    },
    /// The requested sector range is empty or exceeds the device.
    InvalidSectorRange {
        /// First sector requested.
        first: u32,
        /// Last sector requested (inclusive).
        last: u32,
        /// Number of sectors on the device.
        num_sectors: u32,
    },
    /// The debug link reported a fatal error.
    Target(E),
}

impl<E> Display for Error<E>
where
    E: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::Error::*;
        match self {
            ResourceUnavailable { requested, available } => write!(f, "No working area available: requested {} bytes, {} available.", requested, available),
            TargetNotHalted => write!(f, "Target not halted."),
            TargetNotExamined => write!(f, "Target not examined yet."),
            TooManyArgs { count } => write!(f, "Remote calls take at most {} register arguments, got {}.", crate::call::MAX_ARGS, count),
            CallTimeout { func, timeout } => write!(f, "Function at {:#010x} did not return within {:?}.", func, timeout),
            UnexpectedHalt { func, pc } => write!(f, "Function at {:#010x} halted at unexpected address {:#010x}.", func, pc),
            RomFunction { slot, status } => write!(f, "ROM function in vector slot {:#010x} returned status {:#04x}.", slot, status),
            UnknownPart { idcode } => write!(f, "Cannot identify target as a BL70x family device (idcode {:#010x}).", idcode),
            UnknownFlash { jedec_id } => write!(f, "Unknown flash device (ID {:#08x}).", jedec_id),
            OffsetOutOfRange { offset, size } => write!(f, "Offset {:#010x} is past the end of flash ({:#x} bytes).", offset, size),
            InvalidSectorRange { first, last, num_sectors } => write!(f, "Invalid sector range {}..={} (device has {} sectors).", first, last, num_sectors),
            Target(e) => write!(f, "Target threw a fatal error: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for Error<E> where E: Debug {}
