//! Program the SPI flash of BL70x parts by calling their boot-ROM routines
//! over a debug link.
//!
//! The BL70x boot ROM ships a complete serial-flash driver, published through
//! a vector table at a fixed address. Instead of uploading a flash algorithm,
//! `romflash` injects a two-instruction trampoline into target RAM and calls
//! those ROM routines directly, with arguments passed in registers.
//!
//! `romflash` is transport-agnostic: implement [`Target`] on top of whatever
//! debug link you have (JTAG adapter, OpenOCD session, probe firmware...) and
//! wrap it in a [`Bank`]:
//!
//! ```rust,ignore
//! let mut bank = Bank::new(my_target);
//! bank.probe()?;
//! bank.erase(0, 0)?;
//! bank.write(&firmware, 0)?;
//! ```
//!
//! ## Features
//!
//! - `std`:
//!   - Implements `std::error::Error` for the crate's error types
//!
//! Without `std`, `romflash` is `#![no_std]` and never allocates, so it also
//! runs on debug probe firmware.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(missing_docs)]

pub mod arch;
pub mod bank;
pub mod call;
pub mod parts;
pub mod scratch;
pub mod sflash;
pub mod target;

mod error;

pub use bank::{Bank, BankBuilder, BankBuilderError, ProbeState, Sector};
pub use error::Error;
pub use target::Target;
