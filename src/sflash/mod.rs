//! Serial flash knowledge shared with the target ROM: the configuration blob
//! passed to every ROM flash routine, and the table of known flash chips.

/// The flash configuration blob.
pub mod cfg;
/// Known flash chips.
pub mod devices;

pub use cfg::{Field, SflashCfg, SFLASH_CFG_SIZE};
pub use devices::{find_device, FlashDevice, FLASH_DEVICES};
