//! Known target families and the locations of their boot-ROM flash routines.

use core::fmt;

/// Where the SPI flash pin-mux configuration passed to the ROM's GPIO init
/// routine comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashPinCfg {
    /// The family needs no GPIO init call.
    Skip,
    /// A fixed pin configuration.
    Fixed(u32),
    /// Extracted from a fuse / config word: `(read_u32(addr) >> shift) & mask`.
    Efuse {
        /// Address of the fuse word.
        addr: u32,
        /// Bit position of the field.
        shift: u8,
        /// Field mask, applied after shifting.
        mask: u32,
    },
}

/// The boot-ROM flash routines used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomFn {
    /// `SFlash_GetJedecId(cfg, *id)`
    GetJedecId,
    /// `SF_Cfg_Init_Flash_Gpio(pin_cfg, restore_default)`
    InitGpio,
    /// `SFlash_Init(ctrl_cfg)`
    Init,
    /// `SFlash_Program(cfg, io_mode, addr, data, len)`
    Program,
    /// `SFlash_Read(cfg, io_mode, cont_read, addr, data, len)`
    Read,
    /// `SFlash_Sector_Erase(cfg, sector)`
    EraseSector,
}

impl RomFn {
    /// Every routine, in table order.
    pub const ALL: [RomFn; 6] = [
        RomFn::GetJedecId,
        RomFn::InitGpio,
        RomFn::Init,
        RomFn::Program,
        RomFn::Read,
        RomFn::EraseSector,
    ];

    /// Short human-readable name, for logs.
    pub fn name(self) -> &'static str {
        match self {
            RomFn::GetJedecId => "get_jedec_id",
            RomFn::InitGpio => "init_gpio",
            RomFn::Init => "init",
            RomFn::Program => "program",
            RomFn::Read => "read",
            RomFn::EraseSector => "erase_sector",
        }
    }
}

impl fmt::Display for RomFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Addresses of the ROM vector-table slots holding each routine's entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomApi {
    /// [`RomFn::GetJedecId`]
    pub get_jedec_id: u32,
    /// [`RomFn::InitGpio`]
    pub init_gpio: u32,
    /// [`RomFn::Init`]
    pub init: u32,
    /// [`RomFn::Program`]
    pub program: u32,
    /// [`RomFn::Read`]
    pub read: u32,
    /// [`RomFn::EraseSector`]
    pub erase_sector: u32,
}

impl RomApi {
    /// Vector slot for `func`.
    pub fn slot(&self, func: RomFn) -> u32 {
        match func {
            RomFn::GetJedecId => self.get_jedec_id,
            RomFn::InitGpio => self.init_gpio,
            RomFn::Init => self.init,
            RomFn::Program => self.program,
            RomFn::Read => self.read,
            RomFn::EraseSector => self.erase_sector,
        }
    }
}

/// A supported target family.
#[derive(Debug, PartialEq, Eq)]
pub struct PartInfo {
    /// Family name.
    pub name: &'static str,
    /// JTAG IDCODE of the family's debug TAP.
    pub idcode: u32,
    /// ROM vector-table slots.
    pub rom: RomApi,
    /// Source of the flash pin configuration.
    pub flash_pin_cfg: FlashPinCfg,
}

/// All supported target families.
pub static PARTS: &[PartInfo] = &[PartInfo {
    name: "bl702",
    idcode: 0x2000_0e05,
    rom: RomApi {
        get_jedec_id: 0x2101_89a4,
        init_gpio: 0x2101_8a78,
        init: 0x2101_8960,
        program: 0x2101_899c,
        read: 0x2101_89d8,
        erase_sector: 0x2101_898c,
    },
    flash_pin_cfg: FlashPinCfg::Fixed(0),
}];

/// Look up a target family by its debug IDCODE.
pub fn find_part(idcode: u32) -> Option<&'static PartInfo> {
    PARTS.iter().find(|p| p.idcode == idcode)
}
