/// A known serial NOR flash chip.
#[derive(Debug, PartialEq, Eq)]
pub struct FlashDevice {
    /// Human readable part name.
    pub name: &'static str,
    /// JEDEC ID as read back from the chip, in byte order: manufacturer in
    /// bits 0-7, memory type in bits 8-15, capacity code in bits 16-23.
    pub device_id: u32,
    /// Read command opcode.
    pub read_cmd: u8,
    /// Page program command opcode.
    pub pprog_cmd: u8,
    /// Sector erase command opcode.
    pub erase_cmd: u8,
    /// Chip erase command opcode.
    pub chip_erase_cmd: u8,
    /// Program page size, in bytes.
    pub page_size: u32,
    /// Erase sector size, in bytes.
    pub sector_size: u32,
    /// Total capacity, in bytes.
    pub size_in_bytes: u32,
}

impl FlashDevice {
    /// Manufacturer ID (first JEDEC ID byte).
    pub fn manufacturer(&self) -> u8 {
        (self.device_id & 0xff) as u8
    }

    /// Number of erase sectors.
    pub fn num_sectors(&self) -> u32 {
        self.size_in_bytes / self.sector_size
    }
}

const fn flash_id(
    name: &'static str,
    device_id: u32,
    page_size: u32,
    sector_size: u32,
    size_in_bytes: u32,
) -> FlashDevice {
    FlashDevice {
        name,
        device_id,
        read_cmd: 0x03,
        pprog_cmd: 0x02,
        erase_cmd: 0xd8,
        chip_erase_cmd: 0xc7,
        page_size,
        sector_size,
        size_in_bytes,
    }
}

/// Serial NOR flash chips known to work with the ROM flash routines.
///
/// Sectors are the 64 KiB erase blocks (`0xd8`) every listed part supports.
pub static FLASH_DEVICES: &[FlashDevice] = &[
    // Winbond
    flash_id("win w25q80bv", 0x0014_40ef, 0x100, 0x10000, 0x10_0000),
    flash_id("win w25q16jv", 0x0015_40ef, 0x100, 0x10000, 0x20_0000),
    flash_id("win w25q16jv-im/jm", 0x0015_70ef, 0x100, 0x10000, 0x20_0000),
    flash_id("win w25q32jv", 0x0016_40ef, 0x100, 0x10000, 0x40_0000),
    flash_id("win w25q64jv", 0x0017_40ef, 0x100, 0x10000, 0x80_0000),
    flash_id("win w25q128jv", 0x0018_40ef, 0x100, 0x10000, 0x100_0000),
    // GigaDevice
    flash_id("gd gd25q80c", 0x0014_40c8, 0x100, 0x10000, 0x10_0000),
    flash_id("gd gd25q16c", 0x0015_40c8, 0x100, 0x10000, 0x20_0000),
    flash_id("gd gd25lq16c", 0x0015_60c8, 0x100, 0x10000, 0x20_0000),
    flash_id("gd gd25q32c", 0x0016_40c8, 0x100, 0x10000, 0x40_0000),
    flash_id("gd gd25q64c", 0x0017_40c8, 0x100, 0x10000, 0x80_0000),
    flash_id("gd gd25q128c", 0x0018_40c8, 0x100, 0x10000, 0x100_0000),
    // Macronix
    flash_id("mac 25l8005", 0x0014_20c2, 0x100, 0x10000, 0x10_0000),
    flash_id("mac 25l1606e", 0x0015_20c2, 0x100, 0x10000, 0x20_0000),
    flash_id("mac 25r1635f", 0x0015_28c2, 0x100, 0x10000, 0x20_0000),
    flash_id("mac 25l3233f", 0x0016_20c2, 0x100, 0x10000, 0x40_0000),
    flash_id("mac 25l6433f", 0x0017_20c2, 0x100, 0x10000, 0x80_0000),
    flash_id("mac 25l12835f", 0x0018_20c2, 0x100, 0x10000, 0x100_0000),
    // ISSI
    flash_id("issi is25lp080d", 0x0014_609d, 0x100, 0x10000, 0x10_0000),
    flash_id("issi is25lp016d", 0x0015_609d, 0x100, 0x10000, 0x20_0000),
    flash_id("issi is25lp032", 0x0016_609d, 0x100, 0x10000, 0x40_0000),
    flash_id("issi is25lp064", 0x0017_609d, 0x100, 0x10000, 0x80_0000),
    flash_id("issi is25lp128", 0x0018_609d, 0x100, 0x10000, 0x100_0000),
    // XTX
    flash_id("xtx xt25f08b", 0x0014_400b, 0x100, 0x10000, 0x10_0000),
    flash_id("xtx xt25f16b", 0x0015_400b, 0x100, 0x10000, 0x20_0000),
    flash_id("xtx xt25f32b", 0x0016_400b, 0x100, 0x10000, 0x40_0000),
    // Puya
    flash_id("puya p25q80h", 0x0014_6085, 0x100, 0x10000, 0x10_0000),
    flash_id("puya p25q16h", 0x0015_6085, 0x100, 0x10000, 0x20_0000),
    flash_id("puya p25q32h", 0x0016_6085, 0x100, 0x10000, 0x40_0000),
];

/// Look up a flash chip by its 24-bit JEDEC ID.
pub fn find_device(jedec_id: u32) -> Option<&'static FlashDevice> {
    FLASH_DEVICES.iter().find(|d| d.device_id == jedec_id)
}
