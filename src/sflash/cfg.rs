use core::fmt;

use super::FlashDevice;

/// Size of the flash configuration blob shared with the ROM, in bytes.
pub const SFLASH_CFG_SIZE: usize = 84;

/// Named fields of the flash configuration blob.
///
/// The blob layout is owned by the target ROM; only the fields this crate
/// reads or writes are named. Multi-byte fields are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Read JEDEC ID command.
    JedecIdCmd,
    /// Dummy clocks after the read JEDEC ID command.
    JedecIdCmdDmyClk,
    /// Erase sector size, in KiB.
    SectorSize,
    /// Manufacturer ID.
    Mid,
    /// Program page size, in bytes.
    PageSize,
    /// Chip erase command.
    ChipEraseCmd,
    /// Sector erase command.
    SectorEraseCmd,
    /// Write enable command.
    WriteEnableCmd,
    /// Page program command.
    PageProgramCmd,
    /// (Fast) read command.
    FastReadCmd,
    /// Status register index holding the write-enable bit.
    WriteEnableIndex,
    /// Status register index holding the busy bit.
    BusyIndex,
    /// Bit position of write-enable in its status register.
    WriteEnableBit,
    /// Bit position of busy in its status register.
    BusyBit,
    /// Bytes to read when checking write-enable.
    WriteEnableReadRegLen,
    /// Bytes to read when checking busy.
    BusyReadRegLen,
    /// Read status register 1 command.
    ReadStatusReg1,
    /// Sector erase timeout, in milliseconds.
    TimeEraseSector,
    /// Page program timeout, in milliseconds.
    TimePageProgram,
}

impl Field {
    /// Every named field, in blob order.
    pub const ALL: [Field; 19] = [
        Field::JedecIdCmd,
        Field::JedecIdCmdDmyClk,
        Field::SectorSize,
        Field::Mid,
        Field::PageSize,
        Field::ChipEraseCmd,
        Field::SectorEraseCmd,
        Field::WriteEnableCmd,
        Field::PageProgramCmd,
        Field::FastReadCmd,
        Field::WriteEnableIndex,
        Field::BusyIndex,
        Field::WriteEnableBit,
        Field::BusyBit,
        Field::WriteEnableReadRegLen,
        Field::BusyReadRegLen,
        Field::ReadStatusReg1,
        Field::TimeEraseSector,
        Field::TimePageProgram,
    ];

    /// `(byte offset, width in bytes)` of the field.
    pub fn layout(self) -> (usize, usize) {
        use self::Field::*;
        match self {
            JedecIdCmd => (0x08, 1),
            JedecIdCmdDmyClk => (0x09, 1),
            SectorSize => (0x0c, 1),
            Mid => (0x0d, 1),
            PageSize => (0x0e, 2),
            ChipEraseCmd => (0x10, 1),
            SectorEraseCmd => (0x11, 1),
            WriteEnableCmd => (0x14, 1),
            PageProgramCmd => (0x15, 1),
            FastReadCmd => (0x18, 1),
            WriteEnableIndex => (0x28, 1),
            BusyIndex => (0x2a, 1),
            WriteEnableBit => (0x2b, 1),
            BusyBit => (0x2d, 1),
            WriteEnableReadRegLen => (0x2f, 1),
            BusyReadRegLen => (0x33, 1),
            ReadStatusReg1 => (0x34, 1),
            TimeEraseSector => (0x48, 2),
            TimePageProgram => (0x4e, 2),
        }
    }

    fn name(self) -> &'static str {
        use self::Field::*;
        match self {
            JedecIdCmd => "jedec_id_cmd",
            JedecIdCmdDmyClk => "jedec_id_cmd_dmy_clk",
            SectorSize => "sector_size",
            Mid => "mid",
            PageSize => "page_size",
            ChipEraseCmd => "chip_erase_cmd",
            SectorEraseCmd => "sector_erase_cmd",
            WriteEnableCmd => "write_enable_cmd",
            PageProgramCmd => "page_program_cmd",
            FastReadCmd => "fast_read_cmd",
            WriteEnableIndex => "write_enable_index",
            BusyIndex => "busy_index",
            WriteEnableBit => "write_enable_bit",
            BusyBit => "busy_bit",
            WriteEnableReadRegLen => "write_enable_read_reg_len",
            BusyReadRegLen => "busy_read_reg_len",
            ReadStatusReg1 => "read_status_reg1",
            TimeEraseSector => "time_erase_sector",
            TimePageProgram => "time_page_program",
        }
    }
}

/// The flash configuration blob passed (by address) to every ROM flash
/// routine.
///
/// This is a plain byte buffer rather than a `#[repr(C)]` struct: its layout
/// is fixed by the ROM and must match byte for byte.
#[derive(Clone, PartialEq, Eq)]
pub struct SflashCfg {
    buf: [u8; SFLASH_CFG_SIZE],
}

impl SflashCfg {
    /// An all-zero blob.
    pub fn zeroed() -> SflashCfg {
        SflashCfg {
            buf: [0; SFLASH_CFG_SIZE],
        }
    }

    /// Wrap a raw blob, e.g. one read back from the target.
    pub fn from_bytes(buf: [u8; SFLASH_CFG_SIZE]) -> SflashCfg {
        SflashCfg { buf }
    }

    /// Read a field.
    pub fn get(&self, field: Field) -> u32 {
        let (offset, width) = field.layout();
        self.buf[offset..offset + width]
            .iter()
            .rev()
            .fold(0, |acc, b| (acc << 8) | *b as u32)
    }

    /// Write a field. `val` is truncated to the field width.
    pub fn set(&mut self, field: Field, val: u32) {
        let (offset, width) = field.layout();
        self.buf[offset..offset + width].copy_from_slice(&val.to_le_bytes()[..width]);
    }

    /// Patch the command set and geometry fields from a detected flash chip.
    ///
    /// Timing fields are left untouched.
    pub fn apply_device(&mut self, dev: &FlashDevice) {
        self.set(Field::PageProgramCmd, dev.pprog_cmd as u32);
        self.set(Field::PageSize, dev.page_size);
        self.set(Field::FastReadCmd, dev.read_cmd as u32);
        self.set(Field::SectorSize, dev.sector_size / 1024);
        self.set(Field::SectorEraseCmd, dev.erase_cmd as u32);
        self.set(Field::ChipEraseCmd, dev.chip_erase_cmd as u32);
        self.set(Field::Mid, dev.manufacturer() as u32);
    }

    /// The raw blob, as uploaded to the target.
    pub fn as_bytes(&self) -> &[u8; SFLASH_CFG_SIZE] {
        &self.buf
    }
}

impl Default for SflashCfg {
    /// Blob with the JEDEC ID command and the generic status register layout
    /// (WEL in bit 1, WIP in bit 0 of status register 1) filled in.
    fn default() -> SflashCfg {
        let mut cfg = SflashCfg::zeroed();
        cfg.set(Field::JedecIdCmd, 0x9f);
        cfg.set(Field::JedecIdCmdDmyClk, 0);
        cfg.set(Field::TimePageProgram, 200);
        cfg.set(Field::WriteEnableCmd, 0x06);
        cfg.set(Field::WriteEnableIndex, 0);
        cfg.set(Field::WriteEnableReadRegLen, 1);
        cfg.set(Field::WriteEnableBit, 1);
        cfg.set(Field::ReadStatusReg1, 0x05);
        cfg.set(Field::BusyIndex, 0);
        cfg.set(Field::BusyReadRegLen, 1);
        cfg.set(Field::BusyBit, 0);
        cfg.set(Field::TimeEraseSector, 0x6464);
        cfg
    }
}

impl fmt::Debug for SflashCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SflashCfg");
        for field in Field::ALL.iter() {
            s.field(field.name(), &format_args!("{:#x}", self.get(*field)));
        }
        s.finish()
    }
}
