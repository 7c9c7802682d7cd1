use log::*;

use crate::error::Error;
use crate::parts::{find_part, FlashPinCfg, PartInfo, RomFn};
use crate::scratch::Scratch;
use crate::sflash::{find_device, FlashDevice, SflashCfg, SFLASH_CFG_SIZE};
use crate::target::{Target, TargetState};

use super::{rom_call, Bank, ProbeState};

/// SPI controller configuration passed to the ROM init routine: owner CPU,
/// default clock delays, clock inversion on, no RX clock inversion.
const SF_CTRL_CFG: [u8; 9] = [0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00];

/// `restore_default` argument of the GPIO init routine.
const GPIO_RESTORE_DEFAULT: u32 = 1;

impl<T: Target> Bank<T> {
    /// Identify the target and its flash chip.
    ///
    /// Does nothing (and touches nothing) if the bank is already probed.
    pub fn probe(&mut self) -> Result<(), Error<T::Error>> {
        self.ensure_probed().map(drop)
    }

    /// Forget everything known about the target and run discovery again.
    pub fn reprobe(&mut self) -> Result<(), Error<T::Error>> {
        self.restart_probe().map(drop)
    }

    /// Initialise the flash hardware and read the chip's 24-bit JEDEC ID.
    ///
    /// Useful to diagnose unrecognised chips. Leaves the probe state alone.
    pub fn read_jedec_id(&mut self) -> Result<u32, Error<T::Error>> {
        let part = self.identify_part()?;
        self.ensure_halted()?;
        self.init_hardware(part)?;
        let jedec_id = self.jedec_id(part)?;
        info!("flash JEDEC ID: {:#08x}", jedec_id);
        Ok(jedec_id)
    }

    pub(super) fn ensure_probed(
        &mut self,
    ) -> Result<(&'static PartInfo, &'static FlashDevice), Error<T::Error>> {
        match (self.state, self.part, self.device) {
            (ProbeState::Ready, Some(part), Some(dev)) => Ok((part, dev)),
            _ => self.restart_probe(),
        }
    }

    fn restart_probe(
        &mut self,
    ) -> Result<(&'static PartInfo, &'static FlashDevice), Error<T::Error>> {
        self.state = ProbeState::Unprobed;
        self.part = None;
        self.device = None;
        self.cfg = SflashCfg::default();

        match self.run_probe() {
            Ok(found) => Ok(found),
            Err(e) => {
                error!("probe failed in state {:?}", self.state);
                self.state = ProbeState::Failed;
                self.device = None;
                Err(e)
            }
        }
    }

    fn run_probe(
        &mut self,
    ) -> Result<(&'static PartInfo, &'static FlashDevice), Error<T::Error>> {
        let part = self.identify_part()?;
        self.part = Some(part);
        self.state = ProbeState::PartIdentified;

        self.ensure_halted()?;
        self.init_hardware(part).map_err(|e| {
            error!("Initialization of flash failed.");
            e
        })?;
        self.state = ProbeState::HardwareInitialized;

        let jedec_id = self.jedec_id(part).map_err(|e| {
            error!("Cannot identify flash JEDEC ID.");
            e
        })?;
        let dev = match find_device(jedec_id) {
            Some(dev) => dev,
            None => {
                error!("Unknown flash device (ID {:#08x})", jedec_id);
                return Err(Error::UnknownFlash { jedec_id });
            }
        };
        info!(
            "Found flash device '{}' (ID {:#08x})",
            dev.name, dev.device_id
        );
        self.device = Some(dev);
        self.state = ProbeState::DeviceIdentified;

        self.cfg.apply_device(dev);
        trace!("patched {:?}", self.cfg);
        self.state = ProbeState::Ready;

        Ok((part, dev))
    }

    fn identify_part(&mut self) -> Result<&'static PartInfo, Error<T::Error>> {
        if self.target.state() == TargetState::Unexamined {
            error!("Target not examined yet");
            return Err(Error::TargetNotExamined);
        }

        let idcode = self.target.idcode();
        match find_part(idcode) {
            Some(part) => {
                debug!("target is a {} (idcode {:#010x})", part.name, idcode);
                Ok(part)
            }
            None => {
                error!(
                    "Cannot identify target as a BL70x family device (idcode {:#010x}).",
                    idcode
                );
                Err(Error::UnknownPart { idcode })
            }
        }
    }

    /// Route the flash pins, then bring up the SPI flash controller.
    fn init_hardware(&mut self, part: &'static PartInfo) -> Result<(), Error<T::Error>> {
        let timeout = self.timeouts.init;

        let pin_cfg = match self.pin_cfg.unwrap_or(part.flash_pin_cfg) {
            FlashPinCfg::Skip => None,
            FlashPinCfg::Fixed(cfg) => Some(cfg),
            FlashPinCfg::Efuse { addr, shift, mask } => {
                let word = self.target.read_u32(addr).map_err(|e| {
                    error!("Failed to read flash pin config @ {:#010x}", addr);
                    Error::Target(e)
                })?;
                // shifting out the whole word leaves nothing
                Some(word.checked_shr(u32::from(shift)).unwrap_or(0) & mask)
            }
        };
        match pin_cfg {
            Some(pin_cfg) => {
                debug!("flash pin config {:#x}", pin_cfg);
                rom_call(
                    &mut self.target,
                    part,
                    RomFn::InitGpio,
                    &[pin_cfg, GPIO_RESTORE_DEFAULT],
                    timeout,
                )?;
            }
            None => debug!("skipping flash GPIO init"),
        }

        let mut ctrl_cfg = Scratch::upload(&mut self.target, &SF_CTRL_CFG)?;
        let ctrl_cfg_addr = ctrl_cfg.address();
        rom_call(&mut *ctrl_cfg, part, RomFn::Init, &[ctrl_cfg_addr], timeout)?;

        Ok(())
    }

    /// Read the JEDEC ID using the current configuration blob.
    fn jedec_id(&mut self, part: &'static PartInfo) -> Result<u32, Error<T::Error>> {
        // [ id: u32 | cfg blob ]
        let mut area = Scratch::lease(&mut self.target, 4 + SFLASH_CFG_SIZE as u32)?;
        let id_addr = area.address();
        let cfg_addr = id_addr + 4;
        area.write_addrs(cfg_addr, self.cfg.as_bytes())
            .map_err(Error::Target)?;

        rom_call(
            &mut *area,
            part,
            RomFn::GetJedecId,
            &[cfg_addr, id_addr],
            self.timeouts.init,
        )?;

        let raw = area.read_u32(id_addr).map_err(|e| {
            error!("Failed to read flash id from target");
            Error::Target(e)
        })?;
        trace!("raw JEDEC ID word {:#010x}", raw);

        Ok(raw & 0x00ff_ffff)
    }
}
