use core::cmp::min;

use log::*;

use crate::error::Error;
use crate::parts::RomFn;
use crate::scratch::Scratch;
use crate::target::Target;

use super::{rom_call_checked, Bank};

/// ROM read/program I/O mode: single-line SPI.
const IO_MODE_NORMAL: u32 = 0;
/// Continuous ("XIP") read mode is never used.
const CONT_READ_OFF: u32 = 0;

/// Size of the bounce buffer to lease for a transfer of `count` bytes, when
/// the largest free scratch block is `avail` bytes.
///
/// One page of scratch is left free when possible, but at least one page is
/// always requested, and never more than `count`.
pub(crate) fn bounce_size(avail: u32, page_size: u32, count: u32) -> u32 {
    let pages = (avail / page_size).saturating_sub(1).max(1);
    min(pages.saturating_mul(page_size), count)
}

/// Number of bytes of a `len`-byte transfer at `offset` that fit on a device
/// of `size` bytes.
fn clamp_len<E>(offset: u32, len: usize, size: u32, what: &str) -> Result<u32, Error<E>> {
    if offset > size {
        error!(
            "{} offset {:#010x} is past the end of flash ({:#x} bytes)",
            what, offset, size
        );
        return Err(Error::OffsetOutOfRange { offset, size });
    }

    let room = size - offset;
    if len > room as usize {
        warn!(
            "{} past end of flash. Extra data discarded ({} of {} bytes kept).",
            what, room, len
        );
        Ok(room)
    } else {
        Ok(len as u32)
    }
}

impl<T: Target> Bank<T> {
    /// Erase sectors `first..=last`, in ascending order.
    ///
    /// Stops at the first sector the ROM fails to erase; sectors before it
    /// stay erased.
    pub fn erase(&mut self, first: u32, last: u32) -> Result<(), Error<T::Error>> {
        self.ensure_halted()?;
        let (part, dev) = self.ensure_probed()?;

        let num_sectors = dev.num_sectors();
        if first > last || last >= num_sectors {
            error!(
                "invalid sector range {}..={} ({} sectors)",
                first, last, num_sectors
            );
            return Err(Error::InvalidSectorRange {
                first,
                last,
                num_sectors,
            });
        }

        let timeout = self.timeouts.erase;
        let mut cfg = Scratch::upload(&mut self.target, self.cfg.as_bytes())?;
        let cfg_addr = cfg.address();

        for sector in first..=last {
            debug!(
                "erasing sector {} @ {:#010x}",
                sector,
                sector * dev.sector_size
            );
            rom_call_checked(
                &mut *cfg,
                part,
                RomFn::EraseSector,
                &[cfg_addr, sector],
                timeout,
            )
            .map_err(|e| {
                error!("Failed to erase sector {}", sector);
                e
            })?;
        }

        Ok(())
    }

    /// Program `buf` at `offset`, returning the number of bytes written.
    ///
    /// Data past the end of flash is discarded (and logged). The flash must
    /// have been erased beforehand.
    pub fn write(&mut self, buf: &[u8], offset: u32) -> Result<usize, Error<T::Error>> {
        self.ensure_halted()?;
        let (part, dev) = self.ensure_probed()?;
        debug!(
            "write: size={:#x} offset={:#010x} count={:#x}",
            dev.size_in_bytes,
            offset,
            buf.len()
        );

        let count = clamp_len(offset, buf.len(), dev.size_in_bytes, "Write")?;
        if count == 0 {
            return Ok(0);
        }
        let buf = &buf[..count as usize];

        let timeout = self.timeouts.io;
        let mut cfg = Scratch::upload(&mut self.target, self.cfg.as_bytes())?;
        let cfg_addr = cfg.address();
        let chunk_size = bounce_size(cfg.working_area_avail(), dev.page_size, count);
        let mut bounce = Scratch::lease(&mut *cfg, chunk_size)?;
        let bounce_addr = bounce.address();

        let mut offset = offset;
        for chunk in buf.chunks(chunk_size as usize) {
            let len = chunk.len() as u32;
            debug!("Writing {} bytes to offset {:#010x}", len, offset);

            bounce.write_addrs(bounce_addr, chunk).map_err(|e| {
                error!("Could not load data into target bounce buffer");
                Error::Target(e)
            })?;
            rom_call_checked(
                &mut *bounce,
                part,
                RomFn::Program,
                &[cfg_addr, IO_MODE_NORMAL, offset, bounce_addr, len],
                timeout,
            )
            .map_err(|e| {
                error!("Failed to program flash @ {:#010x}", offset);
                e
            })?;

            offset += len;
        }

        Ok(count as usize)
    }

    /// Fill `buf` from flash at `offset`, returning the number of bytes read.
    ///
    /// A request running past the end of flash is truncated (and logged); the
    /// tail of `buf` is left untouched.
    pub fn read(&mut self, buf: &mut [u8], offset: u32) -> Result<usize, Error<T::Error>> {
        self.ensure_halted()?;
        let (part, dev) = self.ensure_probed()?;
        debug!(
            "read: size={:#x} offset={:#010x} count={:#x}",
            dev.size_in_bytes,
            offset,
            buf.len()
        );

        let count = clamp_len(offset, buf.len(), dev.size_in_bytes, "Read")?;
        if count == 0 {
            return Ok(0);
        }
        let buf = &mut buf[..count as usize];

        let timeout = self.timeouts.io;
        let mut cfg = Scratch::upload(&mut self.target, self.cfg.as_bytes())?;
        let cfg_addr = cfg.address();
        let chunk_size = bounce_size(cfg.working_area_avail(), dev.page_size, count);
        let mut bounce = Scratch::lease(&mut *cfg, chunk_size)?;
        let bounce_addr = bounce.address();

        let mut offset = offset;
        for chunk in buf.chunks_mut(chunk_size as usize) {
            let len = chunk.len() as u32;
            debug!("Reading {} bytes from offset {:#010x}", len, offset);

            rom_call_checked(
                &mut *bounce,
                part,
                RomFn::Read,
                &[
                    cfg_addr,
                    IO_MODE_NORMAL,
                    CONT_READ_OFF,
                    offset,
                    bounce_addr,
                    len,
                ],
                timeout,
            )
            .map_err(|e| {
                error!("Failed to read flash @ {:#010x}", offset);
                e
            })?;
            bounce.read_addrs(bounce_addr, chunk).map_err(|e| {
                error!("Could not read data from target bounce buffer");
                Error::Target(e)
            })?;

            offset += len;
        }

        Ok(count as usize)
    }

    /// Check which of sectors `first..=last` read back fully erased (`0xff`).
    ///
    /// `is_blank` is called once per sector, in ascending order. `scratch` is
    /// host-side staging memory; its size sets the read granularity.
    pub fn blank_check(
        &mut self,
        first: u32,
        last: u32,
        scratch: &mut [u8],
        mut is_blank: impl FnMut(u32, bool),
    ) -> Result<(), Error<T::Error>> {
        self.ensure_halted()?;
        let (_, dev) = self.ensure_probed()?;

        let num_sectors = dev.num_sectors();
        if first > last || last >= num_sectors || scratch.is_empty() {
            error!(
                "invalid blank check range {}..={} ({} sectors)",
                first, last, num_sectors
            );
            return Err(Error::InvalidSectorRange {
                first,
                last,
                num_sectors,
            });
        }

        for sector in first..=last {
            let start = sector * dev.sector_size;
            let end = start + dev.sector_size;
            let mut blank = true;
            let mut offset = start;
            while offset < end && blank {
                let len = min(scratch.len() as u32, end - offset) as usize;
                let n = self.read(&mut scratch[..len], offset)?;
                blank = scratch[..n].iter().all(|b| *b == 0xff);
                offset += n as u32;
            }
            debug!("sector {} is {}blank", sector, if blank { "" } else { "not " });
            is_blank(sector, blank);
        }

        Ok(())
    }
}
