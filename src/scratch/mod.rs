//! Scoped leases of target scratch memory ("working areas").
//!
//! Scratch memory is a scarce, fixed-size resource on the target. Every user
//! in this crate takes a [`Scratch`] lease, which releases its region when it
//! goes out of scope, on every exit path.
//!
//! A lease mutably borrows the target and dereferences to it, so a second
//! lease is taken *through* the first:
//!
//! ```rust,ignore
//! let mut cfg = Scratch::lease(target, 84)?;
//! let cfg_addr = cfg.address();
//! let mut bounce = Scratch::lease(&mut *cfg, 256)?;
//! // ... use `&mut *bounce` as the target ...
//! // `bounce` is released before `cfg`
//! ```

use core::ops::{Deref, DerefMut};

use log::*;

use crate::error::Error;
use crate::target::Target;

mod pool;

pub use pool::{ScratchPool, MAX_BLOCKS};

/// A leased region of target scratch memory.
///
/// The region is released when the lease is dropped.
#[derive(Debug)]
pub struct Scratch<'a, T: Target> {
    target: &'a mut T,
    addr: u32,
    size: u32,
}

impl<'a, T: Target> Scratch<'a, T> {
    /// Lease `size` bytes of scratch memory on `target`.
    pub fn lease(target: &'a mut T, size: u32) -> Result<Scratch<'a, T>, Error<T::Error>> {
        match target.alloc_working_area(size) {
            Some(addr) => {
                trace!("leased {} bytes of scratch memory @ {:#010x}", size, addr);
                Ok(Scratch { target, addr, size })
            }
            None => {
                let available = target.working_area_avail();
                warn!(
                    "no working area available: requested {} bytes, {} available",
                    size, available
                );
                Err(Error::ResourceUnavailable {
                    requested: size,
                    available,
                })
            }
        }
    }

    /// Lease scratch memory and fill it with `data`.
    ///
    /// The region is released again if the upload fails.
    pub fn upload(target: &'a mut T, data: &[u8]) -> Result<Scratch<'a, T>, Error<T::Error>> {
        let area = Scratch::lease(target, data.len() as u32)?;
        let addr = area.addr;
        area.target.write_addrs(addr, data).map_err(Error::Target)?;
        Ok(area)
    }

    /// Target address of the leased region.
    pub fn address(&self) -> u32 {
        self.addr
    }

    /// Size of the leased region, as requested.
    pub fn size(&self) -> u32 {
        self.size
    }
}

impl<T: Target> Deref for Scratch<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: Target> DerefMut for Scratch<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: Target> Drop for Scratch<'_, T> {
    fn drop(&mut self) {
        trace!("releasing scratch memory @ {:#010x}", self.addr);
        self.target.free_working_area(self.addr);
    }
}
