use log::*;

/// Maximum number of blocks (leased or free) a [`ScratchPool`] tracks.
pub const MAX_BLOCKS: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
struct Block {
    addr: u32,
    size: u32,
    free: bool,
}

/// First-fit bookkeeping for a fixed window of target scratch memory.
///
/// `ScratchPool` never touches the target: it only tracks which parts of the
/// window are leased. [`Target`](crate::target::Target) implementations
/// backed by transports without their own working-area support can forward
/// `alloc_working_area` / `free_working_area` / `working_area_avail` to it.
///
/// Sizes are rounded up to a multiple of 4 bytes. Adjacent free blocks are
/// merged on release.
#[derive(Debug, Clone)]
pub struct ScratchPool {
    blocks: [Block; MAX_BLOCKS],
    len: usize,
}

impl ScratchPool {
    /// Manage `size` bytes of scratch memory starting at `base`.
    ///
    /// `base` must be word-aligned. `size` is rounded down to a multiple of 4.
    pub fn new(base: u32, size: u32) -> ScratchPool {
        let mut blocks = [Block::default(); MAX_BLOCKS];
        let size = size & !3;
        blocks[0] = Block {
            addr: base,
            size,
            free: true,
        };

        ScratchPool {
            blocks,
            len: if size > 0 { 1 } else { 0 },
        }
    }

    /// Lease `size` bytes, returning the block address.
    pub fn alloc(&mut self, size: u32) -> Option<u32> {
        if size == 0 {
            return None;
        }
        let size = size.checked_add(3)? & !3;

        let idx = self.blocks[..self.len]
            .iter()
            .position(|b| b.free && b.size >= size)?;
        let block = self.blocks[idx];

        // hand out the whole block if there's no slot left to track the tail
        if block.size > size && self.len < MAX_BLOCKS {
            self.blocks.copy_within(idx + 1..self.len, idx + 2);
            self.blocks[idx + 1] = Block {
                addr: block.addr + size,
                size: block.size - size,
                free: true,
            };
            self.blocks[idx].size = size;
            self.len += 1;
        }
        self.blocks[idx].free = false;

        Some(block.addr)
    }

    /// Release the lease at `addr`. Returns `false` (and logs) if `addr` is
    /// not currently leased.
    pub fn free(&mut self, addr: u32) -> bool {
        let idx = match self.blocks[..self.len]
            .iter()
            .position(|b| b.addr == addr && !b.free)
        {
            Some(idx) => idx,
            None => {
                warn!("ignoring release of unknown scratch block @ {:#010x}", addr);
                return false;
            }
        };

        self.blocks[idx].free = true;

        if idx + 1 < self.len && self.blocks[idx + 1].free {
            self.blocks[idx].size += self.blocks[idx + 1].size;
            self.remove(idx + 1);
        }
        if idx > 0 && self.blocks[idx - 1].free {
            self.blocks[idx - 1].size += self.blocks[idx].size;
            self.remove(idx);
        }

        true
    }

    /// Size of the largest free block.
    pub fn avail(&self) -> u32 {
        self.blocks[..self.len]
            .iter()
            .filter(|b| b.free)
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    /// Number of blocks currently leased.
    pub fn leased(&self) -> usize {
        self.blocks[..self.len].iter().filter(|b| !b.free).count()
    }

    fn remove(&mut self, idx: usize) {
        self.blocks.copy_within(idx + 1..self.len, idx);
        self.len -= 1;
    }
}
