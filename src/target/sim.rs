//! A simulated BL702 hart, for tests.
//!
//! Only the injected trampoline is "executed": the first instruction must be a
//! `jalr`, whose target is looked up among a handful of fake function
//! addresses. The boot-ROM flash routines operate on an in-memory NOR array.

use std::collections::HashMap;
use std::time::Duration;

use crate::arch::riscv::opcodes;
use crate::arch::riscv::reg::id::{X_A0, X_RA};
use crate::arch::riscv::RiscvRegId;
use crate::parts::{find_part, PartInfo, RomFn};
use crate::scratch::ScratchPool;
use crate::sflash::{find_device, Field, SflashCfg, SFLASH_CFG_SIZE};

use super::{Direction, RegParam, StopReason, Target, TargetState};

pub const IDCODE: u32 = 0x2000_0e05;
pub const RAM_BASE: u32 = 0x2201_4000;
pub const DEFAULT_WORKING_AREA: u32 = 16 * 1024;
/// gd25q16c, 2 MiB
pub const DEFAULT_JEDEC_ID: u32 = 0x0015_40c8;

const ROM_CODE_BASE: u32 = 0x2100_1000;
const ECHO_FN: u32 = 0x2100_2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    NotHalted,
    BadAddress(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    Alloc {
        addr: u32,
        size: u32,
    },
    Free(u32),
    Read {
        addr: u32,
        len: usize,
    },
    Write {
        addr: u32,
        len: usize,
    },
    Run {
        entry: u32,
        exit: u32,
        params: Vec<RegParam>,
    },
    RomCall {
        func: RomFn,
        args: Vec<u32>,
    },
}

#[derive(Debug)]
pub struct SimTarget {
    state: TargetState,
    idcode: u32,
    jedec_id: u32,
    part: &'static PartInfo,
    pool: ScratchPool,
    mem: HashMap<u32, u8>,
    regs: [u32; 32],
    flash: Vec<u8>,
    spi_ready: bool,
    ctrl_cfg: Option<Vec<u8>>,
    events: Vec<SimEvent>,
    fail_status: Option<(RomFn, usize, u32)>,
    timeout_on: Option<RomFn>,
    fail_reads_at: Option<u32>,
}

fn arity(func: RomFn) -> usize {
    match func {
        RomFn::GetJedecId => 2,
        RomFn::InitGpio => 2,
        RomFn::Init => 1,
        RomFn::Program => 5,
        RomFn::Read => 6,
        RomFn::EraseSector => 2,
    }
}

impl SimTarget {
    pub fn new() -> SimTarget {
        let _ = pretty_env_logger::try_init();

        let part = match find_part(IDCODE) {
            Some(part) => part,
            None => panic!("simulated part missing from the part table"),
        };

        let mut sim = SimTarget {
            state: TargetState::Halted,
            idcode: IDCODE,
            jedec_id: 0,
            part,
            pool: ScratchPool::new(RAM_BASE, DEFAULT_WORKING_AREA),
            mem: HashMap::new(),
            regs: [0; 32],
            flash: Vec::new(),
            spi_ready: false,
            ctrl_cfg: None,
            events: Vec::new(),
            fail_status: None,
            timeout_on: None,
            fail_reads_at: None,
        };
        for func in RomFn::ALL.iter() {
            let entry = sim.rom_entry(*func);
            sim.poke_u32(part.rom.slot(*func), entry);
        }
        sim.with_jedec_id(DEFAULT_JEDEC_ID)
    }

    pub fn with_working_area_size(mut self, size: u32) -> SimTarget {
        self.pool = ScratchPool::new(RAM_BASE, size);
        self
    }

    /// Also resizes the flash array to the chip's capacity (1 MiB if the chip
    /// is unknown).
    pub fn with_jedec_id(mut self, jedec_id: u32) -> SimTarget {
        let size = find_device(jedec_id).map_or(0x10_0000, |d| d.size_in_bytes);
        self.jedec_id = jedec_id;
        self.flash = vec![0xff; size as usize];
        self
    }

    pub fn with_idcode(mut self, idcode: u32) -> SimTarget {
        self.idcode = idcode;
        self
    }

    pub fn set_state(&mut self, state: TargetState) {
        self.state = state;
    }

    pub fn part(&self) -> &'static PartInfo {
        self.part
    }

    /// Fake code address of a ROM routine.
    pub fn rom_entry(&self, func: RomFn) -> u32 {
        let idx = RomFn::ALL.iter().position(|f| *f == func).unwrap_or(0);
        ROM_CODE_BASE + 0x10 * idx as u32
    }

    /// A function returning the sum of `a0`-`a5`.
    pub fn echo_fn(&self) -> u32 {
        ECHO_FN
    }

    /// Make the `nth` (zero based) call to `func` return `status`.
    pub fn fail_on(&mut self, func: RomFn, nth: usize, status: u32) {
        self.fail_status = Some((func, nth, status));
    }

    /// Make every call to `func` hang.
    pub fn timeout_on(&mut self, func: RomFn) {
        self.timeout_on = Some(func);
    }

    /// Fail debug-link reads covering `addr`.
    pub fn fail_reads_at(&mut self, addr: u32) {
        self.fail_reads_at = Some(addr);
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn count(&self, f: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| f(e)).count()
    }

    /// Arguments of every call made to `func`, in order.
    pub fn rom_calls(&self, func: RomFn) -> Vec<Vec<u32>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SimEvent::RomCall { func: f, args } if *f == func => Some(args.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn scratch_in_use(&self) -> usize {
        self.pool.leased()
    }

    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.flash
    }

    pub fn poke_u32(&mut self, addr: u32, val: u32) {
        self.store(addr, &val.to_le_bytes());
    }

    /// Controller config handed to the most recent Init call, as the ROM saw
    /// it.
    pub fn ctrl_cfg(&self) -> Option<&[u8]> {
        self.ctrl_cfg.as_deref()
    }

    pub fn peek(&self, addr: u32, len: usize) -> Vec<u8> {
        let mut buf = vec![0; len];
        self.load(addr, &mut buf);
        buf
    }

    fn load(&self, addr: u32, data: &mut [u8]) {
        for (i, b) in data.iter_mut().enumerate() {
            *b = self.mem.get(&(addr + i as u32)).copied().unwrap_or(0);
        }
    }

    fn store(&mut self, addr: u32, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.mem.insert(addr + i as u32, *b);
        }
    }

    fn load_u32(&self, addr: u32) -> u32 {
        let mut buf = [0; 4];
        self.load(addr, &mut buf);
        u32::from_le_bytes(buf)
    }

    fn reg(&self, n: u8) -> u32 {
        match n {
            0 => 0,
            n => self.regs[n as usize & 0x1f],
        }
    }

    fn set_reg(&mut self, n: u8, val: u32) {
        if n != 0 {
            self.regs[n as usize & 0x1f] = val;
        }
    }

    fn arg(&self, i: usize) -> u32 {
        self.reg(X_A0 + i as u8)
    }

    fn rom_fn_at(&self, addr: u32) -> Option<RomFn> {
        RomFn::ALL
            .iter()
            .copied()
            .find(|f| self.rom_entry(*f) == addr)
    }

    fn cfg_at(&self, addr: u32) -> SflashCfg {
        let mut buf = [0; SFLASH_CFG_SIZE];
        self.load(addr, &mut buf);
        SflashCfg::from_bytes(buf)
    }

    /// Runs a ROM routine to completion, returning its status code.
    fn exec_rom(&mut self, func: RomFn) -> u32 {
        let args: Vec<u32> = (0..arity(func)).map(|i| self.arg(i)).collect();
        let nth = self
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::RomCall { func: f, .. } if *f == func))
            .count();
        self.events.push(SimEvent::RomCall {
            func,
            args: args.clone(),
        });

        if let Some((f, n, status)) = self.fail_status {
            if f == func && n == nth {
                return status;
            }
        }

        match func {
            RomFn::InitGpio => 0,
            RomFn::Init => {
                self.ctrl_cfg = Some(self.peek(args[0], 9));
                self.spi_ready = true;
                0
            }
            RomFn::GetJedecId => {
                let cfg = self.cfg_at(args[0]);
                let id = if self.spi_ready && cfg.get(Field::JedecIdCmd) == 0x9f {
                    self.jedec_id
                } else {
                    0x00ff_ffff
                };
                let mut bytes = id.to_le_bytes();
                // the ROM only fills in three bytes
                bytes[3] = 0xa5;
                self.store(args[1], &bytes);
                0
            }
            RomFn::Program => {
                let (offset, data, len) = (args[2] as usize, args[3], args[4] as usize);
                if offset + len > self.flash.len() {
                    return 1;
                }
                let src = self.peek(data, len);
                for (dst, b) in self.flash[offset..offset + len].iter_mut().zip(src) {
                    *dst &= b;
                }
                0
            }
            RomFn::Read => {
                let (offset, data, len) = (args[3] as usize, args[4], args[5] as usize);
                if offset + len > self.flash.len() {
                    return 1;
                }
                let src = self.flash[offset..offset + len].to_vec();
                self.store(data, &src);
                0
            }
            RomFn::EraseSector => {
                let cfg = self.cfg_at(args[0]);
                let sector_size = cfg.get(Field::SectorSize) as usize * 1024;
                let start = args[1] as usize * sector_size;
                if sector_size == 0 || start + sector_size > self.flash.len() {
                    return 1;
                }
                for b in &mut self.flash[start..start + sector_size] {
                    *b = 0xff;
                }
                0
            }
        }
    }
}

impl Target for SimTarget {
    type Error = SimError;

    fn state(&mut self) -> TargetState {
        self.state
    }

    fn idcode(&mut self) -> u32 {
        self.idcode
    }

    fn read_addrs(&mut self, addr: u32, data: &mut [u8]) -> Result<(), SimError> {
        self.events.push(SimEvent::Read {
            addr,
            len: data.len(),
        });
        if let Some(bad) = self.fail_reads_at {
            if bad >= addr && bad < addr + data.len() as u32 {
                return Err(SimError::BadAddress(bad));
            }
        }
        self.load(addr, data);
        Ok(())
    }

    fn write_addrs(&mut self, addr: u32, data: &[u8]) -> Result<(), SimError> {
        self.events.push(SimEvent::Write {
            addr,
            len: data.len(),
        });
        self.store(addr, data);
        Ok(())
    }

    fn run_algorithm(
        &mut self,
        params: &mut [RegParam],
        entry: u32,
        exit: u32,
        _timeout: Duration,
    ) -> Result<StopReason, SimError> {
        if self.state != TargetState::Halted {
            return Err(SimError::NotHalted);
        }
        self.events.push(SimEvent::Run {
            entry,
            exit,
            params: params.to_vec(),
        });

        for p in params.iter() {
            match p.reg {
                RiscvRegId::Gpr(n) if p.direction.contains(Direction::WRITE) => {
                    self.set_reg(n, p.value)
                }
                _ => {}
            }
        }

        let (rd, rs1, imm) = match opcodes::decode_jalr(self.load_u32(entry)) {
            Some(insn) => insn,
            None => return Ok(StopReason::Halted { pc: entry }),
        };
        let func = self.reg(rs1).wrapping_add(imm as i32 as u32);
        self.set_reg(rd, entry + 4);

        if func == ECHO_FN {
            let sum = (0..6).map(|i| self.arg(i)).sum();
            self.set_reg(X_A0, sum);
        } else if let Some(rom_fn) = self.rom_fn_at(func) {
            if self.timeout_on == Some(rom_fn) {
                self.exec_rom(rom_fn);
                return Ok(StopReason::Timeout);
            }
            let status = self.exec_rom(rom_fn);
            self.set_reg(X_A0, status);
        } else {
            // no code there: fault on the first fetch
            return Ok(StopReason::Halted { pc: func });
        }

        let pc = self.reg(X_RA);
        if !opcodes::is_ebreak(self.load_u32(pc)) {
            return Ok(StopReason::Timeout);
        }

        for p in params.iter_mut() {
            match p.reg {
                RiscvRegId::Gpr(n) if p.direction.contains(Direction::READ) => {
                    p.value = self.reg(n)
                }
                _ => {}
            }
        }

        Ok(StopReason::Halted { pc })
    }

    fn alloc_working_area(&mut self, size: u32) -> Option<u32> {
        let addr = self.pool.alloc(size)?;
        self.events.push(SimEvent::Alloc { addr, size });
        Some(addr)
    }

    fn free_working_area(&mut self, addr: u32) {
        self.events.push(SimEvent::Free(addr));
        self.pool.free(addr);
    }

    fn working_area_avail(&self) -> u32 {
        self.pool.avail()
    }
}
