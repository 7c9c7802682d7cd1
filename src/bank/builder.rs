use core::fmt::{self, Display};
use core::time::Duration;

use crate::parts::FlashPinCfg;
use crate::target::Target;

use super::{Bank, Timeouts, DEFAULT_WRITE_ALIGNMENT};

/// An error which may occur when building a [`Bank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankBuilderError {
    /// Write alignment must be a nonzero power of two.
    InvalidWriteAlignment(u32),
    /// Timeouts must be nonzero.
    ZeroTimeout,
    /// An efuse pin config must shift by less than the word width.
    InvalidEfuseShift(u8),
}

impl Display for BankBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::BankBuilderError::*;
        match self {
            InvalidWriteAlignment(align) => write!(
                f,
                "Write alignment must be a nonzero power of two, got {}.",
                align
            ),
            ZeroTimeout => write!(f, "ROM call timeouts must be nonzero."),
            InvalidEfuseShift(shift) => write!(
                f,
                "Efuse pin config shift must be below 32, got {}.",
                shift
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BankBuilderError {}

/// Helper to construct and customize a [`Bank`].
pub struct BankBuilder<T: Target> {
    target: T,
    timeouts: Timeouts,
    write_alignment: u32,
    pin_cfg: Option<FlashPinCfg>,
}

impl<T: Target> BankBuilder<T> {
    /// Create a new `BankBuilder` for the provided target.
    pub fn new(target: T) -> BankBuilder<T> {
        BankBuilder {
            target,
            timeouts: Timeouts::default(),
            write_alignment: DEFAULT_WRITE_ALIGNMENT,
            pin_cfg: None,
        }
    }

    /// Timeout for the GPIO init, controller init and JEDEC ID calls.
    /// Defaults to 3 seconds.
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.init = timeout;
        self
    }

    /// Timeout for erasing a single sector. Defaults to 20 seconds.
    pub fn erase_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.erase = timeout;
        self
    }

    /// Timeout for programming or reading one bounce-buffer chunk. Defaults
    /// to 3 seconds.
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.io = timeout;
        self
    }

    /// Timeout for raw [`Bank::call`]s. Defaults to 5 seconds.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.call = timeout;
        self
    }

    /// Write alignment reported to the caller. Defaults to 8 bytes.
    pub fn write_alignment(mut self, align: u32) -> Self {
        self.write_alignment = align;
        self
    }

    /// Override the part's flash pin configuration, e.g. for boards that
    /// route the flash to non-default pins.
    pub fn pin_cfg(mut self, pin_cfg: FlashPinCfg) -> Self {
        self.pin_cfg = Some(pin_cfg);
        self
    }

    /// Build the Bank, returning an error if something went wrong.
    pub fn build(self) -> Result<Bank<T>, BankBuilderError> {
        if !self.write_alignment.is_power_of_two() {
            return Err(BankBuilderError::InvalidWriteAlignment(
                self.write_alignment,
            ));
        }

        let t = &self.timeouts;
        let timeouts = [t.init, t.erase, t.io, t.call];
        if timeouts.iter().any(|t| *t == Duration::ZERO) {
            return Err(BankBuilderError::ZeroTimeout);
        }

        if let Some(FlashPinCfg::Efuse { shift, .. }) = self.pin_cfg {
            if shift >= 32 {
                return Err(BankBuilderError::InvalidEfuseShift(shift));
            }
        }

        let mut bank = Bank::new(self.target);
        bank.timeouts = self.timeouts;
        bank.write_alignment = self.write_alignment;
        bank.pin_cfg = self.pin_cfg;
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::sim::SimTarget;

    #[test]
    fn defaults() {
        let bank = BankBuilder::new(SimTarget::new()).build().unwrap();
        assert_eq!(bank.write_alignment(), 8);
        assert_eq!(bank.timeouts.init, Duration::from_secs(3));
        assert_eq!(bank.timeouts.erase, Duration::from_secs(20));
        assert_eq!(bank.timeouts.io, Duration::from_secs(3));
        assert_eq!(bank.timeouts.call, Duration::from_secs(5));
        assert_eq!(bank.pin_cfg, None);
    }

    #[test]
    fn rejects_bad_alignment() {
        for &align in &[0, 3, 12] {
            let res = Bank::builder(SimTarget::new())
                .write_alignment(align)
                .build();
            assert_eq!(
                res.err(),
                Some(BankBuilderError::InvalidWriteAlignment(align))
            );
        }
        assert!(Bank::builder(SimTarget::new())
            .write_alignment(256)
            .build()
            .is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let res = Bank::builder(SimTarget::new())
            .erase_timeout(Duration::from_secs(0))
            .build();
        assert_eq!(res.err(), Some(BankBuilderError::ZeroTimeout));

        let res = Bank::builder(SimTarget::new())
            .call_timeout(Duration::from_secs(0))
            .build();
        assert_eq!(res.err(), Some(BankBuilderError::ZeroTimeout));
    }

    #[test]
    fn rejects_efuse_shift_past_word() {
        let efuse = |shift| FlashPinCfg::Efuse {
            addr: 0x4000_7074,
            shift,
            mask: 0x3f,
        };
        let res = Bank::builder(SimTarget::new()).pin_cfg(efuse(32)).build();
        assert_eq!(res.err(), Some(BankBuilderError::InvalidEfuseShift(32)));
        assert!(Bank::builder(SimTarget::new())
            .pin_cfg(efuse(31))
            .build()
            .is_ok());
    }
}
