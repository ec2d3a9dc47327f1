//! # E-fuse controller
//!
//! ## Overview
//!
//! The RK312x e-fuse array has no read engine: software drives chip select,
//! load mode, address lines and the strobe pin through the `CTRL` register
//! and samples each byte from `DOUT`. Each step must be held for a few
//! microseconds, so the whole sequence runs with interrupts masked and
//! busy-waits between steps.
//!
//! ## Configuration
//!
//! The hold times can be tuned with [`Config`]. By default every step is held
//! for 2 µs and chip select for 1 µs after release.
//!
//! ## Examples
//!
//! ```rust, no_run
//! # use embedded_hal::delay::DelayNs;
//! # fn run(delay: impl DelayNs) -> Result<(), rk_efuse::Error> {
//! use rk_efuse::{Config, EfuseController, backend::Mmio, soc::EFUSE_PHYS};
//!
//! // Identity-mapped register window.
//! let window = unsafe { Mmio::new(EFUSE_PHYS) };
//! let mut efuse = EfuseController::new(window, delay, Config::default());
//!
//! let mut id = [0u8; 4];
//! efuse.read(0, &mut id)?;
//! # Ok(())
//! # }
//! ```

use embedded_hal::delay::DelayNs;
use rk_sync::RawMutex;

use crate::{
    Error,
    backend::RegisterBackend,
    regs::{Ctrl, REG_EFUSE_CTRL, REG_EFUSE_DOUT},
};

// All controllers share the same register window on a given SoC.
static EFUSE_LOCK: RawMutex = RawMutex::new();

/// Controller timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct Config {
    /// Hold time, in microseconds, around every control step.
    settle_us: u32,
    /// Hold time, in microseconds, after chip select is released.
    release_us: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_us: 2,
            release_us: 1,
        }
    }
}

impl Config {
    /// Assign the given value to the `settle_us` field.
    #[must_use]
    pub fn with_settle_us(mut self, settle_us: u32) -> Self {
        self.settle_us = settle_us;
        self
    }

    /// Assign the given value to the `release_us` field.
    #[must_use]
    pub fn with_release_us(mut self, release_us: u32) -> Self {
        self.release_us = release_us;
        self
    }

    /// Hold time around every control step.
    pub fn settle_us(&self) -> u32 {
        self.settle_us
    }

    /// Hold time after chip select is released.
    pub fn release_us(&self) -> u32 {
        self.release_us
    }
}

/// E-fuse controller driver
pub struct EfuseController<B, D> {
    backend: B,
    delay: D,
    config: Config,
}

impl<B, D> EfuseController<B, D>
where
    B: RegisterBackend,
    D: DelayNs,
{
    /// Create a new controller over the given register window.
    pub fn new(backend: B, delay: D, config: Config) -> Self {
        Self {
            backend,
            delay,
            config,
        }
    }

    /// Change the controller configuration
    pub fn apply_config(&mut self, config: &Config) {
        self.config = *config;
    }

    /// Check that the register window is present.
    pub fn probe(&self) -> Result<(), Error> {
        if self.backend.is_mapped() {
            Ok(())
        } else {
            Err(Error::DeviceUnavailable)
        }
    }

    /// Read `buf.len()` bytes of fuse content starting at fuse byte `addr`.
    ///
    /// Returns the number of bytes read. An empty `buf` is a no-op returning
    /// `Ok(0)` without touching the hardware.
    ///
    /// Addresses beyond the 10-bit address field wrap around.
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        self.probe()?;

        trace!("reading {} e-fuse bytes at {}", buf.len(), addr);

        EFUSE_LOCK.lock_non_reentrant(|| self.read_locked(addr, buf));

        Ok(buf.len())
    }

    fn read_locked(&mut self, mut addr: u32, buf: &mut [u8]) {
        let settle = self.config.settle_us;

        // Select the array in load mode with programming disabled.
        self.write_ctrl(Ctrl::CSB);
        self.write_ctrl(Ctrl::LOAD | Ctrl::PGENB);
        self.delay.delay_us(settle);

        for byte in buf.iter_mut() {
            self.modify_ctrl(|ctrl| ctrl.without_address());
            self.modify_ctrl(|ctrl| ctrl | Ctrl::address_bits(addr));
            self.delay.delay_us(settle);

            self.modify_ctrl(|ctrl| ctrl | Ctrl::STROBE);
            self.delay.delay_us(settle);

            *byte = self.backend.read(REG_EFUSE_DOUT) as u8;

            self.modify_ctrl(|ctrl| ctrl - Ctrl::STROBE);
            self.delay.delay_us(settle);

            addr = addr.wrapping_add(1);
        }

        self.delay.delay_us(settle);
        self.modify_ctrl(|ctrl| ctrl | Ctrl::CSB);
        self.delay.delay_us(self.config.release_us);
    }

    fn read_ctrl(&self) -> Ctrl {
        Ctrl::from_bits_retain(self.backend.read(REG_EFUSE_CTRL))
    }

    fn write_ctrl(&mut self, ctrl: Ctrl) {
        self.backend.write(REG_EFUSE_CTRL, ctrl.bits());
    }

    fn modify_ctrl(&mut self, f: impl FnOnce(Ctrl) -> Ctrl) {
        let ctrl = f(self.read_ctrl());
        self.write_ctrl(ctrl);
    }

    /// Release the register window and the delay provider.
    pub fn free(self) -> (B, D) {
        (self.backend, self.delay)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::vec::Vec;

    use super::*;

    /// Emulates the fuse array behind the register pair.
    ///
    /// A rising edge of `STROBE` latches `fuse(n, address)` into `DOUT`,
    /// where `n` counts strobes since creation.
    pub(crate) struct MockEfuse {
        ctrl: u32,
        dout: u32,
        fuse: fn(usize, u32) -> u8,
        pub(crate) mapped: bool,
        /// Every value written to `CTRL`, in order.
        pub(crate) writes: Vec<u32>,
        pub(crate) strobes: Vec<u32>,
    }

    impl MockEfuse {
        pub(crate) fn new(fuse: fn(usize, u32) -> u8) -> Self {
            Self {
                ctrl: 0,
                dout: 0,
                fuse,
                mapped: true,
                writes: Vec::new(),
                strobes: Vec::new(),
            }
        }

        /// Returns the strobe ordinal for every strobe, regardless of address.
        pub(crate) fn counting() -> Self {
            Self::new(|n, _| n as u8)
        }
    }

    impl RegisterBackend for MockEfuse {
        fn read(&self, offset: usize) -> u32 {
            match offset {
                REG_EFUSE_CTRL => self.ctrl,
                REG_EFUSE_DOUT => self.dout,
                _ => panic!("unexpected register read at {offset:#x}"),
            }
        }

        fn write(&mut self, offset: usize, value: u32) {
            assert_eq!(offset, REG_EFUSE_CTRL, "DOUT is read-only");
            self.writes.push(value);

            let rising = Ctrl::from_bits_retain(value).contains(Ctrl::STROBE)
                && !Ctrl::from_bits_retain(self.ctrl).contains(Ctrl::STROBE);
            self.ctrl = value;

            if rising {
                let addr = Ctrl::from_bits_retain(value).address();
                self.dout = (self.fuse)(self.strobes.len(), addr) as u32;
                self.strobes.push(addr);
            }
        }

        fn is_mapped(&self) -> bool {
            self.mapped
        }
    }

    #[derive(Default)]
    pub(crate) struct MockDelay {
        pub(crate) waits_ns: Vec<u32>,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.waits_ns.push(ns);
        }
    }

    fn controller(backend: MockEfuse) -> EfuseController<MockEfuse, MockDelay> {
        EfuseController::new(backend, MockDelay::default(), Config::default())
    }

    #[test]
    fn zero_length_read_touches_nothing() {
        let mut efuse = controller(MockEfuse::counting());

        assert_eq!(efuse.read(0x10, &mut []), Ok(0));

        let (backend, delay) = efuse.free();
        assert!(backend.writes.is_empty());
        assert!(delay.waits_ns.is_empty());
    }

    #[test]
    fn zero_length_read_succeeds_on_unmapped_window() {
        let mut backend = MockEfuse::counting();
        backend.mapped = false;
        let mut efuse = controller(backend);

        assert_eq!(efuse.read(0, &mut []), Ok(0));
    }

    #[test]
    fn unmapped_window_is_reported() {
        let mut backend = MockEfuse::counting();
        backend.mapped = false;
        let mut efuse = controller(backend);
        let mut buf = [0xeeu8; 4];

        assert_eq!(efuse.probe(), Err(Error::DeviceUnavailable));
        assert_eq!(efuse.read(0, &mut buf), Err(Error::DeviceUnavailable));
        assert_eq!(buf, [0xee; 4]);

        let (backend, _) = efuse.free();
        assert!(backend.writes.is_empty());
    }

    #[test]
    fn one_strobe_per_byte_with_incrementing_address() {
        let mut efuse = controller(MockEfuse::counting());
        let mut buf = [0u8; 5];

        assert_eq!(efuse.read(7, &mut buf), Ok(5));

        let (backend, _) = efuse.free();
        assert_eq!(backend.strobes, [7, 8, 9, 10, 11]);
    }

    #[test]
    fn bytes_come_from_addressed_fuses() {
        let mut efuse = controller(MockEfuse::new(|_, addr| (addr as u8) ^ 0x5a));
        let mut buf = [0u8; 3];

        efuse.read(0x20, &mut buf).unwrap();

        assert_eq!(buf, [0x20 ^ 0x5a, 0x21 ^ 0x5a, 0x22 ^ 0x5a]);
    }

    #[test]
    fn address_wraps_at_end_of_array() {
        let mut efuse = controller(MockEfuse::counting());
        let mut buf = [0u8; 3];

        efuse.read(0x3fe, &mut buf).unwrap();

        let (backend, _) = efuse.free();
        assert_eq!(backend.strobes, [0x3fe, 0x3ff, 0]);
    }

    #[test]
    fn single_byte_control_sequence() {
        let mut efuse = controller(MockEfuse::counting());
        let mut buf = [0u8; 1];

        efuse.read(3, &mut buf).unwrap();

        let load = (Ctrl::LOAD | Ctrl::PGENB).bits();
        let addr = Ctrl::address_bits(3).bits();
        let strobe = Ctrl::STROBE.bits();
        let csb = Ctrl::CSB.bits();

        let (backend, _) = efuse.free();
        assert_eq!(
            backend.writes,
            [
                csb,
                load,
                load,
                load | addr,
                load | addr | strobe,
                load | addr,
                load | addr | csb,
            ]
        );
    }

    #[test]
    fn address_field_is_cleared_between_bytes() {
        let mut efuse = controller(MockEfuse::counting());
        let mut buf = [0u8; 2];

        efuse.read(1, &mut buf).unwrap();

        let load = (Ctrl::LOAD | Ctrl::PGENB).bits();
        let (backend, _) = efuse.free();
        let writes = backend.writes;
        // Second byte starts by clearing the address presented for the first.
        assert_eq!(writes[6], load);
        assert_eq!(writes[7], load | Ctrl::address_bits(2).bits());
    }

    #[test]
    fn delays_follow_configured_timing() {
        let mut efuse = controller(MockEfuse::counting());
        let mut buf = [0u8; 2];

        efuse.read(0, &mut buf).unwrap();

        let (_, delay) = efuse.free();
        assert_eq!(
            delay.waits_ns,
            [2000, 2000, 2000, 2000, 2000, 2000, 2000, 2000, 1000]
        );
    }

    #[test]
    fn applied_config_changes_timing() {
        let mut efuse = controller(MockEfuse::counting());
        efuse.apply_config(&Config::default().with_settle_us(5).with_release_us(3));
        let mut buf = [0u8; 1];

        efuse.read(0, &mut buf).unwrap();

        let (_, delay) = efuse.free();
        assert_eq!(delay.waits_ns, [5000, 5000, 5000, 5000, 5000, 3000]);
    }

    #[test]
    fn lock_is_released_after_read() {
        let mut efuse = controller(MockEfuse::counting());
        let mut buf = [0u8; 2];

        efuse.read(0, &mut buf).unwrap();

        assert!(!EFUSE_LOCK.is_locked());
    }

    #[test]
    fn register_window_is_only_touched_under_lock() {
        struct Locked(MockEfuse);

        impl RegisterBackend for Locked {
            fn read(&self, offset: usize) -> u32 {
                assert!(EFUSE_LOCK.is_locked(), "register read outside the lock");
                self.0.read(offset)
            }

            fn write(&mut self, offset: usize, value: u32) {
                assert!(EFUSE_LOCK.is_locked(), "register write outside the lock");
                self.0.write(offset, value)
            }

            fn is_mapped(&self) -> bool {
                self.0.is_mapped()
            }
        }

        let mut efuse = EfuseController::new(
            Locked(MockEfuse::counting()),
            MockDelay::default(),
            Config::default(),
        );
        let mut buf = [0u8; 3];

        assert_eq!(efuse.read(5, &mut buf), Ok(3));
        assert_eq!(buf, [0, 1, 2]);

        let (Locked(backend), _) = efuse.free();
        assert_eq!(backend.strobes, [5, 6, 7]);
        assert!(!EFUSE_LOCK.is_locked());
    }

    #[test]
    fn dout_is_sampled_while_strobe_is_high() {
        struct Strict(MockEfuse);

        impl RegisterBackend for Strict {
            fn read(&self, offset: usize) -> u32 {
                if offset == REG_EFUSE_DOUT {
                    let ctrl = Ctrl::from_bits_retain(self.0.read(REG_EFUSE_CTRL));
                    assert!(ctrl.contains(Ctrl::STROBE));
                    assert!(!ctrl.contains(Ctrl::CSB));
                }
                self.0.read(offset)
            }

            fn write(&mut self, offset: usize, value: u32) {
                self.0.write(offset, value)
            }
        }

        let mut efuse = EfuseController::new(
            Strict(MockEfuse::counting()),
            MockDelay::default(),
            Config::default(),
        );
        let mut buf = [0u8; 4];

        efuse.read(0, &mut buf).unwrap();

        assert_eq!(buf, [0, 1, 2, 3]);
    }
}
