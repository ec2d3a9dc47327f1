//! # E-fuse controller registers
//!
//! The controller exposes two 32-bit registers. `CTRL` drives the fuse
//! array's control pins and address lines directly, `DOUT` presents the byte
//! latched by the last strobe.

/// Offset of the control register.
pub const REG_EFUSE_CTRL: usize = 0x0000;
/// Offset of the data output register.
pub const REG_EFUSE_DOUT: usize = 0x0004;

bitflags::bitflags! {
    /// Contents of the `CTRL` register.
    ///
    /// Bits outside the named flags (the address field among them) are kept
    /// as-is when a value read back from hardware is modified.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ctrl: u32 {
        /// Chip select, active low.
        const CSB    = 1 << 0;
        /// Latch the addressed byte into `DOUT`.
        const STROBE = 1 << 1;
        /// Load mode.
        const LOAD   = 1 << 2;
        /// Program enable, active low.
        const PGENB  = 1 << 3;

        const _ = !0;
    }
}

impl Ctrl {
    /// Position of the address field.
    pub const A_SHIFT: u32 = 6;
    /// Width mask of the address field (1024 addressable bytes).
    pub const A_MASK: u32 = 0x3ff;

    /// Address field of this control word.
    pub const fn address(self) -> u32 {
        (self.bits() >> Self::A_SHIFT) & Self::A_MASK
    }

    /// Returns this control word with the address field cleared.
    pub const fn without_address(self) -> Self {
        Self::from_bits_retain(self.bits() & !(Self::A_MASK << Self::A_SHIFT))
    }

    /// Returns the address field bits for `addr`, wrapped to the field width.
    pub const fn address_bits(addr: u32) -> Self {
        Self::from_bits_retain((addr & Self::A_MASK) << Self::A_SHIFT)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Ctrl {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::write!(fmt, "Ctrl({=u32:#x})", self.bits())
    }
}
