//! # E-fuse snapshot
//!
//! The fuse array is read once during bring-up. Everything that needs fuse
//! content afterwards (chip version, leakage calibration, the secret region)
//! is served from the resulting [`EfuseSnapshot`] rather than from the
//! hardware.

use core::fmt;

use crate::fields::{CHIP_VERSION, EfuseField, LEAKAGE};

/// Number of fuse bytes captured in a snapshot.
pub const EFUSE_SNAPSHOT_LEN: usize = 32;

/// Number of leakage calibration channels.
pub const LEAKAGE_CHANNELS: usize = 3;

/// The first [`EFUSE_SNAPSHOT_LEN`] bytes of fuse content.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EfuseSnapshot {
    bytes: [u8; EFUSE_SNAPSHOT_LEN],
}

impl EfuseSnapshot {
    /// Wraps fuse content that was read elsewhere.
    pub const fn from_bytes(bytes: [u8; EFUSE_SNAPSHOT_LEN]) -> Self {
        Self { bytes }
    }

    /// Raw fuse content.
    pub const fn bytes(&self) -> &[u8; EFUSE_SNAPSHOT_LEN] {
        &self.bytes
    }

    /// Content of `field`.
    pub fn field(&self, field: EfuseField) -> &[u8] {
        &self.bytes[field.offset..][..field.len]
    }

    /// Returns the chip version with bit 3 cleared.
    pub fn chip_version(&self) -> u8 {
        self.bytes[CHIP_VERSION.offset] & !(1 << 3)
    }

    /// Returns the leakage calibration value of `channel`.
    ///
    /// Channels outside `0..3`, negative ones included, read as 0.
    pub fn leakage(&self, channel: i32) -> u8 {
        match usize::try_from(channel) {
            Ok(ch) if ch < LEAKAGE_CHANNELS => self.bytes[LEAKAGE.offset + ch],
            _ => 0,
        }
    }
}

// Keeps the secret region out of logs.
impl fmt::Debug for EfuseSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EfuseSnapshot")
            .field("chip_version", &self.chip_version())
            .field("leakage", &self.field(LEAKAGE))
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EfuseSnapshot {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::write!(
            fmt,
            "EfuseSnapshot {{ chip_version: {}, leakage: {}, .. }}",
            self.chip_version(),
            self.field(LEAKAGE)
        )
    }
}
