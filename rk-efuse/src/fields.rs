//! Named e-fuse fields within the first 32 fuse bytes.

use crate::snapshot::EFUSE_SNAPSHOT_LEN;

/// A byte range of e-fuse content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EfuseField {
    /// First byte of the field.
    pub(crate) offset: usize,
    /// Number of bytes.
    pub(crate) len: usize,
}

impl EfuseField {
    pub(crate) const fn new(offset: usize, len: usize) -> Self {
        assert!(offset + len <= EFUSE_SNAPSHOT_LEN);
        Self { offset, len }
    }

    /// First byte of the field.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes in the field.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the field covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Chip version; bit 3 is not part of the version
pub const CHIP_VERSION: EfuseField = EfuseField::new(4, 1);
/// Secret region handed out by the administrative interface
pub const SECRET: EfuseField = EfuseField::new(6, 16);
/// Leakage calibration values of all three channels
pub const LEAKAGE: EfuseField = EfuseField::new(23, 3);
/// Leakage calibration value of channel 0
pub const LEAKAGE_CH0: EfuseField = EfuseField::new(23, 1);
/// Leakage calibration value of channel 1
pub const LEAKAGE_CH1: EfuseField = EfuseField::new(24, 1);
/// Leakage calibration value of channel 2
pub const LEAKAGE_CH2: EfuseField = EfuseField::new(25, 1);
