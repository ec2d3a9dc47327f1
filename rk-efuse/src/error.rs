use core::fmt;

/// Errors which can be returned.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Error {
    /// The e-fuse register window is not mapped.
    DeviceUnavailable,
    /// The output buffer cannot hold the requested transfer.
    BufferTooSmall {
        /// Bytes the transfer needs.
        required: usize,
        /// Bytes the caller provided.
        provided: usize,
    },
    /// A raw administrative command number that is not recognized.
    UnknownCommand(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DeviceUnavailable => write!(f, "e-fuse device unavailable"),
            Error::BufferTooSmall { required, provided } => write!(
                f,
                "buffer too small: {required} bytes required, {provided} provided"
            ),
            Error::UnknownCommand(cmd) => write!(f, "unknown command {cmd:#010x}"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        match self {
            Error::DeviceUnavailable => defmt::write!(fmt, "e-fuse device unavailable"),
            Error::BufferTooSmall { required, provided } => defmt::write!(
                fmt,
                "buffer too small: {} bytes required, {} provided",
                required,
                provided
            ),
            Error::UnknownCommand(cmd) => defmt::write!(fmt, "unknown command {=u32:#x}", cmd),
        }
    }
}
