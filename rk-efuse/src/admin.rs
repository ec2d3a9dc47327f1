//! # Administrative queries
//!
//! ## Overview
//!
//! Privileged callers can ask for a copy of the secret region or of the
//! complete snapshot. Commands are identified by [`Opcode`]; the raw command
//! numbers are the ioctl numbers of the `/proc/efuse` node on RK312x
//! firmware, so existing userspace tools can be served by
//! [`query_raw`].
//!
//! Every transfer is checked against the length of the output buffer.
//!
//! ## Examples
//!
//! ```rust
//! use rk_efuse::{
//!     EfuseSnapshot,
//!     admin::{Opcode, query},
//! };
//!
//! let snapshot = EfuseSnapshot::from_bytes([7; 32]);
//! let mut secret = [0u8; 16];
//!
//! assert_eq!(query(&snapshot, Opcode::Decrypt, &mut secret), Ok(16));
//! assert_eq!(secret, [7; 16]);
//! ```

use strum::FromRepr;

use crate::{Error, EfuseSnapshot, fields::SECRET, snapshot::EFUSE_SNAPSHOT_LEN};

const IOCTL_MAGIC: u32 = b'M' as u32;

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

const IOC_WRITE: u32 = 1;

// The commands were declared as taking an `int`, although they transfer
// byte buffers.
const IOC_ARG_SIZE: u32 = core::mem::size_of::<i32>() as u32;

const fn iow(ty: u32, nr: u32, size: u32) -> u32 {
    (IOC_WRITE << IOC_DIRSHIFT)
        | (ty << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
        | (size << IOC_SIZESHIFT)
}

/// Administrative commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Copy the 16-byte secret region.
    Decrypt = 0,
    /// Accepted for compatibility; does nothing.
    Encrypt = 1,
    /// Copy the whole snapshot.
    FullInfo = 2,
}

impl Opcode {
    /// Raw command number of this opcode.
    pub const fn raw(self) -> u32 {
        iow(IOCTL_MAGIC, self as u32, IOC_ARG_SIZE)
    }

    /// Decodes a raw command number.
    pub fn from_raw(cmd: u32) -> Result<Self, Error> {
        let nr = (cmd >> IOC_NRSHIFT) & ((1 << IOC_NRBITS) - 1);

        Self::from_repr(nr as u8)
            .filter(|op| op.raw() == cmd)
            .ok_or(Error::UnknownCommand(cmd))
    }

    /// Number of bytes this command writes to the output buffer.
    pub const fn transfer_len(self) -> usize {
        match self {
            Opcode::Decrypt => SECRET.len(),
            Opcode::Encrypt => 0,
            Opcode::FullInfo => EFUSE_SNAPSHOT_LEN,
        }
    }
}

/// Runs `op` against `snapshot`, writing the result to the front of `out`.
///
/// Returns the number of bytes written. If `out` is shorter than
/// [`Opcode::transfer_len`], nothing is written and
/// [`Error::BufferTooSmall`] is returned.
pub fn query(snapshot: &EfuseSnapshot, op: Opcode, out: &mut [u8]) -> Result<usize, Error> {
    let required = op.transfer_len();
    if out.len() < required {
        warn!(
            "e-fuse query {:?} needs {} bytes, got {}",
            op,
            required,
            out.len()
        );
        return Err(Error::BufferTooSmall {
            required,
            provided: out.len(),
        });
    }

    let src: &[u8] = match op {
        Opcode::Decrypt => snapshot.field(SECRET),
        Opcode::Encrypt => &[],
        Opcode::FullInfo => snapshot.bytes(),
    };
    out[..required].copy_from_slice(src);

    debug!("e-fuse query {:?} copied {} bytes", op, required);

    Ok(required)
}

/// Decodes `cmd` and runs it, see [`query`].
pub fn query_raw(snapshot: &EfuseSnapshot, cmd: u32, out: &mut [u8]) -> Result<usize, Error> {
    let op = Opcode::from_raw(cmd)?;
    query(snapshot, op, out)
}
