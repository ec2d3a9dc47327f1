//! # E-fuse reader for Rockchip RK312x SoCs
//!
//! ## Overview
//!
//! The RK3126 and RK3128 keep their chip version, leakage calibration and a
//! 16-byte secret in a one-time-programmable fuse array. The array is read
//! through a two-register controller that software has to drive bit by bit
//! (see [`EfuseController`]).
//!
//! The usual flow is to read the first 32 fuse bytes once during bring-up
//! with [`init`] and to serve every later request from the returned
//! [`EfuseSnapshot`].
//!
//! ## Examples
//!
//! ```rust, no_run
//! # use embedded_hal::delay::DelayNs;
//! # fn run(delay: impl DelayNs) -> Result<(), rk_efuse::Error> {
//! use rk_efuse::{Config, EfuseController, backend::Mmio, soc::EFUSE_PHYS};
//!
//! let window = unsafe { Mmio::new(EFUSE_PHYS) };
//! let mut efuse = EfuseController::new(window, delay, Config::default());
//!
//! let snapshot = rk_efuse::init(&mut efuse)?;
//! let version = snapshot.chip_version();
//! let leakage = snapshot.leakage(0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Locking
//!
//! Reads mask interrupts through the `critical-section` crate, so the final
//! binary must link a `critical-section` implementation for its target.
//!
//! ## Feature Flags
#![doc = document_features::document_features!(feature_label = r#"<span class="stab portability"><code>{feature}</code></span>"#)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs, rust_2018_idioms)]
#![cfg_attr(not(test), no_std)]

// MUST be the first module
mod fmt;

#[cfg(feature = "admin")]
#[cfg_attr(docsrs, doc(cfg(feature = "admin")))]
pub mod admin;
pub mod backend;
mod controller;
mod error;
pub mod fields;
pub mod regs;
mod snapshot;
pub mod soc;

use embedded_hal::delay::DelayNs;

pub use self::{
    backend::RegisterBackend,
    controller::{Config, EfuseController},
    error::Error,
    snapshot::{EFUSE_SNAPSHOT_LEN, EfuseSnapshot, LEAKAGE_CHANNELS},
};
use crate::{fields::LEAKAGE, fmt::Bytes};

/// Reads the e-fuse snapshot.
///
/// Fails with [`Error::DeviceUnavailable`] if the controller's register
/// window is not mapped, rather than handing out an all-zero snapshot.
pub fn init<B, D>(controller: &mut EfuseController<B, D>) -> Result<EfuseSnapshot, Error>
where
    B: RegisterBackend,
    D: DelayNs,
{
    if let Err(err) = controller.probe() {
        error!("e-fuse probe failed: {}", err);
        return Err(err);
    }

    let mut bytes = [0u8; EFUSE_SNAPSHOT_LEN];
    controller.read(0, &mut bytes)?;

    let snapshot = EfuseSnapshot::from_bytes(bytes);
    info!("e-fuse chip version {}", snapshot.chip_version());
    debug!("e-fuse leakage {:?}", Bytes(snapshot.field(LEAKAGE)));

    Ok(snapshot)
}
