//! # Register access
//!
//! The controller talks to its two registers through a [`RegisterBackend`].
//! On hardware that is [`Mmio`], a mapped I/O window accessed with volatile
//! 32-bit loads and stores. Tests substitute a backend that records every
//! access.

use core::ptr::NonNull;

/// Access to a 32-bit register window.
pub trait RegisterBackend {
    /// Reads the register at `offset` bytes from the window base.
    fn read(&self, offset: usize) -> u32;

    /// Writes `value` to the register at `offset` bytes from the window base.
    fn write(&mut self, offset: usize, value: u32);

    /// Whether the register window is actually present.
    ///
    /// [`read`](Self::read) and [`write`](Self::write) are never called on a
    /// backend that reports `false` here.
    fn is_mapped(&self) -> bool {
        true
    }
}

impl<T: RegisterBackend + ?Sized> RegisterBackend for &mut T {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }

    fn is_mapped(&self) -> bool {
        (**self).is_mapped()
    }
}

/// A memory-mapped register window.
#[derive(Debug)]
pub struct Mmio {
    base: Option<NonNull<u32>>,
}

impl Mmio {
    /// Creates a register window at the virtual address `base`.
    ///
    /// A `base` of zero yields a window that reports itself unmapped.
    ///
    /// # Safety
    ///
    /// `base` must be zero or the address of a device mapping covering the
    /// e-fuse registers, valid for volatile 32-bit access for as long as the
    /// returned value is alive, and nothing else may access those registers
    /// concurrently.
    pub unsafe fn new(base: usize) -> Self {
        Self {
            base: NonNull::new(base as *mut u32),
        }
    }

    /// Creates a window that reports itself unmapped.
    pub const fn unmapped() -> Self {
        Self { base: None }
    }

    fn register(&self, offset: usize) -> *mut u32 {
        match self.base {
            Some(base) => unsafe { base.as_ptr().byte_add(offset) },
            None => panic!("access to an unmapped e-fuse register window"),
        }
    }
}

// The window is owned exclusively by one `Mmio` value.
unsafe impl Send for Mmio {}

/// # Panics
///
/// [`read`](RegisterBackend::read) and [`write`](RegisterBackend::write)
/// panic on a window that is not mapped (see
/// [`is_mapped`](RegisterBackend::is_mapped)).
impl RegisterBackend for Mmio {
    #[inline]
    fn read(&self, offset: usize) -> u32 {
        unsafe { self.register(offset).read_volatile() }
    }

    #[inline]
    fn write(&mut self, offset: usize, value: u32) {
        unsafe { self.register(offset).write_volatile(value) }
    }

    fn is_mapped(&self) -> bool {
        self.base.is_some()
    }
}
