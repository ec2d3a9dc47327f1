//! Synchronization primitives for Rockchip SoC drivers
//!
//! Register sequences that are timed with busy waits must not be interleaved
//! with other accesses to the same register window, not even from an
//! interrupt handler. The locks in this crate enter a global critical section
//! (through the [`critical-section`] crate) for as long as they are held and
//! keep track of who holds them, so a reentrant acquire can be detected.
//!
//! [`critical-section`]: https://docs.rs/critical-section
//!
//! ## Feature Flags
#![doc = document_features::document_features!(feature_label = r#"<span class="stab portability"><code>{feature}</code></span>"#)]
#![deny(missing_docs, rust_2018_idioms, rustdoc::all)]
#![cfg_attr(not(test), no_std)]

// MUST be the first module
mod fmt;

use core::{
    cell::{Cell, UnsafeCell},
    fmt::Debug,
};

pub mod raw;

use raw::{CriticalSectionLock, RawLock};

/// Opaque token that can be used to release a lock.
#[derive(Clone, Copy)]
pub struct RestoreState {
    inner: critical_section::RestoreState,
    reentry: bool,
}

impl RestoreState {
    /// Creates a new RestoreState from the token of a critical section.
    pub const fn new(inner: critical_section::RestoreState) -> Self {
        Self {
            inner,
            reentry: false,
        }
    }

    /// Returns an invalid RestoreState.
    ///
    /// Note that due to the safety contract of [`RawLock::enter`]/[`RawLock::exit`], you must not
    /// pass a `RestoreState` obtained from this method to [`RawLock::exit`].
    pub const fn invalid() -> Self {
        Self::new(critical_section::RestoreState::invalid())
    }

    fn mark_reentry(&mut self) {
        self.reentry = true;
    }

    fn is_reentry(self) -> bool {
        self.reentry
    }

    /// Returns the critical section token this RestoreState was created from.
    pub fn inner(self) -> critical_section::RestoreState {
        self.inner
    }
}

impl Debug for RestoreState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RestoreState")
            .field("reentry", &self.reentry)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RestoreState {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::write!(fmt, "RestoreState {{ reentry: {} }}", self.reentry)
    }
}

// The flag is only touched while the raw lock is held, which makes the
// accesses exclusive.
#[repr(transparent)]
struct LockedState {
    locked: Cell<bool>,
}

impl LockedState {
    const fn new() -> Self {
        Self {
            locked: Cell::new(false),
        }
    }

    fn lock(&self, lock: &impl RawLock) -> RestoreState {
        let mut tkn = unsafe { lock.enter() };
        let was_locked = self.locked.replace(true);
        if was_locked {
            tkn.mark_reentry();
        }
        tkn
    }

    /// # Safety:
    ///
    /// This function must only be called if the lock was acquired by the
    /// current thread.
    unsafe fn unlock(&self) {
        debug_assert!(self.locked.get(), "tried to unlock a mutex that is not locked");
        self.locked.set(false)
    }

    fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

/// A generic lock that wraps a [`RawLock`] implementation and tracks
/// whether the caller has locked recursively.
pub struct GenericRawMutex<L: RawLock> {
    lock: L,
    inner: LockedState,
}

// Safety: LockedState is only accessed inside the raw lock
unsafe impl<L: RawLock + Sync> Sync for GenericRawMutex<L> {}

impl<L: RawLock> GenericRawMutex<L> {
    /// Create a new lock.
    pub const fn new(lock: L) -> Self {
        Self {
            lock,
            inner: LockedState::new(),
        }
    }

    /// Acquires the lock.
    ///
    /// # Safety
    ///
    /// - Each release call must be paired with an acquire call.
    /// - The returned token must be passed to the corresponding `release` call.
    /// - The caller must ensure to release the locks in the reverse order they were acquired.
    unsafe fn acquire(&self) -> RestoreState {
        self.inner.lock(&self.lock)
    }

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// - This function must only be called if the lock was acquired by the current thread.
    /// - The caller must ensure to release the locks in the reverse order they were acquired.
    /// - Each release call must be paired with an acquire call.
    unsafe fn release(&self, token: RestoreState) {
        unsafe {
            if !token.is_reentry() {
                self.inner.unlock();
            }
            self.lock.exit(token)
        }
    }

    /// Returns whether the lock is currently held.
    ///
    /// Only meaningful as a diagnostic, the answer can be stale as soon as it
    /// is returned.
    pub fn is_locked(&self) -> bool {
        let tkn = unsafe { self.lock.enter() };
        let locked = self.inner.is_locked();
        unsafe { self.lock.exit(tkn) };
        locked
    }

    /// Runs the callback with this lock locked.
    ///
    /// Note that this function is not reentrant, calling it reentrantly will
    /// panic.
    pub fn lock_non_reentrant<R>(&self, f: impl FnOnce() -> R) -> R {
        let _token = LockGuard::new_non_reentrant(self);
        f()
    }

    /// Runs the callback with this lock locked.
    pub fn lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _token = LockGuard::new_reentrant(self);
        f()
    }
}

/// A mutual exclusion primitive.
///
/// This lock masks interrupts on the current core while locked.
pub struct RawMutex {
    inner: GenericRawMutex<CriticalSectionLock>,
}

impl Default for RawMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl RawMutex {
    /// Create a new lock.
    pub const fn new() -> Self {
        Self {
            inner: GenericRawMutex::new(CriticalSectionLock),
        }
    }

    /// Returns whether the lock is currently held.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Runs the callback with this lock locked.
    ///
    /// Note that this function is not reentrant, calling it reentrantly will
    /// panic.
    pub fn lock_non_reentrant<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.lock_non_reentrant(f)
    }

    /// Runs the callback with this lock locked.
    pub fn lock<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.lock(f)
    }
}

/// A non-reentrant (panicking) mutex.
///
/// This is largely equivalent to a `critical_section::Mutex<RefCell<T>>`,
/// with the difference that a reentrant access panics instead of failing a
/// `RefCell` borrow.
pub struct NonReentrantMutex<T> {
    lock_state: RawMutex,
    data: UnsafeCell<T>,
}

impl<T> NonReentrantMutex<T> {
    /// Create a new instance
    pub const fn new(data: T) -> Self {
        Self {
            lock_state: RawMutex::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Provide exclusive access to the protected data to the given closure.
    ///
    /// Calling this reentrantly will panic.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.lock_state
            .lock_non_reentrant(|| f(unsafe { &mut *self.data.get() }))
    }

    /// Consumes the mutex and returns the protected data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

unsafe impl<T: Send> Send for NonReentrantMutex<T> {}
unsafe impl<T: Send> Sync for NonReentrantMutex<T> {}

struct LockGuard<'a, L: RawLock> {
    lock: &'a GenericRawMutex<L>,
    token: RestoreState,
}

impl<'a, L: RawLock> LockGuard<'a, L> {
    fn new_non_reentrant(lock: &'a GenericRawMutex<L>) -> Self {
        let this = Self::new_reentrant(lock);
        assert!(!this.token.is_reentry(), "lock is not reentrant");
        this
    }

    fn new_reentrant(lock: &'a GenericRawMutex<L>) -> Self {
        let token = unsafe {
            // SAFETY: the same lock will be released when dropping the guard.
            // This ensures that the lock is released on the same thread, in the reverse
            // order it was acquired.
            lock.acquire()
        };

        trace!("lock acquired (reentry: {})", token.is_reentry());

        Self { lock, token }
    }
}

impl<L: RawLock> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        unsafe { self.lock.release(self.token) };
    }
}
