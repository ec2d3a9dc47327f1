//! Raw lock implementations.
//!
//! A [`RawLock`] only knows how to mask and unmask preemption. Tracking
//! ownership and reentry is the job of [`GenericRawMutex`](crate::GenericRawMutex).

use crate::RestoreState;

/// Trait for single-core locks.
pub trait RawLock {
    /// Acquires the raw lock
    ///
    /// # Safety
    ///
    /// The returned tokens must be released in reverse order, on the same thread that they were
    /// created on.
    unsafe fn enter(&self) -> RestoreState;

    /// Releases the raw lock
    ///
    /// # Safety
    ///
    /// - The `token` must be created by `self.enter()`
    /// - Tokens must be released in reverse order to their creation, on the same thread that they
    ///   were created on.
    unsafe fn exit(&self, token: RestoreState);
}

/// A lock that masks interrupts by entering a global critical section.
///
/// The actual masking is provided by the `critical-section` implementation
/// linked into the final binary. On bare-metal single-core targets this
/// disables interrupt delivery on the current core. Hosted implementations
/// (such as the `std` one) fall back to a process-wide mutex, which keeps
/// mutual exclusion but cannot guarantee timing.
#[derive(Debug, Default, Clone, Copy)]
pub struct CriticalSectionLock;

impl RawLock for CriticalSectionLock {
    #[inline]
    unsafe fn enter(&self) -> RestoreState {
        let inner = unsafe { critical_section::acquire() };
        RestoreState::new(inner)
    }

    #[inline]
    unsafe fn exit(&self, token: RestoreState) {
        unsafe { critical_section::release(token.inner()) }
    }
}
