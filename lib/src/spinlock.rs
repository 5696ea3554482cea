//! The big kernel lock.
//!
//! One `KernelLock` serialises all kernel policy code across CPUs. It is a
//! test-and-test-and-set spinlock that remembers which CPU owns it, so the
//! trap path can assert "already held by me" and so recursion is caught
//! instead of deadlocking.

use core::hint::spin_loop;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

const NO_OWNER: u32 = u32::MAX;

pub struct KernelLock {
    locked: AtomicBool,
    owner: AtomicU32,
}

/// Proof that the current CPU holds the kernel lock. Dropping it releases
/// the lock.
#[must_use = "dropping the guard releases the kernel lock"]
pub struct KernelLockGuard<'a> {
    lock: &'a KernelLock,
    cpu: u32,
}

impl KernelLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
            owner: AtomicU32::new(NO_OWNER),
        }
    }

    /// Spin until the lock is ours.
    ///
    /// Panics if `cpu` already owns the lock: the lock is not re-entrant.
    pub fn lock(&self, cpu: u32) -> KernelLockGuard<'_> {
        if self.is_held_by(cpu) {
            panic!("kernel lock recursion on cpu {}", cpu);
        }

        loop {
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }

        self.owner.store(cpu, Ordering::Relaxed);
        KernelLockGuard { lock: self, cpu }
    }

    pub fn try_lock(&self, cpu: u32) -> Option<KernelLockGuard<'_>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }
        self.owner.store(cpu, Ordering::Relaxed);
        Some(KernelLockGuard { lock: self, cpu })
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_held_by(&self, cpu: u32) -> bool {
        self.is_locked() && self.owner.load(Ordering::Relaxed) == cpu
    }

    /// Owner CPU, if the lock is held.
    pub fn owner(&self) -> Option<u32> {
        match self.owner.load(Ordering::Relaxed) {
            NO_OWNER => None,
            cpu if self.is_locked() => Some(cpu),
            _ => None,
        }
    }

    /// Release the lock whoever holds it.
    ///
    /// # Safety
    /// Only for the halt path: the caller must guarantee that the owner will
    /// never touch lock-protected state again.
    #[inline]
    pub unsafe fn force_unlock(&self) {
        self.owner.store(NO_OWNER, Ordering::Relaxed);
        self.locked.store(false, Ordering::Release);
    }
}

impl Default for KernelLock {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelLockGuard<'_> {
    #[inline]
    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    #[inline]
    pub fn lock(&self) -> &KernelLock {
        self.lock
    }
}

impl Drop for KernelLockGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.lock.owner.store(NO_OWNER, Ordering::Relaxed);
        self.lock.locked.store(false, Ordering::Release);
    }
}
