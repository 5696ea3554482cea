//! Current-CPU lookup.
//!
//! The boot code registers a function that maps the executing CPU to a dense
//! index below [`MAX_CPUS`] (usually through the LAPIC ID). Before that only
//! the bootstrap processor runs, so the index defaults to 0.

use core::sync::atomic::{AtomicPtr, Ordering};

pub const MAX_CPUS: usize = 64;

pub type CurrentCpuFn = fn() -> u32;

static CURRENT_CPU_FN: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

pub fn register_current_cpu_fn(f: CurrentCpuFn) {
    CURRENT_CPU_FN.store(f as *mut (), Ordering::Release);
}

#[inline]
pub fn current_cpu() -> u32 {
    let ptr = CURRENT_CPU_FN.load(Ordering::Acquire);
    if ptr.is_null() {
        return 0;
    }
    // SAFETY: only `register_current_cpu_fn` stores here, always a valid
    // `CurrentCpuFn`.
    let f: CurrentCpuFn = unsafe { core::mem::transmute::<*mut (), CurrentCpuFn>(ptr) };
    f()
}
