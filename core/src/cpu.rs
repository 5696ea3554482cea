//! Per-CPU trap state.

use core::sync::atomic::{AtomicBool, Ordering};

use strata_lib::{MAX_CPUS, current_cpu};

pub struct CpuContext {
    index: u32,
    /// Set while this CPU runs a user-copy routine with the kernel lock held.
    usercopy_active: AtomicBool,
}

impl CpuContext {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            usercopy_active: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn usercopy_active(&self) -> bool {
        self.usercopy_active.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_usercopy_active(&self, active: bool) {
        self.usercopy_active.store(active, Ordering::Release);
    }
}

const fn build_cpu_table() -> [CpuContext; MAX_CPUS] {
    let mut cpus = [const { CpuContext::new(0) }; MAX_CPUS];
    let mut i = 0;
    while i < MAX_CPUS {
        cpus[i] = CpuContext::new(i as u32);
        i += 1;
    }
    cpus
}

static CPUS: [CpuContext; MAX_CPUS] = build_cpu_table();

pub fn cpu_context(index: u32) -> Option<&'static CpuContext> {
    CPUS.get(index as usize)
}

/// Context of the executing CPU.
pub fn current() -> &'static CpuContext {
    let index = current_cpu();
    match cpu_context(index) {
        Some(cpu) => cpu,
        None => panic!("cpu index {} exceeds MAX_CPUS", index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_indices_are_dense() {
        assert_eq!(cpu_context(0).map(CpuContext::index), Some(0));
        assert_eq!(cpu_context(7).map(CpuContext::index), Some(7));
        assert!(cpu_context(MAX_CPUS as u32).is_none());
    }
}
