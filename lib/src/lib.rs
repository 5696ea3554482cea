#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod cpu;
pub mod handle_map;
pub mod kdiag;
pub mod klog;
pub mod percpu;
pub mod ports;
pub mod spinlock;

pub use handle_map::{HandleTable, LockedHandleTable, REBALANCE_THRESHOLD};
pub use kdiag::dump_trap_frame;
pub use klog::{KlogLevel, klog_get_level, klog_init, klog_register_backend, klog_set_level};
pub use percpu::{MAX_CPUS, current_cpu, register_current_cpu_fn};
pub use spinlock::{KernelLock, KernelLockGuard};
