#![no_std]

#[cfg(test)]
extern crate std;

pub mod cpu;
pub mod entry;
pub mod ipi;
pub mod irq;
pub mod platform;
pub mod services;
pub mod syscall;
pub mod trap;
pub mod usercopy;

pub use cpu::CpuContext;
pub use platform::Platform;
pub use services::KernelServices;
pub use trap::{FaultSites, LockDiscipline, TrapConfig, TrapDispatcher, TrapOutcome};
