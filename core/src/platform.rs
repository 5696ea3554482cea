//! Hardware facilities the trap core consumes.
//!
//! `strata-core` sits below the drivers in the dependency graph, so the boot
//! crate supplies an implementation backed by the interrupt controller.

use strata_abi::{IpiTarget, IrqError};

pub trait Platform: Sync {
    /// Signal end of interrupt to the local controller.
    fn acknowledge_irq(&self);

    fn enable_line(&self, line: u8) -> Result<(), IrqError>;

    fn disable_line(&self, line: u8) -> Result<(), IrqError>;

    /// Faulting linear address of the page fault being handled (CR2).
    fn fault_address(&self) -> u64;

    fn send_ipi(&self, target: IpiTarget, vector: u8);

    /// Disable interrupts on this CPU and idle forever.
    fn halt_cpu(&self) -> !;
}

impl<T: Platform + ?Sized> Platform for &T {
    fn acknowledge_irq(&self) {
        (**self).acknowledge_irq()
    }

    fn enable_line(&self, line: u8) -> Result<(), IrqError> {
        (**self).enable_line(line)
    }

    fn disable_line(&self, line: u8) -> Result<(), IrqError> {
        (**self).disable_line(line)
    }

    fn fault_address(&self) -> u64 {
        (**self).fault_address()
    }

    fn send_ipi(&self, target: IpiTarget, vector: u8) {
        (**self).send_ipi(target, vector)
    }

    fn halt_cpu(&self) -> ! {
        (**self).halt_cpu()
    }
}
