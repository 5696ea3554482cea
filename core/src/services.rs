//! Kernel subsystems the dispatcher hands traps to.
//!
//! Every method runs with the kernel lock held by the calling CPU.

use strata_abi::{ExitStatus, PageFaultError, SyscallArgs};

pub trait KernelServices: Sync {
    /// Resolve a fault at `addr` for the current task: map the page so the
    /// faulting instruction can restart, or terminate the task.
    fn handle_page_fault(&self, addr: u64, fault: PageFaultError);

    /// Pick the next task to run on this CPU.
    fn task_switch(&self);

    /// Terminate the current task. On hardware this switches away and never
    /// resumes the terminated task.
    fn task_exit(&self, status: ExitStatus);

    fn handle_syscall(&self, args: SyscallArgs) -> u64;

    /// Deliver a device interrupt, typically as a notification to the
    /// subscribed channel.
    fn handle_irq(&self, line: u8);

    /// Drain input from the kernel debug console.
    fn handle_debug_console_irq(&self);
}

impl<T: KernelServices + ?Sized> KernelServices for &T {
    fn handle_page_fault(&self, addr: u64, fault: PageFaultError) {
        (**self).handle_page_fault(addr, fault)
    }

    fn task_switch(&self) {
        (**self).task_switch()
    }

    fn task_exit(&self, status: ExitStatus) {
        (**self).task_exit(status)
    }

    fn handle_syscall(&self, args: SyscallArgs) -> u64 {
        (**self).handle_syscall(args)
    }

    fn handle_irq(&self, line: u8) {
        (**self).handle_irq(line)
    }

    fn handle_debug_console_irq(&self) {
        (**self).handle_debug_console_irq()
    }
}
