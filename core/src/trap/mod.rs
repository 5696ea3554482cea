//! Trap dispatch under the big kernel lock.
//!
//! Every exception, device interrupt, IPI and syscall gate lands in
//! [`TrapDispatcher::dispatch`]. The order of checks matters:
//!
//! 1. The halt IPI force-releases the kernel lock and stops the CPU.
//! 2. The syscall gate runs without an EOI (it is a software interrupt).
//! 3. Everything else acknowledges the local APIC first.
//! 4. Page faults are classified before any lock is taken: a fault inside a
//!    user-copy routine happens with the lock already held by this CPU.
//! 5. Kernel-mode exceptions and unexpected vectors are fatal and never
//!    touch the lock, which the interrupted kernel code may own.
//! 6. All other paths take the lock for the duration of the handler.
//!
//! Fatal conditions dump the frame and panic with the lock still held; the
//! panic handler broadcasts the halt IPI.

mod classify;
mod fault_sites;
#[cfg(test)]
mod tests;

use core::fmt;

use strata_abi::arch::x86_64::idt::{IRQ_BASE_VECTOR, exception_name};
use strata_abi::{ExitStatus, PageFaultError, Privilege, SyscallArgs, TrapFrame, VectorKind};
use strata_lib::ports::COM1_IRQ;
use strata_lib::{KernelLock, dump_trap_frame, klog_debug, klog_warn};

use crate::cpu::CpuContext;
use crate::platform::Platform;
use crate::services::KernelServices;
use crate::syscall;

pub use classify::{
    LockDiscipline, PageFaultClass, classify_page_fault, effective_fault_flags,
};
pub use fault_sites::FaultSites;

/// How the interrupted context continues after a non-fatal trap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapOutcome {
    ResumeUser,
    ResumeKernel,
    /// The interrupted user task was handed to `task_exit`.
    TaskTerminated,
}

#[derive(Clone, Copy, Debug)]
pub struct TrapConfig {
    /// Vector of IRQ line 0.
    pub irq_base: u8,
    /// Line whose interrupts go to the debug console handler.
    pub debug_console_line: Option<u8>,
    pub sites: FaultSites,
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            irq_base: IRQ_BASE_VECTOR,
            debug_console_line: Some(COM1_IRQ),
            sites: FaultSites::usercopy(),
        }
    }
}

/// Type-erased dispatcher, as registered with the entry path.
pub trait TrapHandler: Sync {
    fn dispatch(&self, cpu: &CpuContext, frame: &mut TrapFrame) -> TrapOutcome;

    /// Take the lock and switch tasks, for when a terminated task must not be
    /// resumed.
    fn reschedule(&self, cpu: &CpuContext);

    fn kernel_lock(&self) -> &KernelLock;
}

pub struct TrapDispatcher<P, S> {
    lock: KernelLock,
    platform: P,
    services: S,
    config: TrapConfig,
}

impl<P: Platform, S: KernelServices> TrapDispatcher<P, S> {
    pub const fn new(platform: P, services: S, config: TrapConfig) -> Self {
        Self {
            lock: KernelLock::new(),
            platform,
            services,
            config,
        }
    }

    pub fn lock(&self) -> &KernelLock {
        &self.lock
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    pub fn config(&self) -> &TrapConfig {
        &self.config
    }

    pub fn dispatch(&self, cpu: &CpuContext, frame: &mut TrapFrame) -> TrapOutcome {
        let kind = VectorKind::from_vector_with_base(frame.vector(), self.config.irq_base);

        match kind {
            VectorKind::HaltIpi => self.halt(),
            VectorKind::Syscall => {
                frame.rax = self.syscall_gate(cpu, syscall::args_from_frame(frame));
                return resume(frame);
            }
            _ => self.platform.acknowledge_irq(),
        }

        match kind {
            VectorKind::PageFault => self.page_fault(cpu, frame),
            VectorKind::RescheduleIpi => {
                let _guard = self.lock.lock(cpu.index());
                self.services.task_switch();
                resume(frame)
            }
            VectorKind::Exception(vector) => self.exception(cpu, vector, frame),
            VectorKind::Irq(line) => {
                let _guard = self.lock.lock(cpu.index());
                if Some(line) == self.config.debug_console_line {
                    self.services.handle_debug_console_irq();
                } else {
                    self.services.handle_irq(line);
                }
                resume(frame)
            }
            // Fatal without taking the lock: kernel code that trapped may
            // already hold it on this CPU.
            VectorKind::HaltIpi | VectorKind::Syscall | VectorKind::Unexpected(_) => {
                self.fatal(frame, format_args!("Unexpected interrupt #{}", frame.vector()))
            }
        }
    }

    /// Lock, forward the arguments verbatim, unlock, return the result word.
    pub fn syscall_gate(&self, cpu: &CpuContext, args: SyscallArgs) -> u64 {
        syscall::syscall_gate(&self.lock, cpu, &self.services, args)
    }

    fn halt(&self) -> ! {
        // SAFETY: this CPU never returns to the code that may hold the lock.
        unsafe { self.lock.force_unlock() };
        self.platform.halt_cpu()
    }

    fn page_fault(&self, cpu: &CpuContext, frame: &TrapFrame) -> TrapOutcome {
        let addr = self.platform.fault_address();
        let error = PageFaultError::from_error_code(frame.error_code);
        let class = classify_page_fault(error, frame.rip, &self.config.sites);

        match class {
            PageFaultClass::ReservedBitViolation => self.fatal(
                frame,
                format_args!(
                    "#PF: RSVD bit violation (page table is presumably corrupted!) addr={:#x}",
                    addr
                ),
            ),
            PageFaultClass::Kernel => self.fatal(
                frame,
                format_args!("page fault in the kernel space (addr={:#x})", addr),
            ),
            PageFaultClass::UserCopy | PageFaultClass::User => {
                let _guard = match class.lock_discipline() {
                    LockDiscipline::Acquire => Some(self.lock.lock(cpu.index())),
                    LockDiscipline::HeldByCaller => {
                        if !self.lock.is_held_by(cpu.index()) || !cpu.usercopy_active() {
                            self.fatal(
                                frame,
                                format_args!(
                                    "user-copy fault on cpu {} outside a locked copy (addr={:#x})",
                                    cpu.index(),
                                    addr
                                ),
                            );
                        }
                        None
                    }
                };
                klog_debug!("#PF: addr={:#x} rip={:#x} err={:?}", addr, frame.rip, error);
                self.services
                    .handle_page_fault(addr, effective_fault_flags(class, error));
                resume(frame)
            }
        }
    }

    fn exception(&self, cpu: &CpuContext, vector: u8, frame: &TrapFrame) -> TrapOutcome {
        klog_warn!("Exception #{} ({})", vector, exception_name(vector));
        if frame.from_kernel_code() {
            // The interrupted kernel path may hold the lock on this CPU.
            self.fatal(
                frame,
                format_args!("Exception #{} occurred in the kernel space!", vector),
            );
        }
        let _guard = self.lock.lock(cpu.index());
        dump_trap_frame(frame);
        self.services.task_exit(ExitStatus::InvalidOperation);
        TrapOutcome::TaskTerminated
    }

    /// Dump the frame and panic. The kernel lock is left as it is.
    pub fn fatal(&self, frame: &TrapFrame, args: fmt::Arguments<'_>) -> ! {
        dump_trap_frame(frame);
        panic!("{}", args)
    }
}

impl<P: Platform, S: KernelServices> TrapHandler for TrapDispatcher<P, S> {
    fn dispatch(&self, cpu: &CpuContext, frame: &mut TrapFrame) -> TrapOutcome {
        TrapDispatcher::dispatch(self, cpu, frame)
    }

    fn reschedule(&self, cpu: &CpuContext) {
        let _guard = self.lock.lock(cpu.index());
        self.services.task_switch();
    }

    fn kernel_lock(&self) -> &KernelLock {
        &self.lock
    }
}

#[inline]
fn resume(frame: &TrapFrame) -> TrapOutcome {
    match frame.privilege() {
        Privilege::User => TrapOutcome::ResumeUser,
        Privilege::Kernel => TrapOutcome::ResumeKernel,
    }
}
