//! Rust side of the trap entry stubs.

use spin::Once;

use strata_abi::TrapFrame;
use strata_lib::KernelLock;

use crate::cpu;
use crate::trap::{TrapHandler, TrapOutcome};

static TRAP_HANDLER: Once<&'static dyn TrapHandler> = Once::new();

/// Install the dispatcher. Only the first registration takes effect.
pub fn register_trap_handler(handler: &'static dyn TrapHandler) {
    TRAP_HANDLER.call_once(|| handler);
}

pub fn trap_handler() -> Option<&'static dyn TrapHandler> {
    TRAP_HANDLER.get().copied()
}

/// The kernel lock owned by the registered dispatcher.
pub fn kernel_lock() -> Option<&'static KernelLock> {
    trap_handler().map(|handler| handler.kernel_lock())
}

/// Called by the common stub with a pointer to the frame it just saved.
#[unsafe(no_mangle)]
pub extern "C" fn strata_trap_entry(frame: *mut TrapFrame) {
    // SAFETY: the stub passes the frame it built on this CPU's stack; nothing
    // else references it until the stub restores from it.
    let Some(frame) = (unsafe { frame.as_mut() }) else {
        panic!("trap entry with a null frame");
    };
    let Some(handler) = trap_handler() else {
        panic!("trap #{} before the dispatcher was registered", frame.vector());
    };

    let cpu = cpu::current();
    if handler.dispatch(cpu, frame) == TrapOutcome::TaskTerminated {
        handler.reschedule(cpu);
    }
}
