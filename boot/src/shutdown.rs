use strata_core::ipi;
use strata_lib::{cpu, klog_error};

use crate::early_init;

/// Final step of the kernel panic handler: stop every other CPU, then this
/// one. The kernel lock is not released here; the halt IPI does that on the
/// receiving CPUs.
pub fn panic_halt() -> ! {
    cpu::disable_interrupts();
    match early_init::platform() {
        Some(platform) => ipi::halt_all(platform),
        None => klog_error!("panic before interrupt controller bring-up"),
    }
    cpu::halt_loop()
}
