//! Inter-processor signalling.

use strata_abi::IpiTarget;
use strata_abi::arch::x86_64::idt::{HALT_IPI_VECTOR, RESCHEDULE_IPI_VECTOR};
use strata_lib::klog_debug;

use crate::platform::Platform;

/// Stop every other CPU. Used on the panic path; receivers release the
/// kernel lock and idle with interrupts off.
pub fn halt_all<P: Platform + ?Sized>(platform: &P) {
    platform.send_ipi(IpiTarget::AllButSelf, HALT_IPI_VECTOR);
}

/// Ask the CPU with LAPIC ID `apic_id` to run the scheduler.
pub fn request_reschedule<P: Platform + ?Sized>(platform: &P, apic_id: u32) {
    klog_debug!("IPI: reschedule -> apic {}", apic_id);
    platform.send_ipi(IpiTarget::Apic(apic_id), RESCHEDULE_IPI_VECTOR);
}
