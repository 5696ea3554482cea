//! Legacy 8259 PIC and IMCR handling.
//!
//! The 8259 pair is never used for delivery. It is masked once, and the IMCR
//! is switched so that INTR and NMI reach the local APIC.

use x86_64::instructions::port::Port;

use strata_lib::klog_debug;
use strata_lib::ports::{
    IMCR_DATA, IMCR_REG_IMCR, IMCR_SELECT, IMCR_SYMMETRIC_IO, PIC1_DATA, PIC2_DATA,
};

/// Select symmetric I/O mode through the IMCR.
///
/// Boards without an IMCR ignore the writes.
pub fn select_symmetric_io_mode() {
    let mut select: Port<u8> = Port::new(IMCR_SELECT);
    let mut data: Port<u8> = Port::new(IMCR_DATA);
    // SAFETY: IMCR ports are write-only configuration registers with no
    // memory side effects.
    unsafe {
        select.write(IMCR_REG_IMCR);
        data.write(IMCR_SYMMETRIC_IO);
    }
}

/// Mask every input on both 8259 controllers.
pub fn mask_legacy_pics() {
    let mut master: Port<u8> = Port::new(PIC1_DATA);
    let mut slave: Port<u8> = Port::new(PIC2_DATA);
    // SAFETY: writing the interrupt mask register only stops delivery.
    unsafe {
        master.write(0xFF);
        slave.write(0xFF);
    }
    klog_debug!("PIC: legacy 8259 masked");
}
