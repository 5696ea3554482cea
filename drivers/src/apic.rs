//! Local APIC: end-of-interrupt and inter-processor interrupts.

use core::hint::spin_loop;

use strata_abi::IpiTarget;
use strata_abi::arch::x86_64::apic::{
    LAPIC_EOI, LAPIC_ICR_DELIVERY_FIXED, LAPIC_ICR_DELIVERY_STATUS, LAPIC_ICR_DEST_ALL_BUT_SELF,
    LAPIC_ICR_DEST_SHIFT, LAPIC_ICR_HIGH, LAPIC_ICR_LEVEL_ASSERT, LAPIC_ICR_LOW, LAPIC_ID,
    LAPIC_SPURIOUS, LAPIC_SPURIOUS_ENABLE,
};
use strata_abi::arch::x86_64::idt::SPURIOUS_VECTOR;
use strata_lib::klog_debug;

/// xAPIC register page of the executing CPU.
///
/// Every CPU sees its own LAPIC at the same address, so one instance serves
/// all of them.
pub struct LocalApic {
    base: usize,
}

impl LocalApic {
    /// # Safety
    /// `base` must be the virtual address of the mapped, uncached LAPIC
    /// register page and stay valid for the life of the kernel.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    #[inline]
    fn read(&self, reg: usize) -> u32 {
        // SAFETY: `new` guarantees the register page is mapped.
        unsafe { core::ptr::read_volatile((self.base + reg) as *const u32) }
    }

    #[inline]
    fn write(&self, reg: usize, value: u32) {
        // SAFETY: `new` guarantees the register page is mapped.
        unsafe { core::ptr::write_volatile((self.base + reg) as *mut u32, value) }
    }

    pub fn id(&self) -> u32 {
        self.read(LAPIC_ID) >> 24
    }

    /// Software-enable the APIC with the spurious vector installed.
    pub fn enable(&self) {
        self.write(LAPIC_SPURIOUS, LAPIC_SPURIOUS_ENABLE | SPURIOUS_VECTOR as u32);
        klog_debug!("APIC: local APIC {} enabled", self.id());
    }

    /// Signal end of interrupt.
    #[inline]
    pub fn send_eoi(&self) {
        self.write(LAPIC_EOI, 0);
    }

    pub fn send_ipi(&self, target: IpiTarget, vector: u8) {
        let low = vector as u32 | LAPIC_ICR_DELIVERY_FIXED | LAPIC_ICR_LEVEL_ASSERT;
        match target {
            IpiTarget::AllButSelf => {
                self.write(LAPIC_ICR_HIGH, 0);
                self.write(LAPIC_ICR_LOW, low | LAPIC_ICR_DEST_ALL_BUT_SELF);
            }
            IpiTarget::Apic(apic_id) => {
                self.write(LAPIC_ICR_HIGH, apic_id << LAPIC_ICR_DEST_SHIFT);
                self.write(LAPIC_ICR_LOW, low);
            }
        }
        while self.read(LAPIC_ICR_LOW) & LAPIC_ICR_DELIVERY_STATUS != 0 {
            spin_loop();
        }
    }
}
