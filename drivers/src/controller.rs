//! IOAPIC routing plus LAPIC acknowledgement, as one interrupt controller.

use strata_abi::arch::x86_64::idt::{IRQ_BASE_VECTOR, IRQ_LINES};
use strata_abi::{IpiTarget, IrqError};
use strata_lib::klog_info;

use crate::apic::LocalApic;
use crate::ioapic::{IoApic, RegisterWindow};
use crate::pic;

pub struct InterruptController<W: RegisterWindow> {
    ioapic: IoApic<W>,
    lapic: LocalApic,
    irq_base: u8,
}

impl<W: RegisterWindow> InterruptController<W> {
    pub const fn new(ioapic: IoApic<W>, lapic: LocalApic) -> Self {
        Self {
            ioapic,
            lapic,
            irq_base: IRQ_BASE_VECTOR,
        }
    }

    /// Switch to symmetric I/O, mask everything, then clear any interrupt
    /// that was in service during the switch.
    pub fn initialize(&self) {
        pic::select_symmetric_io_mode();
        pic::mask_legacy_pics();
        self.mask_all_and_acknowledge();
    }

    /// APIC half of [`initialize`](Self::initialize): enable the LAPIC, mask
    /// every redirection entry, then EOI. Returns the routed line count.
    fn mask_all_and_acknowledge(&self) -> u8 {
        self.lapic.enable();
        let lines = self.ioapic.init_mask_all();
        self.acknowledge();
        klog_info!(
            "IRQ: {} lines routed to vectors {}..{}",
            lines,
            self.irq_base,
            self.irq_base as u16 + lines as u16
        );
        lines
    }

    /// Route `line` to vector `irq_base + line`. Lines outside the
    /// `IRQ_LINES` device block are rejected.
    pub fn enable_line(&self, line: u8) -> Result<(), IrqError> {
        if line >= IRQ_LINES {
            return Err(IrqError::LineOutOfRange);
        }
        self.ioapic.enable_line(line, self.irq_base + line)
    }

    pub fn disable_line(&self, line: u8) -> Result<(), IrqError> {
        if line >= IRQ_LINES {
            return Err(IrqError::LineOutOfRange);
        }
        self.ioapic.disable_line(line)
    }

    #[inline]
    pub fn acknowledge(&self) {
        self.lapic.send_eoi();
    }

    pub fn send_ipi(&self, target: IpiTarget, vector: u8) {
        self.lapic.send_ipi(target, vector);
    }

    pub fn lapic(&self) -> &LocalApic {
        &self.lapic
    }

    pub fn ioapic(&self) -> &IoApic<W> {
        &self.ioapic
    }
}
