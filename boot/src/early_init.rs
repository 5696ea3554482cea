//! Bring-up of the trap path.
//!
//! Order matters: the serial console comes first so every later step can
//! log, the IDT goes in before any interrupt source is unmasked, and the
//! dispatcher is registered before the debug console line is enabled.

use spin::Once;

use strata_abi::{IpiTarget, IrqError};
use strata_core::entry::register_trap_handler;
use strata_core::{KernelServices, Platform, TrapConfig, TrapDispatcher, irq};
use strata_drivers::apic::LocalApic;
use strata_drivers::serial::{self, DEBUG_CONSOLE_IRQ};
use strata_drivers::{InterruptController, IoApic, MmioWindow};
use strata_lib::{MAX_CPUS, cpu, klog_info, klog_init, klog_warn, register_current_cpu_fn};

use crate::idt;

/// Virtual addresses of the interrupt controller register windows.
#[derive(Clone, Copy, Debug)]
pub struct BootConfig {
    pub lapic_base: usize,
    pub ioapic_base: usize,
}

pub struct HardwarePlatform {
    controller: InterruptController<MmioWindow>,
}

impl HardwarePlatform {
    pub fn controller(&self) -> &InterruptController<MmioWindow> {
        &self.controller
    }
}

impl Platform for HardwarePlatform {
    #[inline]
    fn acknowledge_irq(&self) {
        self.controller.acknowledge();
    }

    fn enable_line(&self, line: u8) -> Result<(), IrqError> {
        self.controller.enable_line(line)
    }

    fn disable_line(&self, line: u8) -> Result<(), IrqError> {
        self.controller.disable_line(line)
    }

    fn fault_address(&self) -> u64 {
        cpu::read_cr2()
    }

    fn send_ipi(&self, target: IpiTarget, vector: u8) {
        self.controller.send_ipi(target, vector);
    }

    fn halt_cpu(&self) -> ! {
        cpu::halt_loop()
    }
}

pub type BootDispatcher =
    TrapDispatcher<&'static HardwarePlatform, &'static dyn KernelServices>;

static PLATFORM: Once<HardwarePlatform> = Once::new();
static DISPATCHER: Once<BootDispatcher> = Once::new();

pub fn platform() -> Option<&'static HardwarePlatform> {
    PLATFORM.get()
}

pub fn dispatcher() -> Option<&'static BootDispatcher> {
    DISPATCHER.get()
}

/// CPU index = LAPIC ID; firmware on supported machines numbers them densely.
fn current_cpu_from_lapic() -> u32 {
    match PLATFORM.get() {
        Some(platform) => platform.controller.lapic().id() % MAX_CPUS as u32,
        None => 0,
    }
}

/// Bring up the trap path on the bootstrap processor.
///
/// Interrupts are left disabled; the caller enables them once the rest of
/// the kernel is ready.
///
/// # Safety
/// `config` must name mapped, uncached LAPIC and IOAPIC register windows that
/// stay mapped for the life of the kernel. Must run once, on the BSP, with
/// interrupts disabled.
pub unsafe fn early_init(
    config: BootConfig,
    services: &'static dyn KernelServices,
) -> &'static BootDispatcher {
    serial::init();
    klog_init();
    klog_info!("strata: trap core bring-up");

    idt::idt_init();

    let platform = PLATFORM.call_once(|| {
        // SAFETY: forwarded from this function's contract.
        let (ioapic, lapic) = unsafe {
            (
                IoApic::new(MmioWindow::new(config.ioapic_base)),
                LocalApic::new(config.lapic_base),
            )
        };
        HardwarePlatform {
            controller: InterruptController::new(ioapic, lapic),
        }
    });
    platform.controller.initialize();
    register_current_cpu_fn(current_cpu_from_lapic);

    let dispatcher = DISPATCHER.call_once(|| {
        TrapDispatcher::new(platform, services, TrapConfig::default())
    });
    register_trap_handler(dispatcher);

    if let Err(err) = irq::enable_irq(platform, DEBUG_CONSOLE_IRQ) {
        klog_warn!("strata: debug console IRQ unavailable: {}", err);
    }

    klog_info!("strata: trap core ready");
    dispatcher
}

/// Per-CPU setup for application processors.
pub fn ap_init() {
    idt::idt_load();
    if let Some(platform) = PLATFORM.get() {
        platform.controller.lapic().enable();
    }
}
