//! I/O APIC redirection table driver.
//!
//! Every line starts masked. A line is routed to `IRQ_BASE_VECTOR + line`
//! (fixed delivery, physical destination 0, edge, active high) only while a
//! driver has it enabled.


use spin::Mutex;

use strata_abi::IrqError;
use strata_abi::arch::x86_64::idt::IRQ_LINES;
use strata_abi::arch::x86_64::ioapic::{
    IOAPIC_IOREGSEL, IOAPIC_IOWIN, IOAPIC_REDIR_MASKED, IOAPIC_REG_ID, IOAPIC_REG_VER,
    redir_entry_count, redir_high_index, redir_low_index,
};
use strata_lib::{klog_debug, klog_info};

/// Register indices are 8 bits wide, so entry 119 is the last addressable.
const MAX_REDIR_ENTRIES: u32 = 120;

/// Index/data register pair in front of the IOAPIC.
pub trait RegisterWindow {
    fn read(&mut self, reg: u8) -> u32;
    fn write(&mut self, reg: u8, value: u32);
}

/// IOAPIC registers reached through mapped MMIO.
pub struct MmioWindow {
    base: usize,
}

// SAFETY: the window is only used behind the IoApic mutex.
unsafe impl Send for MmioWindow {}

impl MmioWindow {
    /// # Safety
    /// `base` must be the virtual address of a mapped, uncached IOAPIC
    /// register window that stays mapped for the life of the kernel.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }
}

impl RegisterWindow for MmioWindow {
    #[inline]
    fn read(&mut self, reg: u8) -> u32 {
        // SAFETY: `new` guarantees the window is mapped.
        unsafe {
            core::ptr::write_volatile((self.base + IOAPIC_IOREGSEL) as *mut u32, reg as u32);
            core::ptr::read_volatile((self.base + IOAPIC_IOWIN) as *const u32)
        }
    }

    #[inline]
    fn write(&mut self, reg: u8, value: u32) {
        // SAFETY: `new` guarantees the window is mapped.
        unsafe {
            core::ptr::write_volatile((self.base + IOAPIC_IOREGSEL) as *mut u32, reg as u32);
            core::ptr::write_volatile((self.base + IOAPIC_IOWIN) as *mut u32, value);
        }
    }
}

struct Routing<W> {
    window: W,
    /// Usable lines; 0 until `init_mask_all` ran.
    lines: u8,
}

impl<W: RegisterWindow> Routing<W> {
    fn check_line(&self, line: u8) -> Result<(), IrqError> {
        if self.lines == 0 {
            return Err(IrqError::NotInitialized);
        }
        if line >= self.lines {
            return Err(IrqError::LineOutOfRange);
        }
        Ok(())
    }

    fn write_entry(&mut self, line: u8, low: u32) {
        // High dword first: the entry only takes effect once low is written.
        self.window.write(redir_high_index(line), 0);
        self.window.write(redir_low_index(line), low);
    }
}

pub struct IoApic<W: RegisterWindow> {
    routing: Mutex<Routing<W>>,
}

impl<W: RegisterWindow> IoApic<W> {
    pub const fn new(window: W) -> Self {
        Self {
            routing: Mutex::new(Routing { window, lines: 0 }),
        }
    }

    /// Mask every redirection entry and return the number of usable lines.
    pub fn init_mask_all(&self) -> u8 {
        let mut routing = self.routing.lock();
        let id = routing.window.read(IOAPIC_REG_ID);
        let version = routing.window.read(IOAPIC_REG_VER);
        let entries = redir_entry_count(version).min(MAX_REDIR_ENTRIES);

        for line in 0..entries {
            routing.write_entry(line as u8, IOAPIC_REDIR_MASKED);
        }

        routing.lines = entries.min(IRQ_LINES as u32) as u8;
        klog_info!(
            "IOAPIC: ID 0x{:x}, version 0x{:x}, {} redirection entries masked",
            (id >> 24) & 0xF,
            version & 0xFF,
            entries
        );
        routing.lines
    }

    pub fn line_count(&self) -> u8 {
        self.routing.lock().lines
    }

    /// Route `line` to `vector`, unmasked.
    pub fn enable_line(&self, line: u8, vector: u8) -> Result<(), IrqError> {
        let mut routing = self.routing.lock();
        routing.check_line(line)?;
        routing.write_entry(line, vector as u32);
        klog_debug!("IOAPIC: line {} -> vector 0x{:x}", line, vector);
        Ok(())
    }

    pub fn disable_line(&self, line: u8) -> Result<(), IrqError> {
        let mut routing = self.routing.lock();
        routing.check_line(line)?;
        routing.write_entry(line, IOAPIC_REDIR_MASKED);
        klog_debug!("IOAPIC: line {} masked", line);
        Ok(())
    }

    /// Current `(high, low)` dwords of a redirection entry.
    pub fn redirection_entry(&self, line: u8) -> Result<(u32, u32), IrqError> {
        let mut routing = self.routing.lock();
        routing.check_line(line)?;
        let high = routing.window.read(redir_high_index(line));
        let low = routing.window.read(redir_low_index(line));
        Ok((high, low))
    }

    pub fn is_masked(&self, line: u8) -> Result<bool, IrqError> {
        let (_, low) = self.redirection_entry(line)?;
        Ok(low & IOAPIC_REDIR_MASKED != 0)
    }
}
