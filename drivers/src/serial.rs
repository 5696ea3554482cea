//! COM1 debug console.
//!
//! Polled output, 9600 baud 8-N-1 with the FIFO off and the receive
//! interrupt on. Received bytes raise IRQ line [`DEBUG_CONSOLE_IRQ`]; the
//! handler drains them with [`DebugConsole::getc`].

use core::fmt::{self, Write};
use core::hint::spin_loop;

use spin::Mutex;
use x86_64::instructions::interrupts;
use x86_64::instructions::port::Port;

use strata_lib::ports::{
    COM1_BASE, COM1_IRQ, UART_CLOCK_HZ, UART_IER_RX_AVAILABLE, UART_LCR_8N1, UART_LCR_DLAB,
    UART_LSR_DATA_READY, UART_LSR_TX_EMPTY, UART_REG_DLH, UART_REG_DLL, UART_REG_FCR,
    UART_REG_IER, UART_REG_LCR, UART_REG_LSR, UART_REG_RBR, UART_REG_THR,
};

pub const DEBUG_CONSOLE_BAUD: u32 = 9600;

pub const DEBUG_CONSOLE_IRQ: u8 = COM1_IRQ;

pub const fn baud_divisor(baud: u32) -> u16 {
    (UART_CLOCK_HZ / baud) as u16
}

pub struct DebugConsole {
    base: u16,
}

impl DebugConsole {
    pub const fn new(base: u16) -> Self {
        Self { base }
    }

    #[inline]
    fn port(&self, reg: u16) -> Port<u8> {
        Port::new(self.base + reg)
    }

    /// Program the UART. Interrupts stay off until the line is enabled on
    /// the IOAPIC.
    pub fn init(&self) {
        let [dll, dlh] = baud_divisor(DEBUG_CONSOLE_BAUD).to_le_bytes();
        // SAFETY: the UART registers at `base` belong to this console.
        unsafe {
            self.port(UART_REG_IER).write(0x00);
            self.port(UART_REG_LCR).write(UART_LCR_DLAB);
            self.port(UART_REG_DLL).write(dll);
            self.port(UART_REG_DLH).write(dlh);
            self.port(UART_REG_LCR).write(UART_LCR_8N1);
            self.port(UART_REG_FCR).write(0x00);
            self.port(UART_REG_IER).write(UART_IER_RX_AVAILABLE);
        }
    }

    #[inline]
    fn line_status(&self) -> u8 {
        // SAFETY: reading LSR has no side effects.
        unsafe { self.port(UART_REG_LSR).read() }
    }

    fn write_raw(&self, byte: u8) {
        while self.line_status() & UART_LSR_TX_EMPTY == 0 {
            spin_loop();
        }
        // SAFETY: THR is empty, so the write cannot drop a byte.
        unsafe { self.port(UART_REG_THR).write(byte) }
    }

    /// Write one byte, following `\n` with `\r`.
    pub fn putc(&self, byte: u8) {
        self.write_raw(byte);
        if byte == b'\n' {
            self.write_raw(b'\r');
        }
    }

    /// Next received byte, if one is waiting.
    pub fn getc(&self) -> Option<u8> {
        if self.line_status() & UART_LSR_DATA_READY == 0 {
            return None;
        }
        // SAFETY: data-ready is set, RBR holds a byte.
        Some(unsafe { self.port(UART_REG_RBR).read() })
    }
}

impl Write for DebugConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &b in s.as_bytes() {
            self.putc(b);
        }
        Ok(())
    }
}

static CONSOLE: Mutex<DebugConsole> = Mutex::new(DebugConsole::new(COM1_BASE));

pub fn init() {
    CONSOLE.lock().init();
    strata_lib::klog::klog_register_backend(serial_klog_backend);
}

pub fn getc() -> Option<u8> {
    CONSOLE.lock().getc()
}

pub fn write_str(s: &str) {
    let _ = CONSOLE.lock().write_str(s);
}

fn serial_klog_backend(args: fmt::Arguments<'_>) {
    interrupts::without_interrupts(|| {
        let mut console = CONSOLE.lock();
        let _ = console.write_fmt(args);
        console.putc(b'\n');
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_console_runs_at_9600() {
        assert_eq!(baud_divisor(DEBUG_CONSOLE_BAUD), 12);
        assert_eq!(baud_divisor(DEBUG_CONSOLE_BAUD).to_le_bytes(), [12, 0]);
    }
}
