//! Legacy I/O port numbers and UART register layout.

pub const COM1_BASE: u16 = 0x3F8;
/// ISA line wired to COM1.
pub const COM1_IRQ: u8 = 4;

pub const UART_REG_RBR: u16 = 0;
pub const UART_REG_THR: u16 = 0;
pub const UART_REG_DLL: u16 = 0;
pub const UART_REG_IER: u16 = 1;
pub const UART_REG_DLH: u16 = 1;
pub const UART_REG_FCR: u16 = 2;
pub const UART_REG_LCR: u16 = 3;
pub const UART_REG_LSR: u16 = 5;

pub const UART_LCR_DLAB: u8 = 0x80;
/// 8 data bits, no parity, one stop bit.
pub const UART_LCR_8N1: u8 = 0x03;
pub const UART_IER_RX_AVAILABLE: u8 = 0x01;
pub const UART_LSR_DATA_READY: u8 = 0x01;
pub const UART_LSR_TX_EMPTY: u8 = 0x20;

pub const UART_CLOCK_HZ: u32 = 115_200;

pub const PIC1_DATA: u16 = 0x21;
pub const PIC2_DATA: u16 = 0xA1;

/// Interrupt Mode Configuration Register (MP spec, 3.6.2.1).
pub const IMCR_SELECT: u16 = 0x22;
pub const IMCR_DATA: u16 = 0x23;
pub const IMCR_REG_IMCR: u8 = 0x70;
/// Route INTR/NMI through the APIC instead of the 8259.
pub const IMCR_SYMMETRIC_IO: u8 = 0x01;
