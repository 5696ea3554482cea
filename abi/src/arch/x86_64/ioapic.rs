//! I/O APIC register layout.
//!
//! The IOAPIC is reached through a two-register window: the register index is
//! written at `IOREGSEL`, then the value is read or written at `IOWIN`.
//! Redirection entry `n` occupies indices `0x10 + 2n` (low dword) and
//! `0x11 + 2n` (high dword).

/// Default physical base of the first IOAPIC.
pub const IOAPIC_DEFAULT_PHYS_BASE: u64 = 0xFEC0_0000;

/// Byte offset of the index register inside the MMIO window.
pub const IOAPIC_IOREGSEL: usize = 0x00;

/// Byte offset of the data register inside the MMIO window.
pub const IOAPIC_IOWIN: usize = 0x10;

pub const IOAPIC_REG_ID: u8 = 0x00;
pub const IOAPIC_REG_VER: u8 = 0x01;
pub const IOAPIC_REG_REDIR_BASE: u8 = 0x10;

/// Redirection entry low dword: interrupt masked (bit 16).
pub const IOAPIC_REDIR_MASKED: u32 = 1 << 16;

/// Redirection entry low dword: level triggered (bit 15).
pub const IOAPIC_REDIR_TRIGGER_LEVEL: u32 = 1 << 15;

/// Redirection entry low dword: active low (bit 13).
pub const IOAPIC_REDIR_POLARITY_LOW: u32 = 1 << 13;

#[inline]
pub const fn redir_low_index(line: u8) -> u8 {
    IOAPIC_REG_REDIR_BASE + line * 2
}

#[inline]
pub const fn redir_high_index(line: u8) -> u8 {
    redir_low_index(line) + 1
}

/// Number of redirection entries encoded in the version register
/// (bits 16-23 hold the index of the last entry).
#[inline]
pub const fn redir_entry_count(version: u32) -> u32 {
    ((version >> 16) & 0xFF) + 1
}
