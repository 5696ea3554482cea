//! Local APIC definitions.
//!
//! Register offsets and command flags used for end-of-interrupt signalling
//! and inter-processor interrupts.

// =============================================================================
// APIC Base MSR
// =============================================================================

/// IA32_APIC_BASE MSR value (MSR 0x1B).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ApicBaseMsr(pub u64);

impl ApicBaseMsr {
    pub const MSR: u32 = 0x1B;

    /// APIC physical base address (bits 12-51).
    pub const ADDR_MASK: u64 = 0x000F_FFFF_FFFF_F000;

    /// Bootstrap processor flag.
    pub const BSP: u64 = 1 << 8;

    /// APIC global enable.
    pub const GLOBAL_ENABLE: u64 = 1 << 11;

    #[inline]
    pub const fn address(self) -> u64 {
        self.0 & Self::ADDR_MASK
    }

    #[inline]
    pub const fn is_bsp(self) -> bool {
        self.0 & Self::BSP != 0
    }
}

// =============================================================================
// Local APIC Register Offsets
// =============================================================================

pub const LAPIC_ID: usize = 0x020;
pub const LAPIC_VERSION: usize = 0x030;
pub const LAPIC_EOI: usize = 0x0B0;
pub const LAPIC_SPURIOUS: usize = 0x0F0;
pub const LAPIC_ICR_LOW: usize = 0x300;
pub const LAPIC_ICR_HIGH: usize = 0x310;

/// Size of the LAPIC register page.
pub const LAPIC_REGION_SIZE: usize = 0x1000;

// =============================================================================
// Control Flags
// =============================================================================

/// Software enable bit in the spurious interrupt vector register.
pub const LAPIC_SPURIOUS_ENABLE: u32 = 1 << 8;

/// Fixed delivery mode (bits 8-10 = 000).
pub const LAPIC_ICR_DELIVERY_FIXED: u32 = 0 << 8;

/// Delivery status: set while the previous IPI is still pending.
pub const LAPIC_ICR_DELIVERY_STATUS: u32 = 1 << 12;

/// Assert level (bit 14).
pub const LAPIC_ICR_LEVEL_ASSERT: u32 = 1 << 14;

/// Destination shorthand: every CPU except the sender (bits 18-19 = 11).
pub const LAPIC_ICR_DEST_ALL_BUT_SELF: u32 = 0x3 << 18;

/// Shift of the destination APIC ID inside ICR high.
pub const LAPIC_ICR_DEST_SHIFT: u32 = 24;

/// Where an inter-processor interrupt is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpiTarget {
    /// Every CPU except the sender.
    AllButSelf,
    /// A single CPU by LAPIC ID.
    Apic(u32),
}
