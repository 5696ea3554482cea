//! Trap vector map.
//!
//! Fixed CPU exception numbers, the device IRQ block and the software and
//! inter-processor vectors the trap core recognises. These values are baked
//! into the IDT stubs and the IOAPIC redirection entries, so they are
//! build-time constants.

// =============================================================================
// Gate Types
// =============================================================================

/// Interrupt gate (present, DPL=0). Clears IF on entry.
pub const IDT_GATE_INTERRUPT: u8 = 0x8E;

/// Trap gate (present, DPL=0). Leaves IF untouched.
pub const IDT_GATE_TRAP: u8 = 0x8F;

/// Number of IDT entries.
pub const IDT_ENTRIES: usize = 256;

// =============================================================================
// CPU Exception Vectors
// =============================================================================

pub const EXCEPTION_DIVIDE_ERROR: u8 = 0;
pub const EXCEPTION_DEBUG: u8 = 1;
pub const EXCEPTION_NMI: u8 = 2;
pub const EXCEPTION_BREAKPOINT: u8 = 3;
pub const EXCEPTION_OVERFLOW: u8 = 4;
pub const EXCEPTION_BOUND_RANGE: u8 = 5;
pub const EXCEPTION_INVALID_OPCODE: u8 = 6;
pub const EXCEPTION_DEVICE_NOT_AVAIL: u8 = 7;
pub const EXCEPTION_DOUBLE_FAULT: u8 = 8;
pub const EXCEPTION_COPROCESSOR_OVERRUN: u8 = 9;
pub const EXCEPTION_INVALID_TSS: u8 = 10;
pub const EXCEPTION_SEGMENT_NOT_PRES: u8 = 11;
pub const EXCEPTION_STACK_FAULT: u8 = 12;
pub const EXCEPTION_GENERAL_PROTECTION: u8 = 13;
pub const EXCEPTION_PAGE_FAULT: u8 = 14;
pub const EXCEPTION_RESERVED_15: u8 = 15;
pub const EXCEPTION_FPU_ERROR: u8 = 16;
pub const EXCEPTION_ALIGNMENT_CHECK: u8 = 17;
pub const EXCEPTION_MACHINE_CHECK: u8 = 18;
pub const EXCEPTION_SIMD_FP_EXCEPTION: u8 = 19;
pub const EXCEPTION_VIRTUALIZATION: u8 = 20;

/// Highest vector handled as a CPU exception. Vectors 21-31 are reserved and
/// treated as unexpected.
pub const EXCEPTION_LAST_HANDLED: u8 = EXCEPTION_VIRTUALIZATION;

/// Vectors for which the CPU pushes an error code, reserved ones included.
pub const fn exception_has_error_code(vector: u8) -> bool {
    matches!(
        vector,
        EXCEPTION_DOUBLE_FAULT
            | EXCEPTION_INVALID_TSS
            | EXCEPTION_SEGMENT_NOT_PRES
            | EXCEPTION_STACK_FAULT
            | EXCEPTION_GENERAL_PROTECTION
            | EXCEPTION_PAGE_FAULT
            | EXCEPTION_ALIGNMENT_CHECK
            | 21
            | 29
            | 30
    )
}

// =============================================================================
// Device IRQ, Syscall and IPI Vectors
// =============================================================================

/// IRQ line 0 is delivered at this vector, line `n` at `IRQ_BASE_VECTOR + n`.
pub const IRQ_BASE_VECTOR: u8 = 32;

/// Number of device lines in the contiguous IRQ block.
pub const IRQ_LINES: u8 = 64;

/// Software syscall gate (int 0x80, DPL=3).
pub const SYSCALL_VECTOR: u8 = 0x80;

/// Ask the target CPU to re-run the scheduler.
pub const RESCHEDULE_IPI_VECTOR: u8 = 0xFC;

/// Broadcast shutdown: the receiving CPU stops for good.
pub const HALT_IPI_VECTOR: u8 = 0xFE;

/// LAPIC spurious interrupt vector.
pub const SPURIOUS_VECTOR: u8 = 0xFF;

const _: () = assert!((IRQ_BASE_VECTOR as u16 + IRQ_LINES as u16) <= SYSCALL_VECTOR as u16);

// =============================================================================
// IDT Entry
// =============================================================================

/// x86-64 gate descriptor (Intel SDM Vol. 3A, 6.14.1).
#[repr(C, packed)]
#[derive(Copy, Clone)]
pub struct IdtEntry {
    pub offset_low: u16,
    pub selector: u16,
    pub ist: u8,
    pub type_attr: u8,
    pub offset_mid: u16,
    pub offset_high: u32,
    pub zero: u32,
}

impl IdtEntry {
    pub const fn missing() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            ist: 0,
            type_attr: 0,
            offset_mid: 0,
            offset_high: 0,
            zero: 0,
        }
    }

    /// Gate pointing at `handler` with the given type and descriptor
    /// privilege level.
    pub const fn new(handler: u64, selector: u16, gate_type: u8, dpl: u8) -> Self {
        Self {
            offset_low: (handler & 0xFFFF) as u16,
            selector,
            ist: 0,
            type_attr: gate_type | ((dpl & 0x3) << 5),
            offset_mid: ((handler >> 16) & 0xFFFF) as u16,
            offset_high: (handler >> 32) as u32,
            zero: 0,
        }
    }

    pub const fn handler(&self) -> u64 {
        (self.offset_low as u64) | ((self.offset_mid as u64) << 16) | ((self.offset_high as u64) << 32)
    }
}

/// Printable name of a CPU exception vector.
pub fn exception_name(vector: u8) -> &'static str {
    match vector {
        0 => "Divide Error",
        1 => "Debug",
        2 => "Non-Maskable Interrupt",
        3 => "Breakpoint",
        4 => "Overflow",
        5 => "Bound Range Exceeded",
        6 => "Invalid Opcode",
        7 => "Device Not Available",
        8 => "Double Fault",
        9 => "Coprocessor Segment Overrun",
        10 => "Invalid TSS",
        11 => "Segment Not Present",
        12 => "Stack Segment Fault",
        13 => "General Protection Fault",
        14 => "Page Fault",
        15 => "Reserved",
        16 => "x87 FPU Error",
        17 => "Alignment Check",
        18 => "Machine Check",
        19 => "SIMD Floating-Point Exception",
        20 => "Virtualization Exception",
        21..=31 => "Reserved",
        _ => "Interrupt",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_round_trips_handler_address() {
        let entry = IdtEntry::new(0xFFFF_8000_1234_5678, 0x08, IDT_GATE_TRAP, 3);
        assert_eq!(entry.handler(), 0xFFFF_8000_1234_5678);
        let attr = entry.type_attr;
        assert_eq!(attr, 0xEF);
    }

    #[test]
    fn error_code_exceptions() {
        assert!(exception_has_error_code(EXCEPTION_PAGE_FAULT));
        assert!(exception_has_error_code(EXCEPTION_GENERAL_PROTECTION));
        assert!(!exception_has_error_code(EXCEPTION_INVALID_OPCODE));
        assert!(!exception_has_error_code(EXCEPTION_DIVIDE_ERROR));
    }
}
