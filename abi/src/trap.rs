//! Trap frame layout and vector classification.

use bitflags::bitflags;

use crate::arch::SegmentSelector;
use crate::arch::x86_64::idt::{
    EXCEPTION_LAST_HANDLED, EXCEPTION_PAGE_FAULT, HALT_IPI_VECTOR, IRQ_BASE_VECTOR, IRQ_LINES,
    RESCHEDULE_IPI_VECTOR, SYSCALL_VECTOR,
};

/// Register state saved by the entry stubs.
///
/// The stub pushes the general purpose registers on top of the vector number
/// and error code; the last five fields are the hardware interrupt frame.
/// Stubs for vectors without a hardware error code push a zero in its place.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rbp: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
    pub vector: u64,
    pub error_code: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

const _: () = assert!(core::mem::size_of::<TrapFrame>() == 22 * 8);
const _: () = assert!(core::mem::offset_of!(TrapFrame, vector) == 15 * 8);
const _: () = assert!(core::mem::offset_of!(TrapFrame, rip) == 17 * 8);

impl TrapFrame {
    #[inline]
    pub const fn vector(&self) -> u8 {
        self.vector as u8
    }

    /// Privilege level of the interrupted code, taken from the saved `cs`.
    #[inline]
    pub const fn privilege(&self) -> Privilege {
        if SegmentSelector::from_raw(self.cs).rpl() == 3 {
            Privilege::User
        } else {
            Privilege::Kernel
        }
    }

    #[inline]
    pub const fn from_kernel_code(&self) -> bool {
        self.cs == SegmentSelector::KERNEL_CODE.bits() as u64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Privilege {
    Kernel,
    User,
}

bitflags! {
    /// Page fault error code pushed by the CPU for vector 14.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PageFaultError: u64 {
        /// Protection violation; clear means the page was not present.
        const PRESENT = 1 << 0;
        const WRITE = 1 << 1;
        /// Access originated at user privilege.
        const USER = 1 << 2;
        /// A reserved bit was set in a paging structure.
        const RESERVED_WRITE = 1 << 3;
        const INSTRUCTION_FETCH = 1 << 4;
    }
}

impl PageFaultError {
    #[inline]
    pub const fn from_error_code(code: u64) -> Self {
        Self::from_bits_retain(code)
    }
}

/// What a trap vector means to the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorKind {
    /// CPU exception 0-20 other than the page fault.
    Exception(u8),
    PageFault,
    Syscall,
    RescheduleIpi,
    HaltIpi,
    /// Device line, already rebased to zero.
    Irq(u8),
    Unexpected(u8),
}

impl VectorKind {
    pub const fn from_vector(vector: u8) -> Self {
        Self::from_vector_with_base(vector, IRQ_BASE_VECTOR)
    }

    /// Classify `vector` with the device block starting at `irq_base`.
    ///
    /// The fixed software and IPI vectors win over the IRQ block.
    pub const fn from_vector_with_base(vector: u8, irq_base: u8) -> Self {
        match vector {
            EXCEPTION_PAGE_FAULT => Self::PageFault,
            v if v <= EXCEPTION_LAST_HANDLED => Self::Exception(v),
            SYSCALL_VECTOR => Self::Syscall,
            RESCHEDULE_IPI_VECTOR => Self::RescheduleIpi,
            HALT_IPI_VECTOR => Self::HaltIpi,
            v if v >= irq_base && (v - irq_base) < IRQ_LINES => Self::Irq(v - irq_base),
            v => Self::Unexpected(v),
        }
    }
}
