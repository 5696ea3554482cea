//! Architecture-specific definitions.

pub mod x86_64;

pub use x86_64::gdt::SegmentSelector;
pub use x86_64::idt::{
    HALT_IPI_VECTOR, IRQ_BASE_VECTOR, IRQ_LINES, RESCHEDULE_IPI_VECTOR, SYSCALL_VECTOR,
};
