//! IDT and low-level trap entry stubs.
//!
//! One 16-byte stub per vector. Each pushes a zero error code when the CPU
//! does not supply one, pushes its vector, and jumps to the common stub,
//! which saves the general purpose registers in `TrapFrame` order and calls
//! `strata_trap_entry` with a pointer to the frame.

use core::arch::global_asm;

use spin::Once;
use x86_64::VirtAddr;
use x86_64::instructions::tables::lidt;
use x86_64::structures::DescriptorTablePointer;

use strata_abi::arch::SegmentSelector;
use strata_abi::arch::x86_64::idt::{IDT_ENTRIES, IDT_GATE_INTERRUPT, IdtEntry, SYSCALL_VECTOR};
use strata_lib::klog_debug;

/// Distance between consecutive stubs.
pub const TRAP_STUB_SIZE: usize = 16;

global_asm!(
    r#"
    .text
    .global strata_trap_stubs
    .align 16
strata_trap_stubs:
    .set vector, 0
    .rept 256
    .align 16
    .if (vector == 8) || (vector == 10) || (vector == 11) || (vector == 12) || (vector == 13) || (vector == 14) || (vector == 17) || (vector == 21) || (vector == 29) || (vector == 30)
    .else
    pushq $0
    .endif
    pushq $vector
    jmp strata_trap_common
    .set vector, vector + 1
    .endr

strata_trap_common:
    pushq %rax
    pushq %rbx
    pushq %rcx
    pushq %rdx
    pushq %rsi
    pushq %rdi
    pushq %rbp
    pushq %r8
    pushq %r9
    pushq %r10
    pushq %r11
    pushq %r12
    pushq %r13
    pushq %r14
    pushq %r15
    cld
    movq %rsp, %rdi
    call strata_trap_entry
    popq %r15
    popq %r14
    popq %r13
    popq %r12
    popq %r11
    popq %r10
    popq %r9
    popq %r8
    popq %rbp
    popq %rdi
    popq %rsi
    popq %rdx
    popq %rcx
    popq %rbx
    popq %rax
    addq $16, %rsp
    iretq
"#,
    options(att_syntax)
);

unsafe extern "C" {
    fn strata_trap_stubs();
}

type Idt = [IdtEntry; IDT_ENTRIES];

static IDT: Once<Idt> = Once::new();

/// Gate for `vector` given the address of the first stub.
///
/// All gates are interrupt gates, so handlers start with IF clear. Only the
/// syscall gate is reachable from ring 3.
pub fn gate_for(vector: u8, stub_base: u64) -> IdtEntry {
    let handler = stub_base + vector as u64 * TRAP_STUB_SIZE as u64;
    let dpl = if vector == SYSCALL_VECTOR { 3 } else { 0 };
    IdtEntry::new(
        handler,
        SegmentSelector::KERNEL_CODE.bits(),
        IDT_GATE_INTERRUPT,
        dpl,
    )
}

fn build_idt() -> Idt {
    let stub_base = strata_trap_stubs as *const () as u64;
    let mut idt = [IdtEntry::missing(); IDT_ENTRIES];
    for (vector, entry) in idt.iter_mut().enumerate() {
        *entry = gate_for(vector as u8, stub_base);
    }
    idt
}

/// Build the shared IDT and load it on the calling CPU.
pub fn idt_init() {
    IDT.call_once(build_idt);
    idt_load();
    klog_debug!("IDT: {} gates installed", IDT_ENTRIES);
}

/// Load the shared IDT on the calling CPU.
pub fn idt_load() {
    let idt = IDT.call_once(build_idt);
    let pointer = DescriptorTablePointer {
        limit: (core::mem::size_of::<Idt>() - 1) as u16,
        base: VirtAddr::new(idt.as_ptr() as u64),
    };
    // SAFETY: the table lives in a static and is never modified after it is
    // built.
    unsafe { lidt(&pointer) };
}
