//! Trap frame diagnostics.

use strata_abi::TrapFrame;
use strata_abi::arch::x86_64::idt::exception_name;

use crate::klog_warn;

pub const DUMP_REGS_PER_LINE: usize = 3;

/// Registers in dump order.
pub fn frame_registers(frame: &TrapFrame) -> [(&'static str, u64); 21] {
    [
        ("rax", frame.rax),
        ("rbx", frame.rbx),
        ("rcx", frame.rcx),
        ("rdx", frame.rdx),
        ("rsi", frame.rsi),
        ("rdi", frame.rdi),
        ("rbp", frame.rbp),
        ("r8", frame.r8),
        ("r9", frame.r9),
        ("r10", frame.r10),
        ("r11", frame.r11),
        ("r12", frame.r12),
        ("r13", frame.r13),
        ("r14", frame.r14),
        ("r15", frame.r15),
        ("rip", frame.rip),
        ("cs", frame.cs),
        ("rflags", frame.rflags),
        ("rsp", frame.rsp),
        ("ss", frame.ss),
        ("err", frame.error_code),
    ]
}

pub fn dump_trap_frame(frame: &TrapFrame) {
    let vector = frame.vector();
    klog_warn!("trap frame: vector {} ({})", vector, exception_name(vector));
    for line in frame_registers(frame).chunks(DUMP_REGS_PER_LINE) {
        match line {
            [(a, va), (b, vb), (c, vc)] => {
                klog_warn!("  {:>6}={:#018x} {:>6}={:#018x} {:>6}={:#018x}", a, va, b, vb, c, vc)
            }
            _ => {
                for (name, value) in line {
                    klog_warn!("  {:>6}={:#018x}", name, value);
                }
            }
        }
    }
}
