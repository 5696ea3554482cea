//! The syscall gate.
//!
//! `int 0x80` with the syscall number in `rax` and arguments in `rdi`, `rsi`,
//! `rdx`, `r10` and `r8`. The result word goes back in `rax`. The gate does
//! no validation; meaning is entirely up to the handler.

use strata_abi::{SyscallArgs, TrapFrame};
use strata_lib::KernelLock;

use crate::cpu::CpuContext;
use crate::services::KernelServices;

pub fn args_from_frame(frame: &TrapFrame) -> SyscallArgs {
    SyscallArgs::new(
        frame.rax,
        [frame.rdi, frame.rsi, frame.rdx, frame.r10, frame.r8],
    )
}

pub fn syscall_gate<S: KernelServices + ?Sized>(
    lock: &KernelLock,
    cpu: &CpuContext,
    services: &S,
    args: SyscallArgs,
) -> u64 {
    let _guard = lock.lock(cpu.index());
    services.handle_syscall(args)
}
