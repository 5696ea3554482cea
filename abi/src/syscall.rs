//! Syscall argument pack.
//!
//! The gate forwards these words to the syscall handler verbatim; number
//! allocation and argument meaning belong to the handler.

/// Number of argument registers carried across the gate.
pub const SYSCALL_ARG_COUNT: usize = 5;

/// Arguments of one syscall as captured from the trap frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyscallArgs {
    pub args: [u64; SYSCALL_ARG_COUNT],
    /// Syscall number.
    pub kind: u64,
}

impl SyscallArgs {
    pub const fn new(kind: u64, args: [u64; SYSCALL_ARG_COUNT]) -> Self {
        Self { args, kind }
    }

    #[inline]
    pub const fn arg(&self, index: usize) -> u64 {
        if index < SYSCALL_ARG_COUNT {
            self.args[index]
        } else {
            0
        }
    }
}
