//! Task termination codes shared with the scheduler.

/// Reason a task was terminated by the kernel.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    /// The task raised a CPU exception (invalid opcode, #GP, divide error...).
    InvalidOperation = -1,
    /// The task touched memory it has no mapping for.
    InvalidAddress = -2,
    Killed = -3,
}

impl ExitStatus {
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }
}
