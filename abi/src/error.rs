//! Recoverable error types for the trap core's public API.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    /// Line is beyond the controller's redirection table or the IRQ block.
    LineOutOfRange,
    /// The interrupt controller has not been initialised yet.
    NotInitialized,
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineOutOfRange => write!(f, "IRQ line out of range"),
            Self::NotInitialized => write!(f, "interrupt controller not initialized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCopyError {
    /// Part of the user range lies in the kernel half of the address space.
    OutOfUserRange,
    /// `addr + len` wraps around.
    Overflow,
}

impl fmt::Display for UserCopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfUserRange => write!(f, "address outside user space"),
            Self::Overflow => write!(f, "user range overflows"),
        }
    }
}
