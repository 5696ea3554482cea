//! Strata kernel ABI types.
//!
//! Definitions shared between the trap core, the drivers that feed it and the
//! collaborators it calls out to: the trap frame layout, the vector map, page
//! fault error bits, syscall argument packs and the fixed-width handle type.
//!
//! Everything that crosses the assembly boundary is `#[repr(C)]`.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod arch;
pub mod error;
pub mod handle;
pub mod syscall;
pub mod task;
pub mod trap;

pub use arch::x86_64::apic::IpiTarget;
pub use error::{IrqError, UserCopyError};
pub use handle::{ChannelId, HANDLE_SIZE, Handle};
pub use syscall::{SYSCALL_ARG_COUNT, SyscallArgs};
pub use task::ExitStatus;
pub use trap::{PageFaultError, Privilege, TrapFrame, VectorKind};
