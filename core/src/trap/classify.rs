//! Pure trap classification.

use strata_abi::PageFaultError;

use super::FaultSites;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageFaultClass {
    /// Reserved bit set in a paging structure: the page tables are corrupt.
    ReservedBitViolation,
    /// Fault on a user address inside a user-copy routine.
    UserCopy,
    /// Kernel code touched a bad address.
    Kernel,
    User,
}

/// Who owns the kernel lock while a trap is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockDiscipline {
    /// The dispatcher takes the lock and releases it before returning.
    Acquire,
    /// The interrupted code already holds the lock on this CPU and keeps it.
    HeldByCaller,
}

impl PageFaultClass {
    pub fn lock_discipline(self) -> LockDiscipline {
        match self {
            Self::UserCopy => LockDiscipline::HeldByCaller,
            _ => LockDiscipline::Acquire,
        }
    }

    pub fn is_fatal(self) -> bool {
        matches!(self, Self::ReservedBitViolation | Self::Kernel)
    }
}

pub fn classify_page_fault(error: PageFaultError, rip: u64, sites: &FaultSites) -> PageFaultClass {
    if error.contains(PageFaultError::RESERVED_WRITE) {
        PageFaultClass::ReservedBitViolation
    } else if sites.contains(rip) {
        PageFaultClass::UserCopy
    } else if !error.contains(PageFaultError::USER) {
        PageFaultClass::Kernel
    } else {
        PageFaultClass::User
    }
}

/// Error bits handed to the page fault handler. User-copy faults are
/// reported as user accesses even though the CPU was in kernel mode.
pub fn effective_fault_flags(class: PageFaultClass, error: PageFaultError) -> PageFaultError {
    match class {
        PageFaultClass::UserCopy => error | PageFaultError::USER,
        _ => error,
    }
}
