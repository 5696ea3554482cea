//! Copies between kernel buffers and user memory.
//!
//! The copy itself is a single `rep movsb`. If the user page is missing the
//! CPU faults on that instruction in kernel mode; the dispatcher recognises
//! the two instruction addresses, treats the fault as the task's own and
//! leaves the kernel lock with the caller. The page fault handler either
//! maps the page, in which case `rep movsb` restarts where it stopped, or
//! terminates the task.

use core::arch::global_asm;

use strata_abi::UserCopyError;
use strata_lib::KernelLockGuard;

use crate::cpu::CpuContext;

/// First non-canonical address above the user half.
pub const USER_SPACE_END: u64 = 0x0000_8000_0000_0000;

global_asm!(
    ".global strata_usercopy_from_user",
    ".global strata_usercopy_site_from",
    ".global strata_usercopy_to_user",
    ".global strata_usercopy_site_to",
    // rdi = dst, rsi = src, rdx = len
    "strata_usercopy_from_user:",
    "    mov rcx, rdx",
    "strata_usercopy_site_from:",
    "    rep movsb",
    "    ret",
    "strata_usercopy_to_user:",
    "    mov rcx, rdx",
    "strata_usercopy_site_to:",
    "    rep movsb",
    "    ret",
);

unsafe extern "C" {
    fn strata_usercopy_from_user(dst: *mut u8, src: *const u8, len: usize);
    fn strata_usercopy_to_user(dst: *mut u8, src: *const u8, len: usize);
    fn strata_usercopy_site_from();
    fn strata_usercopy_site_to();
}

/// Addresses of the two `rep movsb` instructions.
pub fn fault_site_addresses() -> (u64, u64) {
    (
        strata_usercopy_site_from as *const () as u64,
        strata_usercopy_site_to as *const () as u64,
    )
}

pub fn check_user_range(addr: u64, len: usize) -> Result<(), UserCopyError> {
    let end = addr
        .checked_add(len as u64)
        .ok_or(UserCopyError::Overflow)?;
    if end > USER_SPACE_END {
        return Err(UserCopyError::OutOfUserRange);
    }
    Ok(())
}

/// Marks the CPU as inside a user copy until dropped.
struct ActiveCopy<'a>(&'a CpuContext);

impl<'a> ActiveCopy<'a> {
    fn enter(cpu: &'a CpuContext) -> Self {
        cpu.set_usercopy_active(true);
        Self(cpu)
    }
}

impl Drop for ActiveCopy<'_> {
    fn drop(&mut self) {
        self.0.set_usercopy_active(false);
    }
}

/// Copy `dst.len()` bytes from user address `src`.
///
/// The guard proves this CPU holds the kernel lock for the whole copy.
pub fn copy_from_user(
    guard: &KernelLockGuard<'_>,
    cpu: &CpuContext,
    dst: &mut [u8],
    src: u64,
) -> Result<(), UserCopyError> {
    debug_assert_eq!(guard.cpu(), cpu.index());
    check_user_range(src, dst.len())?;
    if dst.is_empty() {
        return Ok(());
    }
    let _active = ActiveCopy::enter(cpu);
    // SAFETY: `dst` is a valid kernel buffer; `src` lies in the user half and
    // faults on it are resolved by the page fault handler.
    unsafe { strata_usercopy_from_user(dst.as_mut_ptr(), src as *const u8, dst.len()) };
    Ok(())
}

/// Copy `src` to user address `dst`.
pub fn copy_to_user(
    guard: &KernelLockGuard<'_>,
    cpu: &CpuContext,
    dst: u64,
    src: &[u8],
) -> Result<(), UserCopyError> {
    debug_assert_eq!(guard.cpu(), cpu.index());
    check_user_range(dst, src.len())?;
    if src.is_empty() {
        return Ok(());
    }
    let _active = ActiveCopy::enter(cpu);
    // SAFETY: as in `copy_from_user`, with the roles swapped.
    unsafe { strata_usercopy_to_user(dst as *mut u8, src.as_ptr(), src.len()) };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_lib::KernelLock;

    #[test]
    fn range_checks() {
        assert_eq!(check_user_range(0x40_0000, 0x1000), Ok(()));
        assert_eq!(check_user_range(USER_SPACE_END - 4, 4), Ok(()));
        assert_eq!(
            check_user_range(USER_SPACE_END - 4, 5),
            Err(UserCopyError::OutOfUserRange)
        );
        assert_eq!(
            check_user_range(0xFFFF_8000_0000_0000, 1),
            Err(UserCopyError::OutOfUserRange)
        );
        assert_eq!(check_user_range(u64::MAX, 2), Err(UserCopyError::Overflow));
    }

    #[test]
    fn fault_sites_are_distinct() {
        let (from, to) = fault_site_addresses();
        assert_ne!(from, 0);
        assert_ne!(from, to);
        assert_eq!(from, strata_usercopy_from_user as *const () as u64 + 3);
    }

    #[test]
    fn copies_round_trip_through_host_memory() {
        let lock = KernelLock::new();
        let cpu = CpuContext::new(0);
        let guard = lock.lock(0);

        let user = *b"hello, kernel";
        let mut kernel = [0u8; 13];
        copy_from_user(&guard, &cpu, &mut kernel, user.as_ptr() as u64).unwrap();
        assert_eq!(&kernel, b"hello, kernel");
        assert!(!cpu.usercopy_active());

        let mut reply = [0u8; 5];
        copy_to_user(&guard, &cpu, reply.as_mut_ptr() as u64, b"ready").unwrap();
        assert_eq!(&reply, b"ready");
    }

    #[test]
    fn kernel_half_destination_is_refused() {
        let lock = KernelLock::new();
        let cpu = CpuContext::new(1);
        let guard = lock.lock(1);
        assert_eq!(
            copy_to_user(&guard, &cpu, 0xFFFF_FFFF_8000_0000, b"x"),
            Err(UserCopyError::OutOfUserRange)
        );
        assert!(!cpu.usercopy_active());
    }
}
