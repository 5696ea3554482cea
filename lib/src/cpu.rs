//! Thin wrappers over the privileged instructions the trap core needs.

use x86_64::instructions::{self, interrupts};
use x86_64::registers::control::Cr2;

#[inline(always)]
pub fn disable_interrupts() {
    interrupts::disable();
}

#[inline(always)]
pub fn enable_interrupts() {
    interrupts::enable();
}

#[inline(always)]
pub fn are_interrupts_enabled() -> bool {
    interrupts::are_enabled()
}

#[inline(always)]
pub fn hlt() {
    instructions::hlt();
}

/// Stop this CPU for good. NMIs wake `hlt`, so loop.
pub fn halt_loop() -> ! {
    loop {
        disable_interrupts();
        hlt();
    }
}

/// Linear address of the most recent page fault.
#[inline(always)]
pub fn read_cr2() -> u64 {
    Cr2::read_raw()
}
