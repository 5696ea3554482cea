#![no_std]

#[cfg(test)]
extern crate std;

pub mod early_init;
pub mod idt;
pub mod shutdown;

pub use early_init::{BootConfig, BootDispatcher, HardwarePlatform, ap_init, early_init};
pub use idt::{idt_init, idt_load};
pub use shutdown::panic_halt;
