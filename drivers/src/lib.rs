#![no_std]

#[cfg(test)]
extern crate std;

pub mod apic;
pub mod controller;
pub mod ioapic;
pub mod pic;
pub mod serial;

pub use controller::InterruptController;
pub use ioapic::{IoApic, MmioWindow, RegisterWindow};
