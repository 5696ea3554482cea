pub mod apic;
pub mod gdt;
pub mod idt;
pub mod ioapic;

pub use apic::{ApicBaseMsr, IpiTarget};
pub use gdt::SegmentSelector;
