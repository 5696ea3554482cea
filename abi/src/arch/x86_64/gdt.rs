//! Segment selectors installed by the boot GDT.
//!
//! The trap core only needs them to tell kernel-mode traps from user-mode
//! ones: the low two bits of a selector are its requested privilege level.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct SegmentSelector(u16);

impl SegmentSelector {
    pub const KERNEL_CODE: Self = Self(0x08);
    pub const KERNEL_DATA: Self = Self(0x10);
    pub const USER_DATA: Self = Self(0x1B);
    pub const USER_CODE: Self = Self(0x23);

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw as u16)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Requested privilege level (0 = kernel, 3 = user).
    #[inline]
    pub const fn rpl(self) -> u8 {
        (self.0 & 0x3) as u8
    }
}
