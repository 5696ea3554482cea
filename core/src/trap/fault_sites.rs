/// Instruction addresses where a kernel-mode page fault is really a fault on
/// behalf of a user task: the copy instructions of the user-copy routines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultSites {
    sites: [u64; 2],
}

impl FaultSites {
    pub const fn new(copy_from_user: u64, copy_to_user: u64) -> Self {
        Self {
            sites: [copy_from_user, copy_to_user],
        }
    }

    /// The copy instructions of [`crate::usercopy`].
    pub fn usercopy() -> Self {
        let (from, to) = crate::usercopy::fault_site_addresses();
        Self::new(from, to)
    }

    #[inline]
    pub fn contains(&self, rip: u64) -> bool {
        self.sites.contains(&rip)
    }

    pub fn addresses(&self) -> [u64; 2] {
        self.sites
    }
}
