//! Device IRQ front door.
//!
//! Drivers unmask their line through [`enable_irq`]; user-space drivers
//! subscribe a channel to a line and the kernel's IRQ handler looks the
//! channel up in [`IrqSubscriptions`] to post the notification.

use strata_abi::arch::x86_64::idt::IRQ_LINES;
use strata_abi::{ChannelId, IrqError};
use strata_lib::{HandleTable, klog_debug};

use crate::platform::Platform;

/// Unmask device line `line`, delivered at `IRQ_BASE_VECTOR + line`.
///
/// Only the `IRQ_LINES` device block is routable: `line >= IRQ_LINES`
/// returns [`IrqError::LineOutOfRange`], as does a line the IOAPIC does not
/// have.
pub fn enable_irq<P: Platform + ?Sized>(platform: &P, line: u8) -> Result<(), IrqError> {
    if line >= IRQ_LINES {
        return Err(IrqError::LineOutOfRange);
    }
    platform.enable_line(line)?;
    klog_debug!("IRQ: line {} enabled", line);
    Ok(())
}

/// Mask `line` again. Bounded by `IRQ_LINES` like [`enable_irq`].
pub fn disable_irq<P: Platform + ?Sized>(platform: &P, line: u8) -> Result<(), IrqError> {
    if line >= IRQ_LINES {
        return Err(IrqError::LineOutOfRange);
    }
    platform.disable_line(line)?;
    klog_debug!("IRQ: line {} disabled", line);
    Ok(())
}

#[inline]
fn line_key(line: u8) -> [u8; 1] {
    [line]
}

/// Line to listening channel. Mutated under the kernel lock.
pub struct IrqSubscriptions {
    listeners: HandleTable<ChannelId>,
}

impl IrqSubscriptions {
    pub fn new() -> Self {
        Self {
            listeners: HandleTable::new(),
        }
    }

    /// Unmask `line` and deliver it to `channel`, replacing any previous
    /// listener, which is returned.
    pub fn listen<P: Platform + ?Sized>(
        &mut self,
        platform: &P,
        line: u8,
        channel: ChannelId,
    ) -> Result<Option<ChannelId>, IrqError> {
        enable_irq(platform, line)?;
        Ok(self.listeners.set(&line_key(line), channel))
    }

    /// Drop the listener of `line` and mask it again.
    pub fn unlisten<P: Platform + ?Sized>(
        &mut self,
        platform: &P,
        line: u8,
    ) -> Result<Option<ChannelId>, IrqError> {
        let previous = self.listeners.remove(&line_key(line));
        if previous.is_some() {
            disable_irq(platform, line)?;
        }
        Ok(previous)
    }

    pub fn listener(&self, line: u8) -> Option<ChannelId> {
        self.listeners.get(&line_key(line)).copied()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for IrqSubscriptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::vec::Vec;

    use strata_abi::IpiTarget;

    use super::*;

    #[derive(Default)]
    struct Lines {
        enabled: Mutex<Vec<u8>>,
    }

    impl Platform for Lines {
        fn acknowledge_irq(&self) {}
        fn enable_line(&self, line: u8) -> Result<(), IrqError> {
            if line >= 24 {
                return Err(IrqError::LineOutOfRange);
            }
            let mut enabled = self.enabled.lock().unwrap();
            if !enabled.contains(&line) {
                enabled.push(line);
            }
            Ok(())
        }
        fn disable_line(&self, line: u8) -> Result<(), IrqError> {
            self.enabled.lock().unwrap().retain(|&l| l != line);
            Ok(())
        }
        fn fault_address(&self) -> u64 {
            0
        }
        fn send_ipi(&self, _target: IpiTarget, _vector: u8) {}
        fn halt_cpu(&self) -> ! {
            panic!("halted")
        }
    }

    #[test]
    fn out_of_range_lines_are_rejected() {
        let platform = Lines::default();
        assert_eq!(enable_irq(&platform, IRQ_LINES), Err(IrqError::LineOutOfRange));
        assert_eq!(enable_irq(&platform, 30), Err(IrqError::LineOutOfRange));
        assert_eq!(enable_irq(&platform, 224), Err(IrqError::LineOutOfRange));
        assert_eq!(disable_irq(&platform, 255), Err(IrqError::LineOutOfRange));
        assert_eq!(enable_irq(&platform, 1), Ok(()));
        assert_eq!(*platform.enabled.lock().unwrap(), [1u8]);
    }

    #[test]
    fn listen_unmasks_and_unlisten_masks() {
        let platform = Lines::default();
        let mut subs = IrqSubscriptions::new();

        assert_eq!(subs.listen(&platform, 1, ChannelId(10)), Ok(None));
        assert_eq!(subs.listener(1), Some(ChannelId(10)));
        assert_eq!(subs.listen(&platform, 1, ChannelId(11)), Ok(Some(ChannelId(10))));
        assert_eq!(subs.len(), 1);
        assert_eq!(*platform.enabled.lock().unwrap(), [1u8]);

        assert_eq!(subs.unlisten(&platform, 1), Ok(Some(ChannelId(11))));
        assert_eq!(subs.unlisten(&platform, 1), Ok(None));
        assert!(subs.is_empty());
        assert!(platform.enabled.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_enable_does_not_subscribe() {
        let platform = Lines::default();
        let mut subs = IrqSubscriptions::new();
        assert_eq!(
            subs.listen(&platform, 40, ChannelId(1)),
            Err(IrqError::LineOutOfRange)
        );
        assert_eq!(subs.listener(40), None);
    }
}
