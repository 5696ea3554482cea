//! Fixed-width binary handles.
//!
//! A handle is an opaque byte string of [`HANDLE_SIZE`] bytes. Handle tables
//! hash and compare it exactly like any other key.

pub const HANDLE_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Handle(pub [u8; HANDLE_SIZE]);

impl Handle {
    #[inline]
    pub const fn from_bytes(bytes: [u8; HANDLE_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; HANDLE_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for Handle {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Kernel IPC channel identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChannelId(pub i64);

impl ChannelId {
    /// Little-endian handle encoding of the id.
    #[inline]
    pub const fn to_handle(self) -> Handle {
        Handle(self.0.to_le_bytes())
    }

    #[inline]
    pub const fn from_handle(handle: &Handle) -> Self {
        Self(i64::from_le_bytes(handle.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_handle_encoding() {
        let id = ChannelId(0x0102_0304);
        let handle = id.to_handle();
        assert_eq!(handle.as_bytes(), &[4, 3, 2, 1, 0, 0, 0, 0]);
        assert_eq!(ChannelId::from_handle(&handle), id);
        assert_ne!(ChannelId(1).to_handle(), ChannelId(2).to_handle());
    }
}
