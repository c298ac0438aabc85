//! Secret containers.
//!
//! All key material in this crate lives inside one of the two types here.
//! Both overwrite their backing memory with zeros when dropped, on every
//! exit path, and neither exposes its contents through `Debug`.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a symmetric key in bytes (256 bits, AES-256).
pub const KEY_LEN: usize = 32;

/// A 32-byte symmetric key that is automatically zeroized when dropped.
///
/// Used for the diary master key and for every derived wrapping key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("data", &"[REDACTED]")
            .finish()
    }
}

impl SecretKey {
    /// Wrap raw key bytes. The caller's copy should be zeroized after this.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random key from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Build a key from a slice. Returns `None` unless it is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_LEN {
            return None;
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Some(Self(key))
    }

    /// Access the raw key bytes for an immediate cipher or KDF call.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Overwrite the key in place, before the container itself is dropped.
    ///
    /// `lock()` calls this so the wipe happens at a deterministic point and
    /// can be observed through `as_bytes` while the container is still alive.
    pub fn erase(&mut self) {
        self.0.zeroize();
    }
}

/// A variable-length secret (password bytes, private key bytes), zeroized
/// on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBytes")
            .field("data", &"[REDACTED]")
            .finish()
    }
}

impl SecretBytes {
    /// Take ownership of secret bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Access the raw bytes for an immediate use.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the contained secret.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<String> for SecretBytes {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&str> for SecretBytes {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}
