//! Key-file credential: wraps the master key via X25519 + HKDF (ECIES).
//!
//! The user holds a long-term X25519 private key in a file they control;
//! this crate only ever sees the raw 32 bytes. Each wrap uses a fresh
//! ephemeral keypair, so the slot stores no secret at all:
//!
//! - `params`: the ephemeral public key (32 bytes).
//! - `public_key`: the long-term public key (32 bytes), used to find the
//!   slot matching a supplied private key.
//! - `wrapped_key`: `[nonce 12 || ciphertext+tag]` of the master key under
//!   HKDF-SHA256(salt = ephemeral public, ikm = DH shared secret).
//!
//! Two wraps for the same long-term key are unlinkable from the stored
//! ephemeral keys alone.

use aes_gcm::aead::OsRng;
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::crypto::{cipher, SecretBytes, SecretKey};
use crate::errors::{DiaryError, Result};

/// HKDF context string binding derived keys to this scheme.
const HKDF_INFO: &[u8] = b"diarium-v1";

/// Length of an X25519 key (public or private) in bytes.
pub const X25519_KEY_LEN: usize = 32;

/// The persisted pieces of a key-file slot, produced by `wrap_master_key`.
pub struct KeyFileWrap {
    /// Ephemeral public key used for this wrap only.
    pub ephemeral_public: [u8; X25519_KEY_LEN],
    /// The user's long-term public key.
    pub public_key: [u8; X25519_KEY_LEN],
    /// The wrapped master key blob.
    pub wrapped_key: Vec<u8>,
}

/// Generate a long-term X25519 keypair.
///
/// The private half is returned as raw bytes for the caller to persist to a
/// file of their choosing (restrictive permissions recommended); it is never
/// stored by this crate. The public half goes into the slot.
pub fn generate_keypair() -> (SecretBytes, [u8; X25519_KEY_LEN]) {
    let private = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&private);

    (
        SecretBytes::new(private.to_bytes().to_vec()),
        *public.as_bytes(),
    )
}

/// Wrap `master_key` for the holder of `public_key`'s private half.
///
/// The ephemeral secret and the derived wrapping key are discarded before
/// this function returns, on success and on error.
pub fn wrap_master_key(
    public_key: &[u8; X25519_KEY_LEN],
    master_key: &SecretKey,
) -> Result<KeyFileWrap> {
    let eph_secret = EphemeralSecret::random_from_rng(OsRng);
    let eph_public = PublicKey::from(&eph_secret);

    let recipient = PublicKey::from(*public_key);
    let shared_secret = eph_secret.diffie_hellman(&recipient);

    let wrapping_key = derive_wrapping_key(eph_public.as_bytes(), shared_secret.as_bytes())?;
    let wrapped_key = cipher::seal(&wrapping_key, master_key.as_bytes())?;

    Ok(KeyFileWrap {
        ephemeral_public: *eph_public.as_bytes(),
        public_key: *public_key,
        wrapped_key,
    })
}

/// Unwrap the master key using the long-term private key bytes.
///
/// Wrong key, corrupted ephemeral public key, and corrupted ciphertext are
/// indistinguishable: all return `WrongCredential`.
pub fn unwrap_master_key(
    private_key: &[u8; X25519_KEY_LEN],
    ephemeral_public: &[u8],
    wrapped_key: &[u8],
) -> Result<SecretKey> {
    let eph_bytes: [u8; X25519_KEY_LEN] = ephemeral_public
        .try_into()
        .map_err(|_| DiaryError::WrongCredential)?;
    let eph_public = PublicKey::from(eph_bytes);

    let private = StaticSecret::from(*private_key);
    let shared_secret = private.diffie_hellman(&eph_public);

    let wrapping_key = derive_wrapping_key(eph_public.as_bytes(), shared_secret.as_bytes())
        .map_err(|_| DiaryError::WrongCredential)?;

    let mut plain = cipher::open(&wrapping_key, wrapped_key)?;
    let master_key = SecretKey::from_slice(&plain).ok_or(DiaryError::WrongCredential);

    use zeroize::Zeroize;
    plain.zeroize();

    master_key
}

/// Derive the public key for a supplied private key.
///
/// Used to locate the matching slot when unlocking with a key file.
pub fn public_key_for(private_key: &[u8; X25519_KEY_LEN]) -> [u8; X25519_KEY_LEN] {
    let private = StaticSecret::from(*private_key);
    *PublicKey::from(&private).as_bytes()
}

/// HKDF-SHA256 over the DH shared secret, salted with the ephemeral public
/// key. The shared secret is zeroized by `x25519_dalek` when dropped.
fn derive_wrapping_key(salt: &[u8], ikm: &[u8]) -> Result<SecretKey> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);

    let mut okm = [0u8; 32];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| DiaryError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    let key = SecretKey::new(okm);
    use zeroize::Zeroize;
    okm.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair_bytes() -> ([u8; 32], [u8; 32]) {
        let (private, public) = generate_keypair();
        let mut priv_bytes = [0u8; 32];
        priv_bytes.copy_from_slice(private.as_bytes());
        (priv_bytes, public)
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let (priv_bytes, pub_bytes) = keypair_bytes();
        let master_key = SecretKey::generate();

        let w = wrap_master_key(&pub_bytes, &master_key).unwrap();
        let recovered =
            unwrap_master_key(&priv_bytes, &w.ephemeral_public, &w.wrapped_key).unwrap();

        assert_eq!(master_key.as_bytes(), recovered.as_bytes());
    }

    #[test]
    fn wrong_private_key_fails() {
        let (_, pub_bytes) = keypair_bytes();
        let (wrong_priv, _) = keypair_bytes();
        let master_key = SecretKey::generate();

        let w = wrap_master_key(&pub_bytes, &master_key).unwrap();
        let result = unwrap_master_key(&wrong_priv, &w.ephemeral_public, &w.wrapped_key);

        assert!(matches!(result, Err(DiaryError::WrongCredential)));
    }

    #[test]
    fn tampered_wrapped_key_fails() {
        let (priv_bytes, pub_bytes) = keypair_bytes();
        let master_key = SecretKey::generate();

        let mut w = wrap_master_key(&pub_bytes, &master_key).unwrap();
        if let Some(last) = w.wrapped_key.last_mut() {
            *last ^= 0xFF;
        }

        let result = unwrap_master_key(&priv_bytes, &w.ephemeral_public, &w.wrapped_key);
        assert!(matches!(result, Err(DiaryError::WrongCredential)));
    }

    #[test]
    fn tampered_ephemeral_public_fails() {
        let (priv_bytes, pub_bytes) = keypair_bytes();
        let master_key = SecretKey::generate();

        let mut w = wrap_master_key(&pub_bytes, &master_key).unwrap();
        w.ephemeral_public[0] ^= 0xFF;

        let result = unwrap_master_key(&priv_bytes, &w.ephemeral_public, &w.wrapped_key);
        assert!(matches!(result, Err(DiaryError::WrongCredential)));
    }

    #[test]
    fn each_wrap_uses_fresh_ephemeral_key() {
        let (_, pub_bytes) = keypair_bytes();
        let master_key = SecretKey::generate();

        let w1 = wrap_master_key(&pub_bytes, &master_key).unwrap();
        let w2 = wrap_master_key(&pub_bytes, &master_key).unwrap();

        assert_ne!(w1.ephemeral_public, w2.ephemeral_public);
        assert_ne!(w1.wrapped_key, w2.wrapped_key);
    }

    #[test]
    fn truncated_ephemeral_public_fails() {
        let (priv_bytes, pub_bytes) = keypair_bytes();
        let master_key = SecretKey::generate();

        let w = wrap_master_key(&pub_bytes, &master_key).unwrap();
        let result = unwrap_master_key(&priv_bytes, &w.ephemeral_public[..16], &w.wrapped_key);
        assert!(matches!(result, Err(DiaryError::WrongCredential)));
    }

    #[test]
    fn generate_keypair_is_random() {
        let (priv1, pub1) = generate_keypair();
        let (priv2, pub2) = generate_keypair();

        assert_eq!(priv1.len(), X25519_KEY_LEN);
        assert_ne!(priv1.as_bytes(), priv2.as_bytes());
        assert_ne!(pub1, pub2);
    }

    #[test]
    fn public_key_for_matches_generated_pair() {
        let (priv_bytes, pub_bytes) = keypair_bytes();
        assert_eq!(public_key_for(&priv_bytes), pub_bytes);
    }
}
