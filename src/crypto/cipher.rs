//! AES-256-GCM authenticated encryption.
//!
//! `encrypt` draws a fresh random 12-byte nonce from the OS random source
//! for every call and returns it alongside the ciphertext, so callers can
//! store the two separately (entry rows keep per-field nonce columns).
//! `seal`/`open` provide the single-blob `[nonce || ciphertext]` layout used
//! for wrapped master keys.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use super::keys::SecretKey;
use crate::errors::{DiaryError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// Returns `(nonce, ciphertext)`; the ciphertext includes the 16-byte
/// authentication tag. No associated data is used.
pub fn encrypt(key: &SecretKey, plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| DiaryError::EncryptionFailed(e.to_string()))?;

    Ok((nonce.into(), ciphertext))
}

/// Decrypt data produced by `encrypt`.
///
/// Fails closed: any bit flip in nonce, ciphertext, or tag surfaces as
/// `WrongCredential`, never as partial plaintext.
pub fn decrypt(key: &SecretKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN || ciphertext.len() < TAG_LEN {
        return Err(DiaryError::WrongCredential);
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(nonce);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| DiaryError::WrongCredential)
}

/// Encrypt and pack into a single `[nonce || ciphertext]` blob.
pub fn seal(key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let (nonce, ciphertext) = encrypt(key, plaintext)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a `[nonce || ciphertext]` blob produced by `seal`.
pub fn open(key: &SecretKey, blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(DiaryError::WrongCredential);
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    decrypt(key, nonce, ciphertext)
}
