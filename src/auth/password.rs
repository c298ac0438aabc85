//! Password credential: wraps and unwraps the master key behind Argon2id.
//!
//! Persisted slot layout:
//! - `params`: the 32-byte wrap salt.
//! - `verification`: a PHC hash string (its own salt + Argon2id parameters +
//!   verification tag).
//! - `wrapped_key`: `[nonce 12 || ciphertext+tag]` of the master key under
//!   the derived wrapping key.
//!
//! The wrap salt and the PHC salt are independent, so the stored tag cannot
//! be turned back into the wrapping key.

use crate::crypto::{cipher, kdf, Argon2Params, SecretKey};
use crate::errors::{DiaryError, Result};

/// The persisted pieces of a password slot, produced by `wrap_master_key`.
pub struct PasswordWrap {
    /// Random per-slot salt for the wrapping-key derivation.
    pub wrap_salt: [u8; kdf::SALT_LEN],
    /// Self-describing PHC verification hash.
    pub verification: String,
    /// The wrapped master key blob.
    pub wrapped_key: Vec<u8>,
}

/// Wrap `master_key` under a password with the default (conservative)
/// Argon2id parameters.
pub fn wrap_master_key(password: &[u8], master_key: &SecretKey) -> Result<PasswordWrap> {
    wrap_master_key_with_params(password, master_key, &Argon2Params::default())
}

/// Wrap `master_key` under a password with explicit Argon2id parameters.
///
/// The derived wrapping key lives in a zeroize-on-drop container and is
/// dropped before this function returns, on success and on error.
pub fn wrap_master_key_with_params(
    password: &[u8],
    master_key: &SecretKey,
    params: &Argon2Params,
) -> Result<PasswordWrap> {
    let wrap_salt = kdf::generate_salt();

    let wrapping_key = kdf::derive_wrapping_key(password, &wrap_salt, params)?;
    let wrapped_key = cipher::seal(&wrapping_key, master_key.as_bytes())?;
    drop(wrapping_key);

    let verification = kdf::hash_password(password, params)?;

    Ok(PasswordWrap {
        wrap_salt,
        verification,
        wrapped_key,
    })
}

/// Unwrap the master key from a password slot.
///
/// Wrong password, corrupted salt, corrupted PHC hash, and corrupted
/// ciphertext are indistinguishable: all return `WrongCredential`.
pub fn unwrap_master_key(
    password: &[u8],
    wrap_salt: &[u8],
    verification: &str,
    wrapped_key: &[u8],
) -> Result<SecretKey> {
    kdf::verify_password(password, verification)?;

    // Re-derive with the parameters recorded in the PHC hash, so a slot
    // written under different settings still unwraps.
    let params = kdf::params_from_phc(verification)?;
    let wrapping_key = kdf::derive_wrapping_key(password, wrap_salt, &params)
        .map_err(|_| DiaryError::WrongCredential)?;

    let mut plain = cipher::open(&wrapping_key, wrapped_key)?;
    let master_key = SecretKey::from_slice(&plain).ok_or(DiaryError::WrongCredential);

    use zeroize::Zeroize;
    plain.zeroize();

    master_key
}

/// Verify the old password, then produce a fresh wrap of the same master key
/// under the new password. Entry ciphertext is untouched.
pub fn change_password(
    old_password: &[u8],
    new_password: &[u8],
    wrap_salt: &[u8],
    verification: &str,
    wrapped_key: &[u8],
    params: &Argon2Params,
) -> Result<PasswordWrap> {
    let master_key = unwrap_master_key(old_password, wrap_salt, verification, wrapped_key)?;
    wrap_master_key_with_params(new_password, &master_key, params)
}
