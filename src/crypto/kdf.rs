//! Password-based key derivation using Argon2id.
//!
//! Two uses, fed by the same parameter set:
//!
//! - `derive_wrapping_key` turns a password + per-slot salt into a raw
//!   32-byte wrapping key (never persisted).
//! - `hash_password` / `verify_password` maintain a PHC-format verification
//!   hash with its own independent salt, stored in the slot so verification
//!   needs no separately persisted parameters.
//!
//! The two salts are independent on purpose: the stored PHC tag must not be
//! usable to reconstruct the wrapping key.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::RngCore;

use super::keys::SecretKey;
use crate::errors::{DiaryError, Result};

/// Length of the wrap salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MiB). Guards against a corrupted slot
/// downgrading the KDF to something trivially brute-forceable.
const MIN_MEMORY_KIB: u32 = 8_192;

/// Argon2id parameters.
///
/// The defaults (64 MiB, 3 iterations, 4 lanes) exceed common baseline
/// guidance while staying interactively fast (~100ms–1s).
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MiB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    fn validate(&self) -> Result<()> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(DiaryError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations < 1 {
            return Err(DiaryError::KeyDerivationFailed(
                "Argon2 iterations must be at least 1".into(),
            ));
        }
        if self.parallelism < 1 {
            return Err(DiaryError::KeyDerivationFailed(
                "Argon2 parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn to_params(self) -> Result<Params> {
        self.validate()?;
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| DiaryError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))
    }
}

/// Derive a 32-byte wrapping key from a password and salt.
///
/// The same password + salt + params always produce the same key.
pub fn derive_wrapping_key(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<SecretKey> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_params()?);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| DiaryError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    // SecretKey copies the bytes into its zeroize-on-drop container; the
    // stack copy is wiped below.
    let secret = SecretKey::new(key);
    use zeroize::Zeroize;
    key.zeroize();
    Ok(secret)
}

/// Generate a cryptographically random 32-byte wrap salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Hash a password into a self-describing PHC string for later verification.
///
/// The PHC string embeds its own fresh salt, the Argon2id parameters, and
/// the verification tag, so `verify_password` needs nothing else.
pub fn hash_password(password: &[u8], params: &Argon2Params) -> Result<String> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_params()?);
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(password, &salt)
        .map_err(|e| DiaryError::KeyDerivationFailed(format!("password hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Extract the Argon2 parameters embedded in a PHC hash string.
///
/// Unlock paths use this so the wrapping key is re-derived with exactly the
/// parameters that were in force when the slot was written.
pub fn params_from_phc(phc_hash: &str) -> Result<Argon2Params> {
    let parsed = PasswordHash::new(phc_hash).map_err(|_| DiaryError::WrongCredential)?;
    let params = Params::try_from(&parsed).map_err(|_| DiaryError::WrongCredential)?;

    Ok(Argon2Params {
        memory_kib: params.m_cost(),
        iterations: params.t_cost(),
        parallelism: params.p_cost(),
    })
}

/// Verify a password against a stored PHC hash.
///
/// An unparseable hash and a mismatched password are indistinguishable to
/// the caller: both surface as `WrongCredential`.
pub fn verify_password(password: &[u8], phc_hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(phc_hash).map_err(|_| DiaryError::WrongCredential)?;

    Argon2::default()
        .verify_password(password, &parsed)
        .map_err(|_| DiaryError::WrongCredential)
}
