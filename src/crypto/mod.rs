//! Cryptographic primitives for diarium-core.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption (`cipher`)
//! - Argon2id password-based key derivation (`kdf`)
//! - Zeroize-on-drop secret containers (`keys`)

pub mod cipher;
pub mod kdf;
pub mod keys;

pub use cipher::{decrypt, encrypt, NONCE_LEN};
pub use kdf::{
    derive_wrapping_key, generate_salt, hash_password, params_from_phc, verify_password,
    Argon2Params,
};
pub use keys::{SecretBytes, SecretKey, KEY_LEN};
