//! Authentication credentials and the auth-slot registry.
//!
//! Every registered credential wraps the same diary master key; unwrapping
//! any valid slot yields byte-identical key material. Slots are mutually
//! independent — revoking one never touches another slot's wrapping key.

pub mod keyfile;
pub mod password;
pub mod registry;

use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::SecretBytes;

/// The kind of credential backing an auth slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Password,
    KeyFile,
}

impl SlotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotKind::Password => "password",
            SlotKind::KeyFile => "keyfile",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "password" => Some(SlotKind::Password),
            "keyfile" => Some(SlotKind::KeyFile),
            _ => None,
        }
    }
}

/// Information about a registered auth slot, safe to hand to the UI layer.
///
/// Never carries wrapped-key bytes or any other slot material beyond the
/// (public) key-file public key.
#[derive(Debug, Clone, Serialize)]
pub struct SlotInfo {
    pub id: i64,
    pub kind: SlotKind,
    pub label: String,
    /// Long-term X25519 public key; `None` for password slots.
    pub public_key: Option<Vec<u8>>,
    pub created_at: String,
    pub last_used: Option<String>,
}

/// A credential presented to unlock an existing slot.
///
/// Zeroized on drop so passwords and private keys do not linger after an
/// unlock attempt, successful or not.
#[derive(Zeroize, ZeroizeOnDrop)]
pub enum Credential {
    Password(String),
    KeyFile([u8; keyfile::X25519_KEY_LEN]),
}

/// A request to register a new credential.
///
/// Key-file registration generates the keypair internally, so it carries no
/// material of its own.
#[derive(Zeroize, ZeroizeOnDrop)]
pub enum NewCredential {
    Password(String),
    KeyFile,
}

/// The outcome of registering a credential.
#[derive(Debug)]
pub struct CredentialReceipt {
    /// The id of the newly created slot.
    pub slot_id: i64,
    /// For key-file credentials: the private key bytes the caller must
    /// persist to a file of their choosing. `None` for password slots.
    pub private_key: Option<SecretBytes>,
}
