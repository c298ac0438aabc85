//! # diarium-core
//!
//! Encryption and credential core for a local, offline journaling app.
//!
//! Every diary is protected by a single random 256-bit master key that
//! encrypts entry content with AES-256-GCM. The master key itself is never
//! stored; instead it is wrapped independently by each registered
//! credential — a password (Argon2id) or a key file (X25519 + HKDF) — so
//! credentials can be added and revoked without touching entry ciphertext,
//! and a password change re-wraps one slot in O(1).
//!
//! ```no_run
//! use diarium_core::{DiarySession, NewCredential, EntryFields};
//!
//! # fn main() -> diarium_core::Result<()> {
//! let mut session = DiarySession::new("diary.db");
//! session.create_diary(&NewCredential::Password("correct-horse".into()))?;
//!
//! session.put_entry(
//!     "2024-03-15",
//!     &EntryFields {
//!         title: "A good day".into(),
//!         body: "Went for a long walk.".into(),
//!     },
//! )?;
//!
//! session.lock();
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod crypto;
pub mod db;
pub mod errors;
pub mod session;

pub use auth::{Credential, CredentialReceipt, NewCredential, SlotInfo, SlotKind};
pub use crypto::{Argon2Params, SecretBytes, SecretKey};
pub use db::{EntryFields, EntryRecord, SealedFields};
pub use errors::{DiaryError, Result};
pub use session::DiarySession;
