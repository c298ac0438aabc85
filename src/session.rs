//! The diary session: a state machine over one diary database file.
//!
//! Three observable states:
//! - **NoDiary** — the database file does not exist yet.
//! - **Locked** — the file exists, no key material in memory.
//! - **Unlocked** — the master key and an open connection are held.
//!
//! All state transitions take `&mut self`, so a session has exactly one
//! writer at a time; `encrypt_entry`/`decrypt_entry` take `&self` and are
//! safe once unlocked.

use std::path::{Path, PathBuf};

use log::info;
use rusqlite::Connection;

use crate::auth::{registry, Credential, CredentialReceipt, NewCredential, SlotInfo};
use crate::crypto::{Argon2Params, SecretBytes, SecretKey};
use crate::db::{self, entries, EntryFields, EntryRecord, SealedFields};
use crate::errors::{DiaryError, Result};

enum State {
    Locked,
    Unlocked {
        conn: Connection,
        master_key: SecretKey,
    },
}

/// A session over one diary database file.
pub struct DiarySession {
    path: PathBuf,
    kdf_params: Argon2Params,
    state: State,
}

impl DiarySession {
    /// Open a session over `path`. No file access happens until a diary is
    /// created or unlocked.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DiarySession {
            path: path.into(),
            kdf_params: Argon2Params::default(),
            state: State::Locked,
        }
    }

    /// Like `new`, with explicit Argon2id parameters for password slots
    /// created through this session.
    pub fn with_kdf_params(path: impl Into<PathBuf>, kdf_params: Argon2Params) -> Self {
        DiarySession {
            path: path.into(),
            kdf_params,
            state: State::Locked,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the database file exists on disk.
    pub fn diary_exists(&self) -> bool {
        self.path.exists()
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, State::Unlocked { .. })
    }

    /// Create a new diary with its first credential.
    ///
    /// Only valid when no database file exists. Generates a fresh master
    /// key, writes the schema, registers the slot, and leaves the session
    /// unlocked. For key-file credentials the receipt carries the private
    /// key bytes the caller must persist.
    pub fn create_diary(&mut self, credential: &NewCredential) -> Result<CredentialReceipt> {
        if self.is_unlocked() {
            return Err(DiaryError::InvalidState("session is already unlocked"));
        }
        if self.diary_exists() {
            return Err(DiaryError::DiaryAlreadyExists(self.path.clone()));
        }

        let conn = db::create_database(&self.path)?;
        let master_key = SecretKey::generate();

        let receipt = match credential {
            NewCredential::Password(pw) => {
                let slot_id = registry::add_password_slot(
                    &conn,
                    &master_key,
                    pw.as_bytes(),
                    "Password",
                    &self.kdf_params,
                )?;
                CredentialReceipt {
                    slot_id,
                    private_key: None,
                }
            }
            NewCredential::KeyFile => {
                let (slot_id, private_key) =
                    registry::add_keyfile_slot(&conn, &master_key, "Key file")?;
                CredentialReceipt {
                    slot_id,
                    private_key: Some(private_key),
                }
            }
        };

        info!("Created diary at {}", self.path.display());
        self.state = State::Unlocked { conn, master_key };
        Ok(receipt)
    }

    /// Unlock with a credential for a specific slot.
    ///
    /// On failure the session stays locked; the only credential-related
    /// errors surfaced are `WrongCredential` and `UnknownSlot`.
    pub fn unlock(&mut self, slot_id: i64, credential: &Credential) -> Result<()> {
        if self.is_unlocked() {
            return Err(DiaryError::InvalidState("session is already unlocked"));
        }

        let conn = db::open_database(&self.path)?;
        let master_key = registry::unlock_slot(&conn, slot_id, credential)?;

        info!("Diary unlocked via slot {slot_id}");
        self.state = State::Unlocked { conn, master_key };
        Ok(())
    }

    /// Unlock with raw key-file private key bytes, locating the slot by the
    /// derived public key. An unregistered key is a `WrongCredential`, not a
    /// missing slot.
    pub fn unlock_with_key_file(
        &mut self,
        private_key: &[u8; crate::auth::keyfile::X25519_KEY_LEN],
    ) -> Result<()> {
        if self.is_unlocked() {
            return Err(DiaryError::InvalidState("session is already unlocked"));
        }

        let conn = db::open_database(&self.path)?;
        let public_key = crate::auth::keyfile::public_key_for(private_key);
        let slot_id = registry::find_keyfile_slot(&conn, &public_key)?
            .ok_or(DiaryError::WrongCredential)?;

        let master_key = registry::unlock_slot(&conn, slot_id, &Credential::KeyFile(*private_key))?;

        info!("Diary unlocked via key-file slot {slot_id}");
        self.state = State::Unlocked { conn, master_key };
        Ok(())
    }

    /// Lock the session, wiping the master key in place before the container
    /// is dropped. Idempotent.
    pub fn lock(&mut self) {
        self.lock_releasing_key();
    }

    /// Erase the master key, drop the connection, and hand back the spent
    /// container so the wipe can be inspected while it is still alive.
    fn lock_releasing_key(&mut self) -> Option<SecretKey> {
        match std::mem::replace(&mut self.state, State::Locked) {
            State::Unlocked { mut master_key, .. } => {
                master_key.erase();
                info!("Diary locked");
                Some(master_key)
            }
            State::Locked => None,
        }
    }

    /// Register an additional credential for the already-unlocked diary.
    pub fn add_credential(
        &mut self,
        credential: &NewCredential,
        label: &str,
    ) -> Result<CredentialReceipt> {
        let (conn, master_key) = self.unlocked()?;

        match credential {
            NewCredential::Password(pw) => {
                let slot_id = registry::add_password_slot(
                    conn,
                    master_key,
                    pw.as_bytes(),
                    label,
                    &self.kdf_params,
                )?;
                Ok(CredentialReceipt {
                    slot_id,
                    private_key: None,
                })
            }
            NewCredential::KeyFile => {
                let (slot_id, private_key) = registry::add_keyfile_slot(conn, master_key, label)?;
                Ok(CredentialReceipt {
                    slot_id,
                    private_key: Some(private_key),
                })
            }
        }
    }

    /// Remove a credential. Surviving slots are untouched; removing the last
    /// slot is refused.
    pub fn revoke_credential(&mut self, slot_id: i64) -> Result<()> {
        let (conn, _) = self.unlocked()?;
        registry::revoke_slot(conn, slot_id)
    }

    /// Change the password on a password slot. Only that slot is re-wrapped;
    /// entries and other slots are untouched.
    ///
    /// Both password buffers are consumed and zeroized when this returns.
    pub fn change_password(
        &mut self,
        slot_id: i64,
        old_pw: SecretBytes,
        new_pw: SecretBytes,
    ) -> Result<()> {
        let (conn, _) = self.unlocked()?;
        registry::change_password(
            conn,
            slot_id,
            old_pw.as_bytes(),
            new_pw.as_bytes(),
            &self.kdf_params,
        )
    }

    /// Encrypt entry fields under the session key without touching storage.
    pub fn encrypt_entry(&self, fields: &EntryFields) -> Result<SealedFields> {
        let (_, master_key) = self.unlocked()?;
        entries::encrypt_fields(master_key, fields)
    }

    /// Decrypt entry fields under the session key without touching storage.
    pub fn decrypt_entry(&self, sealed: &SealedFields) -> Result<EntryFields> {
        let (_, master_key) = self.unlocked()?;
        entries::decrypt_fields(master_key, sealed)
    }

    /// Write (insert or replace) the entry for `date`.
    pub fn put_entry(&mut self, date: &str, fields: &EntryFields) -> Result<()> {
        let (conn, master_key) = self.unlocked()?;
        entries::put_entry(conn, master_key, date, fields)
    }

    /// Read and decrypt the entry for `date`.
    pub fn entry(&self, date: &str) -> Result<Option<EntryRecord>> {
        let (conn, master_key) = self.unlocked()?;
        entries::get_entry(conn, master_key, date)
    }

    /// Delete the entry for `date`. Returns whether a row was removed.
    pub fn delete_entry(&mut self, date: &str) -> Result<bool> {
        let (conn, _) = self.unlocked()?;
        entries::delete_entry(conn, date)
    }

    /// All entry dates, ascending.
    pub fn entry_dates(&self) -> Result<Vec<String>> {
        let (conn, _) = self.unlocked()?;
        entries::entry_dates(conn)
    }

    /// List registered auth slots.
    pub fn slots(&self) -> Result<Vec<SlotInfo>> {
        let (conn, _) = self.unlocked()?;
        registry::list_slots(conn)
    }

    fn unlocked(&self) -> Result<(&Connection, &SecretKey)> {
        match &self.state {
            State::Unlocked { conn, master_key } => Ok((conn, master_key)),
            State::Locked => Err(DiaryError::InvalidState("diary is locked")),
        }
    }
}
