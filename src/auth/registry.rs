//! The auth-slot registry: persisted, independently revocable wrapped copies
//! of the master key.
//!
//! All functions operate on the `auth_slots` table of an open diary
//! database. Callers mutating slots must already hold the unwrapped master
//! key (an unlocked session); `unlock_slot` is the only entry point that
//! works from a locked state.

use log::info;
use rusqlite::Connection;

use super::{keyfile, password, Credential, SlotInfo, SlotKind};
use crate::crypto::{Argon2Params, SecretBytes, SecretKey};
use crate::errors::{DiaryError, Result};

/// One row of `auth_slots`, as loaded for an unlock or mutation.
struct SlotRow {
    id: i64,
    kind: SlotKind,
    params: Vec<u8>,
    wrapped_key: Vec<u8>,
    verification: Option<String>,
}

/// Register a password slot wrapping `master_key`. Returns the slot id.
pub fn add_password_slot(
    conn: &Connection,
    master_key: &SecretKey,
    pw: &[u8],
    label: &str,
    params: &Argon2Params,
) -> Result<i64> {
    let wrap = password::wrap_master_key_with_params(pw, master_key, params)?;

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO auth_slots (kind, label, params, public_key, wrapped_key, verification, created_at)
         VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6)",
        rusqlite::params![
            SlotKind::Password.as_str(),
            label,
            &wrap.wrap_salt[..],
            &wrap.wrapped_key,
            &wrap.verification,
            &now,
        ],
    )?;

    let slot_id = conn.last_insert_rowid();
    info!("Registered password slot {slot_id}");
    Ok(slot_id)
}

/// Register a key-file slot wrapping `master_key`.
///
/// Generates the long-term keypair; returns the slot id and the private key
/// bytes for the caller to persist.
pub fn add_keyfile_slot(
    conn: &Connection,
    master_key: &SecretKey,
    label: &str,
) -> Result<(i64, SecretBytes)> {
    let (private_key, public_key) = keyfile::generate_keypair();
    let wrap = keyfile::wrap_master_key(&public_key, master_key)?;

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO auth_slots (kind, label, params, public_key, wrapped_key, verification, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
        rusqlite::params![
            SlotKind::KeyFile.as_str(),
            label,
            &wrap.ephemeral_public[..],
            &wrap.public_key[..],
            &wrap.wrapped_key,
            &now,
        ],
    )?;

    let slot_id = conn.last_insert_rowid();
    info!("Registered key-file slot {slot_id}");
    Ok((slot_id, private_key))
}

/// Unlock a slot with the matching credential, yielding the master key.
///
/// A credential of the wrong kind for the slot is treated exactly like a
/// wrong credential — no oracle about what kind of slot an id refers to.
pub fn unlock_slot(conn: &Connection, slot_id: i64, credential: &Credential) -> Result<SecretKey> {
    let row = load_slot(conn, slot_id)?;

    let master_key = match (&row.kind, credential) {
        (SlotKind::Password, Credential::Password(pw)) => {
            let verification = row.verification.as_deref().ok_or(DiaryError::WrongCredential)?;
            password::unwrap_master_key(pw.as_bytes(), &row.params, verification, &row.wrapped_key)?
        }
        (SlotKind::KeyFile, Credential::KeyFile(private_key)) => {
            keyfile::unwrap_master_key(private_key, &row.params, &row.wrapped_key)?
        }
        _ => return Err(DiaryError::WrongCredential),
    };

    touch_last_used(conn, row.id)?;
    Ok(master_key)
}

/// Find the key-file slot whose long-term public key matches, if any.
pub fn find_keyfile_slot(conn: &Connection, public_key: &[u8]) -> Result<Option<i64>> {
    let result = conn.query_row(
        "SELECT id FROM auth_slots WHERE kind = ?1 AND public_key = ?2 LIMIT 1",
        rusqlite::params![SlotKind::KeyFile.as_str(), public_key],
        |row| row.get::<_, i64>(0),
    );

    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Remove a slot. Refuses to remove the last one — that would make the
/// diary permanently inaccessible.
///
/// Surviving slots are untouched; their wrapping keys are independent by
/// construction.
pub fn revoke_slot(conn: &Connection, slot_id: i64) -> Result<()> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM auth_slots WHERE id = ?1",
        [slot_id],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(DiaryError::UnknownSlot(slot_id));
    }

    if count_slots(conn)? <= 1 {
        return Err(DiaryError::LastSlot);
    }

    conn.execute("DELETE FROM auth_slots WHERE id = ?1", [slot_id])?;
    info!("Revoked auth slot {slot_id}");
    Ok(())
}

/// Re-wrap a password slot in place under a new password.
///
/// Verifies the old password first; the slot id is preserved and entry
/// ciphertext is untouched.
pub fn change_password(
    conn: &Connection,
    slot_id: i64,
    old_pw: &[u8],
    new_pw: &[u8],
    params: &Argon2Params,
) -> Result<()> {
    let row = load_slot(conn, slot_id)?;

    if row.kind != SlotKind::Password {
        return Err(DiaryError::InvalidState(
            "change_password requires a password slot",
        ));
    }
    let verification = row.verification.as_deref().ok_or(DiaryError::WrongCredential)?;

    let new_wrap = password::change_password(
        old_pw,
        new_pw,
        &row.params,
        verification,
        &row.wrapped_key,
        params,
    )?;

    conn.execute(
        "UPDATE auth_slots SET params = ?1, wrapped_key = ?2, verification = ?3 WHERE id = ?4",
        rusqlite::params![
            &new_wrap.wrap_salt[..],
            &new_wrap.wrapped_key,
            &new_wrap.verification,
            slot_id,
        ],
    )?;

    info!("Password changed on slot {slot_id}");
    Ok(())
}

/// List all registered slots, without any wrapped-key material.
pub fn list_slots(conn: &Connection) -> Result<Vec<SlotInfo>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, label, public_key, created_at, last_used
         FROM auth_slots ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<Vec<u8>>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut slots = Vec::new();
    for row in rows {
        let (id, kind, label, public_key, created_at, last_used) = row?;
        let kind = SlotKind::parse(&kind)
            .ok_or_else(|| DiaryError::Storage(format!("unknown slot kind '{kind}'")))?;
        slots.push(SlotInfo {
            id,
            kind,
            label,
            public_key,
            created_at,
            last_used,
        });
    }
    Ok(slots)
}

/// Number of registered slots.
pub fn count_slots(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM auth_slots", [], |row| row.get(0))?)
}

fn load_slot(conn: &Connection, slot_id: i64) -> Result<SlotRow> {
    let result = conn.query_row(
        "SELECT id, kind, params, wrapped_key, verification FROM auth_slots WHERE id = ?1",
        [slot_id],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, Vec<u8>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        },
    );

    match result {
        Ok((id, kind, params, wrapped_key, verification)) => {
            let kind = SlotKind::parse(&kind)
                .ok_or_else(|| DiaryError::Storage(format!("unknown slot kind '{kind}'")))?;
            Ok(SlotRow {
                id,
                kind,
                params,
                wrapped_key,
                verification,
            })
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DiaryError::UnknownSlot(slot_id)),
        Err(e) => Err(e.into()),
    }
}

fn touch_last_used(conn: &Connection, slot_id: i64) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE auth_slots SET last_used = ?1 WHERE id = ?2",
        rusqlite::params![&now, slot_id],
    )?;
    Ok(())
}
