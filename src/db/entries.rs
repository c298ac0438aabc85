//! Encrypted diary entries, one row per calendar date.
//!
//! Title and body are each sealed by their own AEAD call with a fresh nonce;
//! the database never sees plaintext. Dates, timestamps, and the word count
//! are stored in the clear as queryable metadata.

use rusqlite::Connection;

use crate::crypto::{self, NONCE_LEN, SecretKey};
use crate::errors::{DiaryError, Result};

/// A decrypted diary entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EntryRecord {
    /// Calendar date in `YYYY-MM-DD` form; the primary key.
    pub date: String,
    pub title: String,
    pub body: String,
    pub word_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// The plaintext fields of an entry, input to `encrypt_fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFields {
    pub title: String,
    pub body: String,
}

/// The sealed fields of an entry, output of `encrypt_fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedFields {
    pub title_nonce: [u8; NONCE_LEN],
    pub title_ciphertext: Vec<u8>,
    pub body_nonce: [u8; NONCE_LEN],
    pub body_ciphertext: Vec<u8>,
}

/// Encrypt an entry's fields under the diary master key.
///
/// Each field gets its own freshly generated nonce; two calls on identical
/// plaintext never produce the same ciphertext.
pub fn encrypt_fields(key: &SecretKey, fields: &EntryFields) -> Result<SealedFields> {
    let (title_nonce, title_ciphertext) = crypto::encrypt(key, fields.title.as_bytes())?;
    let (body_nonce, body_ciphertext) = crypto::encrypt(key, fields.body.as_bytes())?;

    Ok(SealedFields {
        title_nonce,
        title_ciphertext,
        body_nonce,
        body_ciphertext,
    })
}

/// Decrypt an entry's fields. Any tampering fails the whole operation.
pub fn decrypt_fields(key: &SecretKey, sealed: &SealedFields) -> Result<EntryFields> {
    let title = crypto::decrypt(key, &sealed.title_nonce, &sealed.title_ciphertext)?;
    let body = crypto::decrypt(key, &sealed.body_nonce, &sealed.body_ciphertext)?;

    Ok(EntryFields {
        title: String::from_utf8(title)
            .map_err(|_| DiaryError::Storage("entry title is not valid UTF-8".to_string()))?,
        body: String::from_utf8(body)
            .map_err(|_| DiaryError::Storage("entry body is not valid UTF-8".to_string()))?,
    })
}

/// Whitespace-separated word count of the entry body.
pub fn count_words(body: &str) -> i64 {
    body.split_whitespace().count() as i64
}

/// Insert or replace the entry for `date`.
///
/// `created_at` is preserved when the row already exists; `updated_at` is
/// always refreshed.
pub fn put_entry(
    conn: &Connection,
    key: &SecretKey,
    date: &str,
    fields: &EntryFields,
) -> Result<()> {
    let sealed = encrypt_fields(key, fields)?;
    let word_count = count_words(&fields.body);
    let now = chrono::Utc::now().to_rfc3339();

    let created_at: Option<String> = conn
        .query_row(
            "SELECT created_at FROM entries WHERE date = ?1",
            [date],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    let created_at = created_at.unwrap_or_else(|| now.clone());

    conn.execute(
        "INSERT OR REPLACE INTO entries
         (date, title_nonce, title_ciphertext, body_nonce, body_ciphertext,
          word_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            date,
            &sealed.title_nonce[..],
            &sealed.title_ciphertext,
            &sealed.body_nonce[..],
            &sealed.body_ciphertext,
            word_count,
            &created_at,
            &now,
        ],
    )?;
    Ok(())
}

/// Load and decrypt the entry for `date`, if present.
pub fn get_entry(conn: &Connection, key: &SecretKey, date: &str) -> Result<Option<EntryRecord>> {
    let result = conn.query_row(
        "SELECT title_nonce, title_ciphertext, body_nonce, body_ciphertext,
                word_count, created_at, updated_at
         FROM entries WHERE date = ?1",
        [date],
        |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, Vec<u8>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        },
    );

    let (title_nonce, title_ct, body_nonce, body_ct, word_count, created_at, updated_at) =
        match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

    let sealed = SealedFields {
        title_nonce: nonce_from(&title_nonce)?,
        title_ciphertext: title_ct,
        body_nonce: nonce_from(&body_nonce)?,
        body_ciphertext: body_ct,
    };
    let fields = decrypt_fields(key, &sealed)?;

    Ok(Some(EntryRecord {
        date: date.to_string(),
        title: fields.title,
        body: fields.body,
        word_count,
        created_at,
        updated_at,
    }))
}

/// Delete the entry for `date`. Returns whether a row was removed.
pub fn delete_entry(conn: &Connection, date: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM entries WHERE date = ?1", [date])?;
    Ok(removed > 0)
}

/// All dates that have an entry, ascending. No decryption involved.
pub fn entry_dates(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT date FROM entries ORDER BY date ASC")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut dates = Vec::new();
    for date in rows {
        dates.push(date?);
    }
    Ok(dates)
}

fn nonce_from(bytes: &[u8]) -> Result<[u8; NONCE_LEN]> {
    bytes
        .try_into()
        .map_err(|_| DiaryError::Storage("stored nonce has the wrong length".to_string()))
}
