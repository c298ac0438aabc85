use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in diarium-core.
///
/// Credential failures are deliberately collapsed into the single
/// `WrongCredential` variant: the caller cannot tell a wrong password from a
/// wrong key file from a corrupted slot.
#[derive(Debug, Error)]
pub enum DiaryError {
    // --- Credential / slot errors ---
    #[error("Incorrect credential — wrong password, wrong key file, or corrupted slot data")]
    WrongCredential,

    #[error("Cannot remove the last authentication method")]
    LastSlot,

    #[error("No authentication slot with id {0}")]
    UnknownSlot(i64),

    // --- Session state errors ---
    #[error("Invalid session state: {0}")]
    InvalidState(&'static str),

    #[error("Diary already exists at {0}")]
    DiaryAlreadyExists(PathBuf),

    #[error("Diary not found at {0}")]
    DiaryNotFound(PathBuf),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Storage errors ---
    #[error("Storage failure: {0}")]
    Storage(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for DiaryError {
    fn from(e: rusqlite::Error) -> Self {
        DiaryError::Storage(e.to_string())
    }
}

/// Convenience type alias for diarium-core results.
pub type Result<T> = std::result::Result<T, DiaryError>;
