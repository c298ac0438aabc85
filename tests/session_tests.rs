//! End-to-end session scenarios: create, unlock, multi-credential
//! management, and entry encryption over a real database file.

use diarium_core::{
    Argon2Params, Credential, DiaryError, DiarySession, EntryFields, NewCredential, SlotKind,
};

fn fast_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

fn session_in(dir: &tempfile::TempDir) -> DiarySession {
    DiarySession::with_kdf_params(dir.path().join("diary.db"), fast_params())
}

fn private_key_bytes(receipt: &diarium_core::CredentialReceipt) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(receipt.private_key.as_ref().unwrap().as_bytes());
    bytes
}

#[test]
fn create_lock_unlock_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    let receipt = session
        .create_diary(&NewCredential::Password("correct-horse".into()))
        .unwrap();

    session
        .put_entry(
            "2024-03-15",
            &EntryFields {
                title: "A good day".into(),
                body: "Went for a long walk by the river.".into(),
            },
        )
        .unwrap();

    session.lock();
    assert!(!session.is_unlocked());

    session
        .unlock(
            receipt.slot_id,
            &Credential::Password("correct-horse".into()),
        )
        .unwrap();

    let entry = session.entry("2024-03-15").unwrap().unwrap();
    assert_eq!(entry.title, "A good day");
    assert_eq!(entry.word_count, 8);
}

#[test]
fn password_off_by_one_character_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    let receipt = session
        .create_diary(&NewCredential::Password("correct-horse".into()))
        .unwrap();
    session.lock();

    let result = session.unlock(
        receipt.slot_id,
        &Credential::Password("correct-horsf".into()),
    );
    assert!(matches!(result, Err(DiaryError::WrongCredential)));
    assert!(!session.is_unlocked());
}

#[test]
fn keyfile_survives_password_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    // Create with a password, then register a key file.
    let pw_receipt = session
        .create_diary(&NewCredential::Password("correct-horse".into()))
        .unwrap();
    let kf_receipt = session
        .add_credential(&NewCredential::KeyFile, "Laptop key")
        .unwrap();
    let private_key = private_key_bytes(&kf_receipt);

    session
        .put_entry(
            "2024-03-15",
            &EntryFields {
                title: "Before".into(),
                body: "written before the password change".into(),
            },
        )
        .unwrap();

    // Change the password. Only the password slot is re-wrapped.
    session
        .change_password(
            pw_receipt.slot_id,
            "correct-horse".into(),
            "battery-staple".into(),
        )
        .unwrap();
    session.lock();

    // The key file still unlocks and still reads the old entry, so it must
    // yield the same master key as before the change.
    session.unlock_with_key_file(&private_key).unwrap();
    let entry = session.entry("2024-03-15").unwrap().unwrap();
    assert_eq!(entry.body, "written before the password change");
    session.lock();

    // New password works, old one does not.
    session
        .unlock(
            pw_receipt.slot_id,
            &Credential::Password("battery-staple".into()),
        )
        .unwrap();
    session.lock();

    let stale = session.unlock(
        pw_receipt.slot_id,
        &Credential::Password("correct-horse".into()),
    );
    assert!(matches!(stale, Err(DiaryError::WrongCredential)));
}

#[test]
fn every_slot_unlocks_the_same_diary() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    let pw_receipt = session
        .create_diary(&NewCredential::Password("first-password".into()))
        .unwrap();
    let second_pw = session
        .add_credential(&NewCredential::Password("second-password".into()), "Backup")
        .unwrap();
    let kf_receipt = session
        .add_credential(&NewCredential::KeyFile, "Key file")
        .unwrap();
    let private_key = private_key_bytes(&kf_receipt);

    session
        .put_entry(
            "2024-01-01",
            &EntryFields {
                title: "Shared".into(),
                body: "readable through any credential".into(),
            },
        )
        .unwrap();
    session.lock();

    for (slot_id, password) in [
        (pw_receipt.slot_id, "first-password"),
        (second_pw.slot_id, "second-password"),
    ] {
        session
            .unlock(slot_id, &Credential::Password(password.into()))
            .unwrap();
        let entry = session.entry("2024-01-01").unwrap().unwrap();
        assert_eq!(entry.body, "readable through any credential");
        session.lock();
    }

    session.unlock_with_key_file(&private_key).unwrap();
    let entry = session.entry("2024-01-01").unwrap().unwrap();
    assert_eq!(entry.body, "readable through any credential");
}

#[test]
fn revocation_leaves_surviving_slots_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    let pw_receipt = session
        .create_diary(&NewCredential::Password("correct-horse".into()))
        .unwrap();
    let kf_receipt = session
        .add_credential(&NewCredential::KeyFile, "Key file")
        .unwrap();
    let private_key = private_key_bytes(&kf_receipt);

    session.revoke_credential(pw_receipt.slot_id).unwrap();
    session.lock();

    // Revoked password no longer works; key file is unaffected.
    let gone = session.unlock(
        pw_receipt.slot_id,
        &Credential::Password("correct-horse".into()),
    );
    assert!(matches!(gone, Err(DiaryError::UnknownSlot(_))));

    session.unlock_with_key_file(&private_key).unwrap();
    assert!(session.is_unlocked());
}

#[test]
fn last_slot_cannot_be_revoked() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    let receipt = session
        .create_diary(&NewCredential::Password("correct-horse".into()))
        .unwrap();

    let result = session.revoke_credential(receipt.slot_id);
    assert!(matches!(result, Err(DiaryError::LastSlot)));

    // Still usable afterwards.
    session.lock();
    session
        .unlock(
            receipt.slot_id,
            &Credential::Password("correct-horse".into()),
        )
        .unwrap();
}

#[test]
fn identical_plaintext_seals_differently() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);
    session
        .create_diary(&NewCredential::Password("pw".into()))
        .unwrap();

    let fields = EntryFields {
        title: "Same".into(),
        body: "Same body both times".into(),
    };
    let s1 = session.encrypt_entry(&fields).unwrap();
    let s2 = session.encrypt_entry(&fields).unwrap();

    assert_ne!(s1.title_nonce, s2.title_nonce);
    assert_ne!(s1.body_nonce, s2.body_nonce);
    assert_ne!(s1.title_ciphertext, s2.title_ciphertext);
    assert_ne!(s1.body_ciphertext, s2.body_ciphertext);

    // Both still decrypt to the original.
    assert_eq!(session.decrypt_entry(&s1).unwrap(), fields);
    assert_eq!(session.decrypt_entry(&s2).unwrap(), fields);
}

#[test]
fn keyfile_only_diary() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    let receipt = session.create_diary(&NewCredential::KeyFile).unwrap();
    let private_key = private_key_bytes(&receipt);
    session.lock();

    session.unlock_with_key_file(&private_key).unwrap();

    // An unregistered key is just a wrong credential.
    session.lock();
    let wrong = session.unlock_with_key_file(&[7u8; 32]);
    assert!(matches!(wrong, Err(DiaryError::WrongCredential)));
}

#[test]
fn operations_require_unlocked_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);
    session
        .create_diary(&NewCredential::Password("pw".into()))
        .unwrap();
    session.lock();

    let fields = EntryFields {
        title: "t".into(),
        body: "b".into(),
    };
    assert!(matches!(
        session.put_entry("2024-01-01", &fields),
        Err(DiaryError::InvalidState(_))
    ));
    assert!(matches!(
        session.encrypt_entry(&fields),
        Err(DiaryError::InvalidState(_))
    ));
    assert!(matches!(
        session.add_credential(&NewCredential::KeyFile, "k"),
        Err(DiaryError::InvalidState(_))
    ));
    assert!(matches!(
        session.revoke_credential(1),
        Err(DiaryError::InvalidState(_))
    ));
    assert!(matches!(
        session.change_password(1, "a".into(), "b".into()),
        Err(DiaryError::InvalidState(_))
    ));
}

#[test]
fn slot_listing_reflects_registrations() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    session
        .create_diary(&NewCredential::Password("pw".into()))
        .unwrap();
    session
        .add_credential(&NewCredential::KeyFile, "Laptop key")
        .unwrap();

    let slots = session.slots().unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].kind, SlotKind::Password);
    assert_eq!(slots[1].kind, SlotKind::KeyFile);
    assert_eq!(slots[1].label, "Laptop key");
    assert!(slots[1].public_key.is_some());
}

#[test]
fn entries_survive_lock_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    let receipt = session
        .create_diary(&NewCredential::Password("pw".into()))
        .unwrap();

    for (date, body) in [
        ("2024-01-01", "new year"),
        ("2024-01-02", "second day"),
        ("2024-01-03", "third day"),
    ] {
        session
            .put_entry(
                date,
                &EntryFields {
                    title: date.into(),
                    body: body.into(),
                },
            )
            .unwrap();
    }

    session.lock();
    session
        .unlock(receipt.slot_id, &Credential::Password("pw".into()))
        .unwrap();

    assert_eq!(
        session.entry_dates().unwrap(),
        vec!["2024-01-01", "2024-01-02", "2024-01-03"]
    );
    assert!(session.delete_entry("2024-01-02").unwrap());
    assert_eq!(
        session.entry_dates().unwrap(),
        vec!["2024-01-01", "2024-01-03"]
    );
}
